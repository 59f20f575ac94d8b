/// Shader bytecode loading and module creation
///
/// Two sources of SPIR-V: precompiled `.spv` files read from disk, and
/// GLSL compiled at startup through shaderc. Both produce the `Vec<u32>`
/// word stream the pipeline builder turns into (short-lived) modules.

use ash::vk;
use std::fs::File;
use std::path::Path;

use pulsar_3d_renderer::pulsar3d::{Error, Result};
use pulsar_3d_renderer::{engine_debug, engine_error};

/// Read a compiled SPIR-V file
///
/// # Errors
///
/// [`Error::ResourceLoad`] when the file is missing or malformed.
pub fn load_spirv<P: AsRef<Path>>(path: P) -> Result<Vec<u32>> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| {
        engine_error!("pulsar3d::vulkan", "Failed to open shader file {:?}: {}", path, e);
        Error::ResourceLoad(format!("{}", path.display()))
    })?;

    ash::util::read_spv(&mut file).map_err(|e| {
        engine_error!("pulsar3d::vulkan", "Failed to read SPIR-V from {:?}: {}", path, e);
        Error::ResourceLoad(format!("{}", path.display()))
    })
}

/// Compile GLSL source to SPIR-V
///
/// # Arguments
///
/// * `source` - GLSL source text
/// * `kind` - shader stage
/// * `name` - input name used in compiler diagnostics
pub fn compile_glsl(source: &str, kind: shaderc::ShaderKind, name: &str) -> Result<Vec<u32>> {
    let compiler = shaderc::Compiler::new().map_err(|e| {
        engine_error!("pulsar3d::vulkan", "Failed to initialize shader compiler: {}", e);
        Error::ResourceLoad(format!("shader compiler unavailable: {}", e))
    })?;

    let artifact = compiler
        .compile_into_spirv(source, kind, name, "main", None)
        .map_err(|e| {
            engine_error!("pulsar3d::vulkan", "Failed to compile shader {}: {}", name, e);
            Error::ResourceLoad(format!("{}: {}", name, e))
        })?;

    engine_debug!(
        "pulsar3d::vulkan",
        "Compiled shader {} ({} words)",
        name,
        artifact.as_binary().len()
    );

    Ok(artifact.as_binary().to_vec())
}

/// Wrap SPIR-V words into a shader module
pub(crate) fn create_shader_module(device: &ash::Device, code: &[u32]) -> Result<vk::ShaderModule> {
    let create_info = vk::ShaderModuleCreateInfo::default().code(code);

    unsafe { device.create_shader_module(&create_info, None) }.map_err(|e| {
        engine_error!("pulsar3d::vulkan", "Failed to create shader module: {:?}", e);
        Error::InvalidResource(format!("shader module creation failed: {:?}", e))
    })
}
