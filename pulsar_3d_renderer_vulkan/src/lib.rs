/*!
# Pulsar 3D Renderer - Vulkan Backend

Vulkan implementation of the Pulsar 3D presentation layer, built on the
Ash bindings with gpu-allocator for memory management.

The backend is decomposed along the renderer's component seams:

- [`vulkan_device`]: physical device selection + logical device creation
- [`vulkan_swapchain`]: the presentable image chain for one generation
- [`vulkan_render_targets`]: render pass, pipeline and framebuffers tied
  to that generation
- [`vulkan_frame_sync`]: the per-slot synchronization ring
- [`VulkanPresenter`]: ties the above together behind the core crate's
  `FramePresenter` trait, driven by its frame loop

Resource plumbing (buffers, textures, descriptors, shaders) lives in the
remaining modules and shares a single [`GpuContext`].
*/

// Vulkan implementation modules
pub mod vulkan_buffer;
pub mod vulkan_context;
pub mod vulkan_debug;
pub mod vulkan_descriptor;
pub mod vulkan_device;
pub mod vulkan_frame_sync;
pub mod vulkan_instance;
pub mod vulkan_presenter;
pub mod vulkan_recorder;
pub mod vulkan_render_targets;
pub mod vulkan_shader;
pub mod vulkan_swapchain;
pub mod vulkan_texture;

pub use vulkan_buffer::GpuBuffer;
pub use vulkan_context::GpuContext;
pub use vulkan_descriptor::{SceneDescriptorSets, SceneSetLayout};
pub use vulkan_presenter::{SceneDesc, VulkanPresenter};
pub use vulkan_recorder::{CommandRecorder, RecordContext};
pub use vulkan_shader::{compile_glsl, load_spirv};
pub use vulkan_texture::GpuTexture;

// Re-export the binding and compiler layers: consumers need vk types and
// shaderc::ShaderKind without pinning their own versions.
pub use ash;
pub use shaderc;
