/// CommandRecorder - the command recording collaborator seam
///
/// The presenter owns the command buffers and decides WHEN to (re)record;
/// the recorder owns the scene (geometry, textures, descriptor sets) and
/// decides WHAT gets recorded. Re-recording happens only after a
/// swapchain rebuild.

use ash::vk;

use pulsar_3d_renderer::pulsar3d::Result;

/// Per-generation handles handed to the recorder
pub struct RecordContext<'a> {
    /// Logical device for `cmd_*` calls
    pub device: &'a ash::Device,
    /// Current render pass
    pub render_pass: vk::RenderPass,
    /// Framebuffer for the image being recorded
    pub framebuffer: vk::Framebuffer,
    /// Current graphics pipeline
    pub pipeline: vk::Pipeline,
    /// Layout for descriptor set binds
    pub pipeline_layout: vk::PipelineLayout,
    /// Current swapchain extent
    pub extent: vk::Extent2D,
    /// Whether the render pass carries a depth attachment
    pub has_depth: bool,
}

/// Command recording collaborator driven by the presenter
pub trait CommandRecorder {
    /// A new swapchain generation exists: recreate per-image resources
    /// (uniform buffers, descriptor sets) for `image_count` images
    fn on_generation(&mut self, image_count: usize, extent: vk::Extent2D) -> Result<()>;

    /// Per-frame CPU updates for the image about to be rendered
    ///
    /// Called after the slot's fence wait, immediately before submission.
    fn prepare_frame(&mut self, image_index: usize, extent: vk::Extent2D) -> Result<()>;

    /// Record the complete command buffer for one swapchain image
    /// (begin, render pass, draws, end)
    fn record(
        &mut self,
        ctx: &RecordContext<'_>,
        command_buffer: vk::CommandBuffer,
        image_index: usize,
    ) -> Result<()>;
}
