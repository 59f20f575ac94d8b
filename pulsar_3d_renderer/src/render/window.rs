/// PresentationWindow trait - the windowing collaborator seam
///
/// The frame loop only ever needs three things from the window system:
/// event pumping, the close signal, and the current framebuffer size.
/// Resize notifications reach the driver separately through
/// [`FrameLoop::notify_resized`](crate::render::FrameLoop::notify_resized).

/// Windowing collaborator consumed by the frame loop driver
pub trait PresentationWindow {
    /// Pump pending window events
    fn poll_events(&mut self);

    /// Whether the user requested the window to close
    fn should_close(&self) -> bool;

    /// Current framebuffer size in pixels
    ///
    /// May report (0, 0) while the window is minimized.
    fn framebuffer_size(&self) -> (u32, u32);
}
