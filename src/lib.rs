// palfb - Indexed-color framebuffer presented from a dedicated thread
//
// The application draws palette indices into a frame buffer and asks for a
// render; a presentation thread owning the native window converts the frame
// through the palette, presents it and drains the window's event queue.

pub mod display;
pub mod presenter;
pub mod timing;

// Re-export main types for convenience
pub use display::{
    Backend, BackendError, BackendStage, FrameBuffer, HeadlessBackend, HeadlessHandle, Palette,
    PixelFormat, WinitBackend, CGA_PALETTE,
};
pub use presenter::{
    ConfigError, InitError, LifecycleState, Presenter, PresenterConfig, RenderError,
    ScreenshotError, WindowFlags,
};
pub use timing::delay;
