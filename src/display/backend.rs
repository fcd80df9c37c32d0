// Backend seam - The native windowing collaborator used by the presentation thread
//
// A `Backend` is moved onto the presentation thread and opened there; the
// resulting `Display` never leaves that thread.

use super::blit::Surface;
use crate::presenter::config::PresenterConfig;
use std::sync::Arc;
use std::time::Duration;

/// Stage of native resource acquisition, in acquisition order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendStage {
    /// Event loop and window
    Window,
    /// Renderer / presentation surface
    Surface,
    /// Streaming texture the blit writes into
    ///
    /// pixels creates its texture together with the surface, so only the
    /// headless backend fails at this stage.
    Texture,
}

impl std::fmt::Display for BackendStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendStage::Window => write!(f, "window"),
            BackendStage::Surface => write!(f, "surface"),
            BackendStage::Texture => write!(f, "texture"),
        }
    }
}

/// Failure to acquire a native resource while opening a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    pub stage: BackendStage,
    pub message: String,
}

impl BackendError {
    pub fn new(stage: BackendStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to create {}: {}", self.stage, self.message)
    }
}

impl std::error::Error for BackendError {}

/// Runtime failure of an opened display (surface lock, present)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayError {
    pub message: String,
}

impl DisplayError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for DisplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DisplayError {}

/// Events the presentation loop reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayEvent {
    /// The application thread posted to the mailbox
    Wake,
    /// The user closed the window
    CloseRequested,
    /// Resize, expose, move or focus change; the last frame should be shown again
    Exposed,
    /// Anything else (input, ...)
    Other,
}

/// Cross-thread wake primitive
///
/// Calling `wake` makes the display's blocking wait return `DisplayEvent::Wake`.
#[derive(Clone)]
pub struct Waker(Arc<dyn Fn() + Send + Sync>);

impl Waker {
    pub fn new(wake: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(wake))
    }

    #[inline]
    pub fn wake(&self) {
        (self.0)()
    }
}

impl std::fmt::Debug for Waker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Waker")
    }
}

/// Factory for a display, opened on the presentation thread
pub trait Backend: Send + 'static {
    type Display: Display;

    /// Acquire window, surface and texture, in that order
    ///
    /// On failure everything acquired by this call has been released by the
    /// time the error is returned.
    fn open(self, config: &PresenterConfig) -> Result<Self::Display, BackendError>;
}

/// An opened native display
///
/// Dropping it releases the native resources in reverse acquisition order.
pub trait Display {
    /// Wake primitive usable from any thread
    fn waker(&self) -> Waker;

    /// Wait for the next event
    ///
    /// `None` blocks until an event arrives, `Some(Duration::ZERO)` polls.
    /// A blocking wait returning `None` means the event source is gone.
    fn wait_event(&mut self, timeout: Option<Duration>) -> Option<DisplayEvent>;

    /// Lock the texture for writing
    fn lock_surface(&mut self) -> Result<Surface<'_>, DisplayError>;

    /// Draw the texture to the window
    fn present(&mut self) -> Result<(), DisplayError>;
}
