// Presenter errors
//
// Initialization failures carry a signed code per failure stage; render
// failures are per-frame and leave the presenter usable.

use crate::display::{AllocationError, BackendError, BackendStage};
use std::io;

/// Errors that can occur while initializing a presenter
#[derive(Debug)]
pub enum InitError {
    /// The internal frame buffer could not be allocated
    Allocation { bytes: usize },

    /// The presentation thread could not be started
    ThreadStart(io::Error),

    /// The presentation thread failed to acquire a native resource
    Backend(BackendError),

    /// The presentation thread stopped before reporting readiness
    ThreadExited,
}

impl InitError {
    /// Signed error code for this failure
    ///
    /// -1 allocation, -2 thread exited, -3 thread start, -4 window,
    /// -5 surface, -6 texture.
    pub fn code(&self) -> i32 {
        match self {
            InitError::Allocation { .. } => -1,
            InitError::ThreadExited => -2,
            InitError::ThreadStart(_) => -3,
            InitError::Backend(err) => match err.stage {
                BackendStage::Window => -4,
                BackendStage::Surface => -5,
                BackendStage::Texture => -6,
            },
        }
    }
}

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitError::Allocation { bytes } => {
                write!(f, "Failed to allocate {} byte frame buffer", bytes)
            }
            InitError::ThreadStart(e) => write!(f, "Failed to start presentation thread: {}", e),
            InitError::Backend(e) => write!(f, "Presentation thread: {}", e),
            InitError::ThreadExited => {
                write!(f, "Presentation thread exited during initialization")
            }
        }
    }
}

impl std::error::Error for InitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InitError::ThreadStart(e) => Some(e),
            InitError::Backend(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AllocationError> for InitError {
    fn from(e: AllocationError) -> Self {
        InitError::Allocation { bytes: e.bytes }
    }
}

impl From<BackendError> for InitError {
    fn from(e: BackendError) -> Self {
        InitError::Backend(e)
    }
}

/// Errors that can occur while rendering a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The texture could not be locked; the previous frame was presented again
    SurfaceLock(String),

    /// Presenting to the window failed
    Present(String),

    /// The presentation thread has stopped
    Terminated,
}

impl RenderError {
    /// Whether no later render can succeed
    pub fn is_terminal(&self) -> bool {
        matches!(self, RenderError::Terminated)
    }
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::SurfaceLock(e) => write!(f, "Surface lock failed: {}", e),
            RenderError::Present(e) => write!(f, "Present failed: {}", e),
            RenderError::Terminated => write!(f, "Presentation thread has terminated"),
        }
    }
}

impl std::error::Error for RenderError {}
