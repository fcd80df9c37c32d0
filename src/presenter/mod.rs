// Presenter - Application-side handle to the presentation thread
//
// This module provides:
// - The initialization handshake (`Presenter::initialize`)
// - The per-frame render rendezvous (`Presenter::render`)
// - Active buffer selection (internal or caller-supplied)
// - Quit polling and the shutdown handshake
// - Configuration and screenshots

pub mod config;
pub mod error;
mod handoff;
pub mod screenshot;
mod thread;

pub use config::{ConfigError, PresenterConfig, WindowFlags};
pub use error::{InitError, RenderError};
pub use handoff::LifecycleState;
pub use screenshot::{save_screenshot, ScreenshotError};

use crate::display::{Backend, FrameBuffer, Palette, WinitBackend};
use handoff::{Frame, InitOutcome, Shared};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

/// Which buffer `render` reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActiveBuffer {
    Internal,
    External,
}

/// An indexed framebuffer presented by a dedicated thread
///
/// The presentation thread owns the window; this handle owns the frame
/// buffers and the palette. Dropping the handle stops the thread.
///
/// # Example
///
/// ```no_run
/// use palfb::{Presenter, PresenterConfig, WindowFlags};
///
/// let config = PresenterConfig::new(160, 120)
///     .with_window_size(1280, 960)
///     .with_flags(WindowFlags::RESIZABLE | WindowFlags::INTEGER_SCALE);
/// let mut presenter = Presenter::open(config).expect("Failed to open window");
///
/// presenter.palette().set(1, 0xFF0000AA);
/// presenter.buffer_mut().fill(1);
/// while !presenter.has_terminated() {
///     let _ = presenter.render();
/// }
/// presenter.request_termination_and_wait();
/// ```
pub struct Presenter {
    config: PresenterConfig,
    internal: FrameBuffer,
    external: Option<Vec<u8>>,
    active: ActiveBuffer,
    palette: Arc<Palette>,
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
    started: Instant,
}

impl Presenter {
    /// Open a window with the winit backend
    pub fn open(config: PresenterConfig) -> Result<Self, InitError> {
        Self::initialize(config, WinitBackend::new())
    }

    /// Start the presentation thread on `backend` and wait until it is ready
    ///
    /// # Returns
    /// The presenter, or the stage that failed. Everything acquired for this
    /// call has been released when an error is returned.
    pub fn initialize<B: Backend>(config: PresenterConfig, backend: B) -> Result<Self, InitError> {
        let internal = FrameBuffer::new(
            config.buffer_width as usize,
            config.buffer_height as usize,
        )?;
        let palette = Arc::new(Palette::new());
        let shared = Arc::new(Shared::new());

        shared.begin_init();
        let thread = thread::spawn(
            backend,
            config.clone(),
            Arc::clone(&palette),
            Arc::clone(&shared),
        )
        .map_err(|err| {
            log::error!("failed to start presentation thread: {}", err);
            InitError::ThreadStart(err)
        })?;

        let err = match shared.wait_for_init() {
            InitOutcome::Ready => {
                log::info!("presenter initialized: \"{}\"", config.title);
                return Ok(Self {
                    config,
                    internal,
                    external: None,
                    active: ActiveBuffer::Internal,
                    palette,
                    shared,
                    thread: Some(thread),
                    started: Instant::now(),
                });
            }
            InitOutcome::Failed(err) => err.into(),
            InitOutcome::Exited => InitError::ThreadExited,
        };

        if thread.join().is_err() {
            log::error!("presentation thread panicked during initialization");
        }
        Err(err)
    }

    /// Present the active buffer and wait until it is on screen
    ///
    /// A `SurfaceLock` or `Present` error affects this frame only.
    /// `Terminated` is returned once the presentation thread has stopped.
    pub fn render(&mut self) -> Result<(), RenderError> {
        if self.shared.has_quit() {
            return Err(RenderError::Terminated);
        }

        let frame = Frame {
            pixels: self.take_active(),
        };
        let waker = match self.shared.post_frame(frame) {
            Ok(waker) => waker,
            Err(frame) => {
                self.restore_active(frame.pixels);
                return Err(RenderError::Terminated);
            }
        };
        waker.wake();

        let completed = self.shared.wait_for_render();
        self.restore_active(completed.frame.pixels);
        completed.status
    }

    /// The active buffer, one palette index per pixel
    ///
    /// Empty once the presenter has been terminated with
    /// `request_termination_and_wait`.
    pub fn buffer(&self) -> &[u8] {
        match (self.active, &self.external) {
            (ActiveBuffer::External, Some(external)) => external.as_slice(),
            _ => self.internal.as_slice(),
        }
    }

    /// Mutable access to the active buffer
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        match (self.active, &mut self.external) {
            (ActiveBuffer::External, Some(external)) => external.as_mut_slice(),
            _ => self.internal.as_mut_slice(),
        }
    }

    /// Select the buffer `render` reads from
    ///
    /// `Some` installs a caller-owned buffer, which must hold
    /// `buffer_width * buffer_height` bytes. `None` switches back to the
    /// internal buffer, whose contents are untouched by the swap.
    ///
    /// # Returns
    /// The previously installed external buffer, handed back to the caller
    pub fn set_active_buffer(&mut self, buffer: Option<Vec<u8>>) -> Option<Vec<u8>> {
        match buffer {
            Some(buffer) => {
                debug_assert_eq!(buffer.len(), self.config.buffer_len());
                self.active = ActiveBuffer::External;
                self.external.replace(buffer)
            }
            None => {
                self.active = ActiveBuffer::Internal;
                self.external.take()
            }
        }
    }

    /// Set one pixel of the active buffer
    ///
    /// # Panics
    /// Panics if the coordinates are outside the active buffer
    #[inline]
    pub fn plot(&mut self, x: usize, y: usize, index: u8) {
        let width = self.config.buffer_width as usize;
        self.buffer_mut()[y * width + x] = index;
    }

    /// The palette; entries may be changed at any time
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Whether the presentation thread has stopped, for any reason
    ///
    /// Never blocks.
    pub fn has_terminated(&self) -> bool {
        self.shared.has_quit()
    }

    /// Current lifecycle state of the presentation thread
    pub fn lifecycle(&self) -> LifecycleState {
        self.shared.lifecycle()
    }

    /// Stop the presentation thread and wait until it has released the window
    ///
    /// Later calls return immediately.
    pub fn request_termination_and_wait(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        if let Some(waker) = self.shared.request_termination() {
            waker.wake();
        }
        if thread.join().is_err() {
            log::error!("presentation thread panicked");
        }

        self.active = ActiveBuffer::Internal;
        drop(self.internal.lease());
        log::info!("presenter terminated");
    }

    /// Milliseconds since initialization, wrapping like a tick counter
    pub fn elapsed_ms(&self) -> u32 {
        self.started.elapsed().as_millis() as u32
    }

    pub fn config(&self) -> &PresenterConfig {
        &self.config
    }

    /// Save the active buffer, resolved through the palette, as a PNG in `dir`
    pub fn save_screenshot(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ScreenshotError> {
        save_screenshot(
            self.buffer(),
            self.config.buffer_width,
            self.config.buffer_height,
            &self.palette,
            dir.as_ref(),
        )
    }

    fn take_active(&mut self) -> Vec<u8> {
        match (self.active, &mut self.external) {
            (ActiveBuffer::External, Some(external)) => std::mem::take(external),
            _ => self.internal.lease(),
        }
    }

    fn restore_active(&mut self, pixels: Vec<u8>) {
        match (self.active, &mut self.external) {
            (ActiveBuffer::External, Some(external)) => *external = pixels,
            _ => self.internal.restore(pixels),
        }
    }
}

impl Drop for Presenter {
    fn drop(&mut self) {
        self.request_termination_and_wait();
    }
}

impl std::fmt::Debug for Presenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presenter")
            .field("config", &self.config)
            .field("active", &self.active)
            .field("lifecycle", &self.lifecycle())
            .finish_non_exhaustive()
    }
}
