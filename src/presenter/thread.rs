// Presentation thread - Owns the display and runs its event loop
//
// Native resources are acquired, used and released on this thread only.

use super::config::PresenterConfig;
use super::error::RenderError;
use super::handoff::{Frame, Mail, Shared};
use crate::display::{blit, Backend, Display, DisplayEvent, Palette};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const THREAD_NAME: &str = "palfb-present";

/// Where the event loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    WaitingForEvent,
    ProcessingRedraw,
    ProcessingTerminate,
    ProcessingWindowEvent,
    Exited,
}

/// Start the presentation thread
pub(crate) fn spawn<B: Backend>(
    backend: B,
    config: PresenterConfig,
    palette: Arc<Palette>,
    shared: Arc<Shared>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(THREAD_NAME.to_string())
        .spawn(move || run(backend, config, palette, shared))
}

fn run<B: Backend>(backend: B, config: PresenterConfig, palette: Arc<Palette>, shared: Arc<Shared>) {
    // Declared before the display so it runs after the display is released,
    // including when unwinding
    let _exit = ExitGuard(Arc::clone(&shared));

    let display = match backend.open(&config) {
        Ok(display) => display,
        Err(err) => {
            log::error!("presentation thread: {}", err);
            shared.publish_failure(err);
            return;
        }
    };

    log::info!(
        "presentation thread ready ({}x{} buffer, {}x{} window)",
        config.buffer_width,
        config.buffer_height,
        config.window_width,
        config.window_height
    );
    shared.publish_ready(display.waker());

    let event_loop = EventLoop {
        display,
        palette,
        shared,
        width: config.buffer_width as usize,
        height: config.buffer_height as usize,
        state: LoopState::WaitingForEvent,
        mail: Mail::default(),
    };
    event_loop.run();
}

/// Marks the thread as stopped however it exits
struct ExitGuard(Arc<Shared>);

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.0.mark_quit();
        self.0.begin_teardown();
        self.0.finish();
        log::debug!("presentation thread exited");
    }
}

/// A frame being rendered
///
/// If dropped without `complete`, the frame goes back to the application
/// marked as terminated.
struct InFlight<'a> {
    shared: &'a Shared,
    frame: Option<Frame>,
}

impl<'a> InFlight<'a> {
    fn new(shared: &'a Shared, frame: Frame) -> Self {
        Self {
            shared,
            frame: Some(frame),
        }
    }

    fn pixels(&self) -> &[u8] {
        self.frame
            .as_ref()
            .map(|frame| frame.pixels.as_slice())
            .unwrap_or_default()
    }

    fn complete(mut self, status: Result<(), RenderError>) {
        if let Some(frame) = self.frame.take() {
            self.shared.complete_render(frame, status);
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.shared.complete_render(frame, Err(RenderError::Terminated));
        }
    }
}

struct EventLoop<D: Display> {
    display: D,
    palette: Arc<Palette>,
    shared: Arc<Shared>,
    width: usize,
    height: usize,
    state: LoopState,
    mail: Mail,
}

impl<D: Display> EventLoop<D> {
    fn run(mut self) {
        // Block for the first event, then drain whatever is already queued
        let mut blocking = true;
        loop {
            self.state = match self.state {
                LoopState::WaitingForEvent => {
                    let timeout = if blocking { None } else { Some(Duration::ZERO) };
                    match self.display.wait_event(timeout) {
                        Some(event) => {
                            blocking = false;
                            self.accept(event)
                        }
                        None if blocking => {
                            log::warn!("display event source closed");
                            LoopState::Exited
                        }
                        None => {
                            blocking = true;
                            LoopState::WaitingForEvent
                        }
                    }
                }
                LoopState::ProcessingRedraw => self.redraw_pending(),
                LoopState::ProcessingTerminate => LoopState::Exited,
                LoopState::ProcessingWindowEvent => {
                    // Show the last blitted texture again; no palette conversion
                    if let Err(err) = self.display.present() {
                        log::warn!("re-present failed: {}", err);
                    }
                    LoopState::WaitingForEvent
                }
                LoopState::Exited => break,
            };
        }

        self.teardown();
    }

    /// State that handles `event`
    fn accept(&mut self, event: DisplayEvent) -> LoopState {
        match event {
            DisplayEvent::Wake => {
                self.mail = self.shared.take_mail();
                self.after_redraw()
            }
            DisplayEvent::CloseRequested => {
                log::info!("window closed");
                LoopState::ProcessingTerminate
            }
            DisplayEvent::Exposed => LoopState::ProcessingWindowEvent,
            DisplayEvent::Other => LoopState::WaitingForEvent,
        }
    }

    /// Next state once any frame in the mailbox has been handled
    fn after_redraw(&mut self) -> LoopState {
        if self.mail.frame.is_some() {
            LoopState::ProcessingRedraw
        } else if std::mem::take(&mut self.mail.terminate) {
            log::info!("termination requested");
            LoopState::ProcessingTerminate
        } else {
            LoopState::WaitingForEvent
        }
    }

    fn redraw_pending(&mut self) -> LoopState {
        if let Some(frame) = self.mail.frame.take() {
            let in_flight = InFlight::new(&self.shared, frame);
            let status = Self::redraw(
                &mut self.display,
                &self.palette,
                in_flight.pixels(),
                self.width,
                self.height,
            );
            in_flight.complete(status);
        }
        self.after_redraw()
    }

    /// Blit into the texture and present it
    ///
    /// A refused lock skips the blit but still presents what the texture held.
    fn redraw(
        display: &mut D,
        palette: &Palette,
        pixels: &[u8],
        width: usize,
        height: usize,
    ) -> Result<(), RenderError> {
        let blitted = match display.lock_surface() {
            Ok(mut surface) => {
                blit(pixels, width, height, palette, &mut surface);
                Ok(())
            }
            Err(err) => {
                log::warn!("surface lock failed: {}", err);
                Err(RenderError::SurfaceLock(err.message))
            }
        };

        let presented = display.present().map_err(|err| {
            log::warn!("present failed: {}", err);
            RenderError::Present(err.message)
        });

        blitted.and(presented)
    }

    fn teardown(self) {
        self.shared.mark_quit();
        self.shared.begin_teardown();
        log::debug!("presentation loop exited, releasing display");
        drop(self.display);
        log::info!("display released");
    }
}
