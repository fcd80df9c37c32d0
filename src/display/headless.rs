// Headless backend - An in-memory display for tests and offscreen use
//
// The surface is ARGB8888 with optional row padding. A `HeadlessHandle`
// stays with the caller and can inject window events, force failures and
// inspect what was presented.

use super::backend::{Backend, BackendError, BackendStage, Display, DisplayError, DisplayEvent, Waker};
use super::blit::{PixelFormat, Surface};
use crate::presenter::config::PresenterConfig;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Acquisition / release record of a native resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceEvent {
    Acquired(BackendStage),
    Released(BackendStage),
}

#[derive(Default)]
struct State {
    events: VecDeque<DisplayEvent>,
    resources: Vec<ResourceEvent>,
    /// Last presented frame, one packed ARGB value per pixel
    screen: Vec<u32>,
    presents: usize,
    locks: usize,
    fail_lock: bool,
    fail_present: bool,
}

struct Shared {
    state: Mutex<State>,
    ready: Condvar,
}

/// Caller-side control of a headless display
#[derive(Clone)]
pub struct HeadlessHandle {
    shared: Arc<Shared>,
}

impl HeadlessHandle {
    fn state(&self) -> MutexGuard<'_, State> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, event: DisplayEvent) {
        self.state().events.push_back(event);
        self.shared.ready.notify_all();
    }

    /// Simulate the user closing the window
    pub fn close(&self) {
        self.push(DisplayEvent::CloseRequested);
    }

    /// Simulate a resize / expose
    pub fn expose(&self) {
        self.push(DisplayEvent::Exposed);
    }

    /// Simulate an event the presentation loop does not care about
    pub fn input(&self) {
        self.push(DisplayEvent::Other);
    }

    /// Make subsequent surface locks fail
    pub fn fail_surface_lock(&self, fail: bool) {
        self.state().fail_lock = fail;
    }

    /// Make subsequent presents fail
    pub fn fail_present(&self, fail: bool) {
        self.state().fail_present = fail;
    }

    /// Last presented frame as packed ARGB values, row-major
    pub fn presented_frame(&self) -> Vec<u32> {
        self.state().screen.clone()
    }

    /// Number of presents so far
    pub fn present_count(&self) -> usize {
        self.state().presents
    }

    /// Number of successful surface locks (blits) so far
    pub fn lock_count(&self) -> usize {
        self.state().locks
    }

    /// Resource acquisitions and releases in the order they happened
    pub fn resource_log(&self) -> Vec<ResourceEvent> {
        self.state().resources.clone()
    }

    /// Whether every acquired resource has been released again
    pub fn all_released(&self) -> bool {
        let log = self.resource_log();
        let acquired = log
            .iter()
            .filter(|e| matches!(e, ResourceEvent::Acquired(_)))
            .count();
        acquired * 2 == log.len()
    }
}

/// In-memory backend
pub struct HeadlessBackend {
    handle: HeadlessHandle,
    fail_stage: Option<BackendStage>,
    row_padding: usize,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            handle: HeadlessHandle {
                shared: Arc::new(Shared {
                    state: Mutex::new(State::default()),
                    ready: Condvar::new(),
                }),
            },
            fail_stage: None,
            row_padding: 0,
        }
    }

    /// Fail opening at the given acquisition stage
    pub fn fail_at(mut self, stage: BackendStage) -> Self {
        self.fail_stage = Some(stage);
        self
    }

    /// Add unused bytes at the end of each surface row
    pub fn with_row_padding(mut self, bytes: usize) -> Self {
        self.row_padding = bytes;
        self
    }

    pub fn handle(&self) -> HeadlessHandle {
        self.handle.clone()
    }

    fn acquire(&self, stage: BackendStage) -> Result<Resource, BackendError> {
        if self.fail_stage == Some(stage) {
            return Err(BackendError::new(stage, "injected failure"));
        }
        self.handle
            .state()
            .resources
            .push(ResourceEvent::Acquired(stage));
        Ok(Resource {
            stage,
            handle: self.handle.clone(),
        })
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for HeadlessBackend {
    type Display = HeadlessDisplay;

    fn open(self, config: &PresenterConfig) -> Result<HeadlessDisplay, BackendError> {
        let window = self.acquire(BackendStage::Window)?;
        let surface = self.acquire(BackendStage::Surface)?;
        let texture = self.acquire(BackendStage::Texture)?;

        let width = config.buffer_width as usize;
        let height = config.buffer_height as usize;
        let pitch = width * PixelFormat::BYTES_PER_PIXEL + self.row_padding;

        Ok(HeadlessDisplay {
            _texture: texture,
            _surface: surface,
            _window: window,
            pixels: vec![0; pitch * height],
            pitch,
            width,
            height,
            handle: self.handle,
        })
    }
}

/// Marks a held native resource; records its release when dropped
struct Resource {
    stage: BackendStage,
    handle: HeadlessHandle,
}

impl Drop for Resource {
    fn drop(&mut self) {
        self.handle
            .state()
            .resources
            .push(ResourceEvent::Released(self.stage));
    }
}

/// Opened headless display
pub struct HeadlessDisplay {
    // Field order is release order
    _texture: Resource,
    _surface: Resource,
    _window: Resource,
    pixels: Vec<u8>,
    pitch: usize,
    width: usize,
    height: usize,
    handle: HeadlessHandle,
}

impl Display for HeadlessDisplay {
    fn waker(&self) -> Waker {
        let handle = self.handle.clone();
        Waker::new(move || handle.push(DisplayEvent::Wake))
    }

    fn wait_event(&mut self, timeout: Option<Duration>) -> Option<DisplayEvent> {
        let shared = &self.handle.shared;
        let mut state = self.handle.state();
        match timeout {
            None => {
                while state.events.is_empty() {
                    state = shared
                        .ready
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
            Some(timeout) if state.events.is_empty() && !timeout.is_zero() => {
                state = shared
                    .ready
                    .wait_timeout(state, timeout)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0;
            }
            Some(_) => {}
        }
        state.events.pop_front()
    }

    fn lock_surface(&mut self) -> Result<Surface<'_>, DisplayError> {
        {
            let mut state = self.handle.state();
            if state.fail_lock {
                return Err(DisplayError::new("surface lock refused"));
            }
            state.locks += 1;
        }
        Ok(Surface::new(
            &mut self.pixels,
            self.pitch,
            PixelFormat::Argb8888,
        ))
    }

    fn present(&mut self) -> Result<(), DisplayError> {
        let mut state = self.handle.state();
        if state.fail_present {
            return Err(DisplayError::new("present refused"));
        }
        state.screen.clear();
        for row in self.pixels.chunks(self.pitch).take(self.height) {
            state.screen.extend(
                row.chunks_exact(PixelFormat::BYTES_PER_PIXEL)
                    .take(self.width)
                    .map(|px| u32::from_ne_bytes([px[0], px[1], px[2], px[3]])),
            );
        }
        state.presents += 1;
        Ok(())
    }
}
