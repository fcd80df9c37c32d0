// Common test utilities for presenter integration tests

#![allow(dead_code)]

use palfb::{HeadlessBackend, HeadlessHandle, Presenter, PresenterConfig, WindowFlags};
use std::thread;
use std::time::{Duration, Instant};

/// How long to wait for the presentation thread to react to an injected event
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a small test frame
pub fn test_config(width: u32, height: u32) -> PresenterConfig {
    PresenterConfig::new(width, height)
        .with_window_size(width * 8, height * 8)
        .with_title("t")
        .with_flags(WindowFlags::empty())
}

/// Start a presenter on a fresh headless backend
pub fn headless(width: u32, height: u32) -> (Presenter, HeadlessHandle) {
    start(test_config(width, height), HeadlessBackend::new())
}

/// Start a presenter on the given headless backend
pub fn start(config: PresenterConfig, backend: HeadlessBackend) -> (Presenter, HeadlessHandle) {
    let handle = backend.handle();
    let presenter = Presenter::initialize(config, backend).expect("headless initialize failed");
    (presenter, handle)
}

/// Poll `condition` until it holds or `EVENT_TIMEOUT` elapses
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + EVENT_TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}
