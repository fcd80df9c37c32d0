// Handoff protocol - State shared between the application and presentation threads
//
// One mutex guards the lifecycle, init status, mailbox and render result.
// `init_ready` is signalled when init status or lifecycle changes,
// `render_done` when a render result is stored or the thread stops.
// Every status write happens under the mutex before the matching broadcast.
// `has_quit` sits outside the mutex so the application can poll it freely.

use super::error::RenderError;
use crate::display::{BackendError, Waker};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Lifecycle of the presentation thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Running,
    Terminating,
    Terminated,
}

/// Result of the initialization handshake
pub(crate) enum InitOutcome {
    Ready,
    Failed(BackendError),
    Exited,
}

enum InitStatus {
    Pending,
    Ready,
    Failed(BackendError),
}

/// A frame handed to the presentation thread, owned by it until completed
pub(crate) struct Frame {
    pub pixels: Vec<u8>,
}

/// A finished render: the frame goes back to the application with a status
pub(crate) struct Completed {
    pub frame: Frame,
    pub status: Result<(), RenderError>,
}

/// What the presentation thread found in the mailbox
#[derive(Default)]
pub(crate) struct Mail {
    pub frame: Option<Frame>,
    pub terminate: bool,
}

struct State {
    lifecycle: LifecycleState,
    init: InitStatus,
    waker: Option<Waker>,
    terminate_requested: bool,
    pending: Option<Frame>,
    completed: Option<Completed>,
}

pub(crate) struct Shared {
    state: Mutex<State>,
    init_ready: Condvar,
    render_done: Condvar,
    has_quit: AtomicBool,
}

impl Shared {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                lifecycle: LifecycleState::Uninitialized,
                init: InitStatus::Pending,
                waker: None,
                terminate_requested: false,
                pending: None,
                completed: None,
            }),
            init_ready: Condvar::new(),
            render_done: Condvar::new(),
            has_quit: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Every critical section leaves the state consistent, so a panic on
        // the other side doesn't invalidate it
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.lock().lifecycle
    }

    pub fn has_quit(&self) -> bool {
        self.has_quit.load(Ordering::Acquire)
    }

    pub fn mark_quit(&self) {
        self.has_quit.store(true, Ordering::Release);
    }

    // --- initialization handshake ---

    pub fn begin_init(&self) {
        self.lock().lifecycle = LifecycleState::Initializing;
    }

    /// Presentation thread: native resources are up
    pub fn publish_ready(&self, waker: Waker) {
        let mut state = self.lock();
        state.init = InitStatus::Ready;
        state.waker = Some(waker);
        state.lifecycle = LifecycleState::Running;
        self.init_ready.notify_all();
    }

    /// Presentation thread: acquisition failed and has been unwound
    pub fn publish_failure(&self, err: BackendError) {
        let mut state = self.lock();
        state.init = InitStatus::Failed(err);
        self.init_ready.notify_all();
    }

    /// Application thread: block until the presentation thread reports
    pub fn wait_for_init(&self) -> InitOutcome {
        let mut state = self.lock();
        loop {
            match std::mem::replace(&mut state.init, InitStatus::Pending) {
                // A thread that already stopped again still initialized;
                // the close shows up through has-quit
                InitStatus::Ready => {
                    state.init = InitStatus::Ready;
                    return InitOutcome::Ready;
                }
                InitStatus::Failed(err) => return InitOutcome::Failed(err),
                InitStatus::Pending if state.lifecycle == LifecycleState::Terminated => {
                    return InitOutcome::Exited;
                }
                InitStatus::Pending => {
                    state = self
                        .init_ready
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    // --- render rendezvous ---

    /// Application thread: place a frame in the mailbox
    ///
    /// Hands the frame back if the presentation thread is no longer running.
    pub fn post_frame(&self, frame: Frame) -> Result<Waker, Frame> {
        let mut state = self.lock();
        match (&state.lifecycle, state.waker.clone()) {
            (LifecycleState::Running, Some(waker)) => {
                debug_assert!(state.pending.is_none(), "render already in flight");
                state.completed = None;
                state.pending = Some(frame);
                Ok(waker)
            }
            _ => Err(frame),
        }
    }

    /// Application thread: block until the posted frame has been presented
    pub fn wait_for_render(&self) -> Completed {
        let mut state = self.lock();
        loop {
            if let Some(completed) = state.completed.take() {
                return completed;
            }
            state = self
                .render_done
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Presentation thread: store the result and release the application
    pub fn complete_render(&self, frame: Frame, status: Result<(), RenderError>) {
        let mut state = self.lock();
        state.completed = Some(Completed { frame, status });
        self.render_done.notify_all();
    }

    /// Presentation thread: empty the mailbox
    pub fn take_mail(&self) -> Mail {
        let mut state = self.lock();
        Mail {
            frame: state.pending.take(),
            terminate: std::mem::take(&mut state.terminate_requested),
        }
    }

    // --- shutdown handshake ---

    /// Application thread: ask the presentation thread to stop
    ///
    /// Returns the waker to signal if the thread is still running.
    pub fn request_termination(&self) -> Option<Waker> {
        let mut state = self.lock();
        if state.lifecycle != LifecycleState::Running {
            return None;
        }
        state.terminate_requested = true;
        state.waker.clone()
    }

    /// Presentation thread: stop accepting work and fail anything still queued
    pub fn begin_teardown(&self) {
        let mut state = self.lock();
        if matches!(
            state.lifecycle,
            LifecycleState::Terminating | LifecycleState::Terminated
        ) {
            return;
        }
        state.lifecycle = LifecycleState::Terminating;
        if let Some(frame) = state.pending.take() {
            state.completed = Some(Completed {
                frame,
                status: Err(RenderError::Terminated),
            });
        }
        self.render_done.notify_all();
    }

    /// Presentation thread: all native resources are released
    pub fn finish(&self) {
        let mut state = self.lock();
        if let Some(frame) = state.pending.take() {
            state.completed = Some(Completed {
                frame,
                status: Err(RenderError::Terminated),
            });
        }
        state.lifecycle = LifecycleState::Terminated;
        state.waker = None;
        self.init_ready.notify_all();
        self.render_done.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::BackendStage;
    use std::sync::Arc;
    use std::thread;

    fn noop_waker() -> Waker {
        Waker::new(|| {})
    }

    #[test]
    fn test_lifecycle_starts_uninitialized() {
        let shared = Shared::new();
        assert_eq!(shared.lifecycle(), LifecycleState::Uninitialized);
        assert!(!shared.has_quit());
    }

    #[test]
    fn test_init_ready_handshake() {
        let shared = Arc::new(Shared::new());
        shared.begin_init();

        let presenter = Arc::clone(&shared);
        let handle = thread::spawn(move || presenter.publish_ready(noop_waker()));

        assert!(matches!(shared.wait_for_init(), InitOutcome::Ready));
        assert_eq!(shared.lifecycle(), LifecycleState::Running);
        handle.join().unwrap();
    }

    #[test]
    fn test_ready_then_exit_still_reports_ready() {
        let shared = Shared::new();
        shared.begin_init();
        shared.publish_ready(noop_waker());
        shared.mark_quit();
        shared.begin_teardown();
        shared.finish();

        assert!(matches!(shared.wait_for_init(), InitOutcome::Ready));
        assert!(shared.has_quit());
        assert!(shared.post_frame(Frame { pixels: vec![0] }).is_err());
    }

    #[test]
    fn test_init_failure_handshake() {
        let shared = Shared::new();
        shared.begin_init();
        shared.publish_failure(BackendError::new(BackendStage::Surface, "nope"));

        match shared.wait_for_init() {
            InitOutcome::Failed(err) => assert_eq!(err.stage, BackendStage::Surface),
            _ => panic!("expected failure"),
        }
    }

    #[test]
    fn test_exit_without_status_unblocks_init() {
        let shared = Shared::new();
        shared.begin_init();
        shared.finish();
        assert!(matches!(shared.wait_for_init(), InitOutcome::Exited));
    }

    #[test]
    fn test_post_rejected_unless_running() {
        let shared = Shared::new();
        let frame = Frame { pixels: vec![1, 2] };
        let rejected = shared.post_frame(frame).err().unwrap();
        assert_eq!(rejected.pixels, vec![1, 2]);
    }

    #[test]
    fn test_teardown_fails_pending_frame() {
        let shared = Shared::new();
        shared.publish_ready(noop_waker());
        assert!(shared.post_frame(Frame { pixels: vec![7] }).is_ok());

        shared.begin_teardown();

        let completed = shared.wait_for_render();
        assert_eq!(completed.frame.pixels, vec![7]);
        assert_eq!(completed.status, Err(RenderError::Terminated));
        assert!(shared.request_termination().is_none());
    }

    #[test]
    fn test_result_is_not_reused() {
        let shared = Shared::new();
        shared.publish_ready(noop_waker());

        assert!(shared.post_frame(Frame { pixels: vec![] }).is_ok());
        let mail = shared.take_mail();
        shared.complete_render(mail.frame.unwrap(), Err(RenderError::SurfaceLock("x".into())));
        assert!(shared.wait_for_render().status.is_err());

        // Posting a new frame clears any stale result
        assert!(shared.post_frame(Frame { pixels: vec![] }).is_ok());
        let mail = shared.take_mail();
        shared.complete_render(mail.frame.unwrap(), Ok(()));
        assert_eq!(shared.wait_for_render().status, Ok(()));
    }
}
