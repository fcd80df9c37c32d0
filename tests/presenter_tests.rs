// Presenter integration tests
//
// Drive the full handoff between the application thread and the
// presentation thread on the headless backend.

mod common;

use common::{headless, start, test_config, wait_until, EVENT_TIMEOUT};
use palfb::display::{HeadlessDisplay, ResourceEvent};
use palfb::{
    Backend, BackendError, BackendStage, HeadlessBackend, InitError, LifecycleState, Presenter,
    PresenterConfig, RenderError, CGA_PALETTE,
};
use std::time::Instant;

/// Opens every headless resource, then panics before reporting readiness
struct CrashingBackend(HeadlessBackend);

impl Backend for CrashingBackend {
    type Display = HeadlessDisplay;

    fn open(self, config: &PresenterConfig) -> Result<HeadlessDisplay, BackendError> {
        let _display = self.0.open(config)?;
        panic!("backend crashed while opening");
    }
}

#[test_log::test]
fn test_render_shows_palette_colors() {
    let (mut presenter, handle) = headless(4, 4);
    assert_eq!(presenter.lifecycle(), LifecycleState::Running);

    for (i, px) in presenter.buffer_mut().iter_mut().enumerate() {
        *px = (i % 16 % 4) as u8;
    }
    let palette = presenter.palette();
    palette.set(0, 0xFF112233);
    palette.set(1, 0xFF445566);
    palette.set(2, 0xFF778899);
    palette.set(3, 0xFFAABBCC);

    assert_eq!(presenter.render(), Ok(()));

    let frame = handle.presented_frame();
    assert_eq!(frame[0], presenter.palette().get(0));
    assert_eq!(frame.len(), 16);
    for (i, &color) in frame.iter().enumerate() {
        assert_eq!(color, presenter.palette().get(presenter.buffer()[i]));
    }
}

#[test_log::test]
fn test_render_respects_surface_pitch() {
    let backend = HeadlessBackend::new().with_row_padding(12);
    let (mut presenter, handle) = start(test_config(5, 3), backend);
    presenter.palette().load(&CGA_PALETTE);
    for y in 0..3 {
        for x in 0..5 {
            presenter.plot(x, y, (x + y * 5) as u8);
        }
    }

    presenter.render().unwrap();

    let expected: Vec<u32> = (0..15).map(|i| CGA_PALETTE[i]).collect();
    assert_eq!(handle.presented_frame(), expected);
}

#[test_log::test]
fn test_each_render_waits_for_its_own_present() {
    let (mut presenter, handle) = headless(8, 8);

    handle.fail_surface_lock(true);
    let first = presenter.render();
    assert!(matches!(first, Err(RenderError::SurfaceLock(_))));
    assert_eq!(handle.present_count(), 1);

    handle.fail_surface_lock(false);
    assert_eq!(presenter.render(), Ok(()));
    assert_eq!(handle.present_count(), 2);
    assert_eq!(handle.lock_count(), 1);
}

#[test_log::test]
fn test_lock_failure_presents_previous_frame() {
    let (mut presenter, handle) = headless(2, 2);
    presenter.palette().set(1, 0xFF00FF00);
    presenter.palette().set(2, 0xFFFF0000);

    presenter.buffer_mut().fill(1);
    presenter.render().unwrap();

    handle.fail_surface_lock(true);
    presenter.buffer_mut().fill(2);
    let err = presenter.render().unwrap_err();
    assert!(!err.is_terminal());
    assert_eq!(handle.presented_frame(), vec![0xFF00FF00; 4]);

    handle.fail_surface_lock(false);
    presenter.render().unwrap();
    assert_eq!(handle.presented_frame(), vec![0xFFFF0000; 4]);
}

#[test_log::test]
fn test_present_failure_is_reported() {
    let (mut presenter, handle) = headless(2, 2);
    handle.fail_present(true);
    assert!(matches!(presenter.render(), Err(RenderError::Present(_))));
    handle.fail_present(false);
    assert_eq!(presenter.render(), Ok(()));
}

#[test_log::test]
fn test_palette_change_visible_next_frame() {
    let (mut presenter, handle) = headless(3, 1);
    presenter.palette().set(0, 0xFF000001);
    presenter.render().unwrap();
    assert_eq!(handle.presented_frame(), vec![0xFF000001; 3]);

    presenter.palette().set(0, 0xFF000002);
    presenter.render().unwrap();
    assert_eq!(handle.presented_frame(), vec![0xFF000002; 3]);
}

#[test_log::test]
fn test_expose_represents_without_blit() {
    let (mut presenter, handle) = headless(4, 4);
    presenter.render().unwrap();
    assert_eq!((handle.present_count(), handle.lock_count()), (1, 1));

    handle.input();
    handle.expose();
    assert!(wait_until(|| handle.present_count() == 2));
    assert_eq!(handle.lock_count(), 1);
    assert!(!presenter.has_terminated());
}

#[test_log::test]
fn test_termination_is_idempotent() {
    let (mut presenter, handle) = headless(4, 4);

    presenter.request_termination_and_wait();
    assert!(presenter.has_terminated());
    assert_eq!(presenter.lifecycle(), LifecycleState::Terminated);
    assert!(handle.all_released());

    presenter.request_termination_and_wait();
    assert_eq!(presenter.render(), Err(RenderError::Terminated));
}

#[test_log::test]
fn test_external_buffer_swap() {
    let (mut presenter, handle) = headless(4, 4);
    presenter.palette().set(1, 0xFF0000AA);
    presenter.palette().set(2, 0xFF00AA00);
    presenter.buffer_mut().fill(1);

    assert!(presenter.set_active_buffer(Some(vec![0; 16])).is_none());
    presenter.buffer_mut().fill(2);
    presenter.render().unwrap();
    assert_eq!(handle.presented_frame(), vec![0xFF00AA00; 16]);

    let external = presenter.set_active_buffer(None).unwrap();
    assert_eq!(external, vec![2; 16]);
    assert_eq!(presenter.buffer(), &[1; 16][..]);

    presenter.render().unwrap();
    assert_eq!(handle.presented_frame(), vec![0xFF0000AA; 16]);
}

#[test_log::test]
fn test_replacing_external_buffer_returns_previous() {
    let (mut presenter, _handle) = headless(2, 2);
    presenter.set_active_buffer(Some(vec![3; 4]));
    let previous = presenter.set_active_buffer(Some(vec![4; 4]));
    assert_eq!(previous, Some(vec![3; 4]));
    assert_eq!(presenter.buffer(), &[4; 4][..]);
}

#[test_log::test]
fn test_window_close_observed_without_request() {
    let (mut presenter, handle) = headless(4, 4);
    presenter.render().unwrap();

    handle.close();
    assert!(wait_until(|| presenter.has_terminated()));
    assert_eq!(presenter.render(), Err(RenderError::Terminated));
    assert!(wait_until(|| presenter.lifecycle() == LifecycleState::Terminated));
    assert!(handle.all_released());

    presenter.request_termination_and_wait();
}

#[test_log::test]
fn test_render_racing_close_does_not_hang() {
    let (mut presenter, handle) = headless(4, 4);
    handle.close();
    // Queued behind the close; either rejected up front or failed at teardown
    let result = presenter.render();
    assert!(result == Ok(()) || result == Err(RenderError::Terminated));
    assert!(wait_until(|| presenter.has_terminated()));
}

#[test_log::test]
fn test_init_failure_per_stage() {
    let stages = [
        (BackendStage::Window, -4),
        (BackendStage::Surface, -5),
        (BackendStage::Texture, -6),
    ];

    for (stage, code) in stages {
        let backend = HeadlessBackend::new().fail_at(stage);
        let handle = backend.handle();

        let err = Presenter::initialize(test_config(4, 4), backend).unwrap_err();

        assert_eq!(err.code(), code, "stage {:?}", stage);
        assert!(matches!(err, InitError::Backend(ref e) if e.stage == stage));
        assert!(handle.all_released());
        let log = handle.resource_log();
        let released: Vec<_> = log
            .iter()
            .filter_map(|e| match e {
                ResourceEvent::Released(s) => Some(*s),
                _ => None,
            })
            .collect();
        let mut acquired: Vec<_> = log
            .iter()
            .filter_map(|e| match e {
                ResourceEvent::Acquired(s) => Some(*s),
                _ => None,
            })
            .collect();
        acquired.reverse();
        assert_eq!(released, acquired);
    }
}

#[test_log::test]
fn test_thread_exit_during_init_is_reported() {
    let backend = HeadlessBackend::new();
    let handle = backend.handle();

    let started = Instant::now();
    let err = Presenter::initialize(test_config(4, 4), CrashingBackend(backend)).unwrap_err();

    assert!(started.elapsed() < EVENT_TIMEOUT);
    assert!(matches!(err, InitError::ThreadExited));
    assert_eq!(err.code(), -2);
    assert_eq!(handle.resource_log().len(), 6);
    assert!(handle.all_released());
}

#[test_log::test]
fn test_close_right_after_ready_still_initializes() {
    for _ in 0..200 {
        let backend = HeadlessBackend::new();
        let handle = backend.handle();
        // Queued before the window exists, so it is the first event served
        handle.close();

        let mut presenter = Presenter::initialize(test_config(4, 4), backend)
            .expect("a close after ready is not an init failure");

        assert!(wait_until(|| presenter.has_terminated()));
        assert_eq!(presenter.render(), Err(RenderError::Terminated));
        presenter.request_termination_and_wait();
        assert_eq!(presenter.lifecycle(), LifecycleState::Terminated);
        assert!(handle.all_released());
    }
}

#[test_log::test]
fn test_allocation_failure_starts_nothing() {
    let backend = HeadlessBackend::new();
    let handle = backend.handle();

    let err = Presenter::initialize(PresenterConfig::new(u32::MAX, u32::MAX), backend).unwrap_err();

    assert_eq!(err.code(), -1);
    assert!(handle.resource_log().is_empty());
}

#[test_log::test]
fn test_drop_releases_display() {
    let (presenter, handle) = headless(4, 4);
    drop(presenter);
    assert!(handle.all_released());
    assert_eq!(handle.resource_log().len(), 6);
}
