// Window backend - Native window and surface using winit + pixels
//
// The event loop is built on the presentation thread and driven with
// `pump_app_events`, so the presentation loop keeps control of when it
// blocks. The pixels texture is RGBA8 and is scaled to the window by
// whole multiples.

use super::backend::{Backend, BackendError, BackendStage, Display, DisplayError, DisplayEvent, Waker};
use super::blit::{PixelFormat, Surface};
use crate::presenter::config::{PresenterConfig, WindowFlags};
use pixels::{Pixels, PixelsBuilder, SurfaceTexture};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

/// Pumps allowed for the window to appear before giving up
const STARTUP_PUMPS: usize = 50;

/// Interval between startup pumps
const STARTUP_PUMP_INTERVAL: Duration = Duration::from_millis(10);

/// User event posted by the waker
#[derive(Debug, Clone, Copy)]
struct WakeSignal;

/// Backend that opens a native window
#[derive(Debug, Clone, Copy, Default)]
pub struct WinitBackend;

impl WinitBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for WinitBackend {
    type Display = WindowDisplay;

    fn open(self, config: &PresenterConfig) -> Result<WindowDisplay, BackendError> {
        if cfg!(target_os = "macos") {
            return Err(BackendError::new(
                BackendStage::Window,
                "the macOS event loop can only run on the main thread",
            ));
        }

        let mut event_loop =
            build_event_loop().map_err(|e| BackendError::new(BackendStage::Window, e.to_string()))?;
        let mut state = PumpState::new(window_attributes(config));

        // The window is created from `resumed`, delivered by the first pumps
        for _ in 0..STARTUP_PUMPS {
            if state.window.is_some() || state.create_error.is_some() {
                break;
            }
            if let PumpStatus::Exit(code) =
                event_loop.pump_app_events(Some(STARTUP_PUMP_INTERVAL), &mut state)
            {
                return Err(BackendError::new(
                    BackendStage::Window,
                    format!("event loop exited during startup (code {})", code),
                ));
            }
        }
        if let Some(err) = state.create_error.take() {
            return Err(BackendError::new(BackendStage::Window, err));
        }
        let window = state
            .window
            .clone()
            .ok_or_else(|| BackendError::new(BackendStage::Window, "window was never created"))?;

        let size = window.inner_size();
        let surface_texture =
            SurfaceTexture::new(size.width.max(1), size.height.max(1), Arc::clone(&window));
        let pixels = PixelsBuilder::new(config.buffer_width, config.buffer_height, surface_texture)
            .enable_vsync(config.vsync)
            .clear_color(pixels::wgpu::Color::BLACK)
            .build()
            .map_err(|e| BackendError::new(BackendStage::Surface, e.to_string()))?;

        if !config.flags.contains(WindowFlags::INTEGER_SCALE) {
            log::debug!("pixels scales by whole multiples regardless of INTEGER_SCALE");
        }
        log::debug!(
            "window created: {}x{} physical, {}x{} texture",
            size.width,
            size.height,
            config.buffer_width,
            config.buffer_height
        );

        let proxy = Mutex::new(event_loop.create_proxy());
        Ok(WindowDisplay {
            pixels,
            state,
            event_loop,
            proxy: Arc::new(proxy),
            width: config.buffer_width as usize,
            exited: false,
        })
    }
}

fn build_event_loop() -> Result<EventLoop<WakeSignal>, winit::error::EventLoopError> {
    let mut builder = EventLoop::<WakeSignal>::with_user_event();

    #[cfg(any(
        target_os = "linux",
        target_os = "dragonfly",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd"
    ))]
    {
        use winit::platform::wayland::EventLoopBuilderExtWayland;
        use winit::platform::x11::EventLoopBuilderExtX11;
        EventLoopBuilderExtX11::with_any_thread(&mut builder, true);
        EventLoopBuilderExtWayland::with_any_thread(&mut builder, true);
    }

    #[cfg(target_os = "windows")]
    {
        use winit::platform::windows::EventLoopBuilderExtWindows;
        builder.with_any_thread(true);
    }

    builder.build()
}

fn window_attributes(config: &PresenterConfig) -> WindowAttributes {
    let flags = config.flags;
    let fullscreen = flags
        .intersects(WindowFlags::FULLSCREEN | WindowFlags::FULLSCREEN_NATIVE)
        .then_some(Fullscreen::Borderless(None));

    Window::default_attributes()
        .with_title(config.title.clone())
        .with_inner_size(LogicalSize::new(config.window_width, config.window_height))
        .with_resizable(flags.contains(WindowFlags::RESIZABLE))
        .with_maximized(flags.contains(WindowFlags::MAXIMIZED))
        .with_fullscreen(fullscreen)
}

/// Receives winit callbacks during a pump and queues them as display events
struct PumpState {
    attributes: Option<WindowAttributes>,
    window: Option<Arc<Window>>,
    create_error: Option<String>,
    events: VecDeque<DisplayEvent>,
    resized: Option<PhysicalSize<u32>>,
}

impl PumpState {
    fn new(attributes: WindowAttributes) -> Self {
        Self {
            attributes: Some(attributes),
            window: None,
            create_error: None,
            events: VecDeque::new(),
            resized: None,
        }
    }
}

impl ApplicationHandler<WakeSignal> for PumpState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(attributes) = self.attributes.take() else {
            return;
        };
        match event_loop.create_window(attributes) {
            Ok(window) => self.window = Some(Arc::new(window)),
            Err(err) => self.create_error = Some(err.to_string()),
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, _event: WakeSignal) {
        self.events.push_back(DisplayEvent::Wake);
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let event = match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => DisplayEvent::CloseRequested,
            WindowEvent::Resized(size) => {
                self.resized = Some(size);
                DisplayEvent::Exposed
            }
            WindowEvent::RedrawRequested
            | WindowEvent::Moved(_)
            | WindowEvent::Focused(_)
            | WindowEvent::Occluded(false)
            | WindowEvent::ScaleFactorChanged { .. } => DisplayEvent::Exposed,
            _ => DisplayEvent::Other,
        };
        self.events.push_back(event);
    }
}

/// Opened native window
pub struct WindowDisplay {
    // Field order is release order: texture/surface, window, event loop
    pixels: Pixels<'static>,
    state: PumpState,
    event_loop: EventLoop<WakeSignal>,
    proxy: Arc<Mutex<winit::event_loop::EventLoopProxy<WakeSignal>>>,
    width: usize,
    exited: bool,
}

impl WindowDisplay {
    fn apply_resize(&mut self) {
        let Some(size) = self.state.resized.take() else {
            return;
        };
        if size.width == 0 || size.height == 0 {
            return;
        }
        if let Err(err) = self.pixels.resize_surface(size.width, size.height) {
            log::warn!("failed to resize surface to {}x{}: {}", size.width, size.height, err);
        }
    }
}

impl Display for WindowDisplay {
    fn waker(&self) -> Waker {
        let proxy = Arc::clone(&self.proxy);
        Waker::new(move || {
            let sent = proxy
                .lock()
                .map(|proxy| proxy.send_event(WakeSignal).is_ok())
                .unwrap_or(false);
            if !sent {
                log::debug!("wake dropped: event loop closed");
            }
        })
    }

    fn wait_event(&mut self, timeout: Option<Duration>) -> Option<DisplayEvent> {
        loop {
            if let Some(event) = self.state.events.pop_front() {
                return Some(event);
            }
            if self.exited {
                return None;
            }

            if let PumpStatus::Exit(code) = self.event_loop.pump_app_events(timeout, &mut self.state)
            {
                log::debug!("event loop exited (code {})", code);
                self.exited = true;
            }
            self.apply_resize();

            if timeout.is_some() {
                return self.state.events.pop_front();
            }
        }
    }

    fn lock_surface(&mut self) -> Result<Surface<'_>, DisplayError> {
        let pitch = self.width * PixelFormat::BYTES_PER_PIXEL;
        Ok(Surface::new(self.pixels.frame_mut(), pitch, PixelFormat::Rgba8))
    }

    fn present(&mut self) -> Result<(), DisplayError> {
        self.pixels
            .render()
            .map_err(|e| DisplayError::new(e.to_string()))
    }
}
