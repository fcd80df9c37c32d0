// Display module - Indexed images and the native surfaces they are shown on
//
// This module provides:
// - The 256-entry palette (packed ARGB, lock-free entries)
// - The indexed frame buffer
// - The palette blit into a direct-color surface
// - The backend seam used by the presentation thread
// - A winit + pixels window backend and an in-memory headless backend

pub mod backend;
pub mod blit;
pub mod framebuffer;
pub mod headless;
pub mod palette;
pub mod window;

pub use backend::{Backend, BackendError, BackendStage, Display, DisplayError, DisplayEvent, Waker};
pub use blit::{blit, PixelFormat, Surface};
pub use framebuffer::{AllocationError, FrameBuffer};
pub use headless::{HeadlessBackend, HeadlessDisplay, HeadlessHandle, ResourceEvent};
pub use palette::{argb_to_rgba, Palette, CGA_PALETTE, PALETTE_SIZE};
pub use window::{WindowDisplay, WinitBackend};
