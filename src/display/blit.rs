// Blitter - Palette lookup from indexed pixels into a direct-color surface

use super::palette::{argb_to_rgba, Palette, PALETTE_SIZE};

/// Byte layout of one destination pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Packed 0xAARRGGBB stored as a native-endian u32
    Argb8888,
    /// Four bytes in R, G, B, A order
    Rgba8,
}

impl PixelFormat {
    /// Bytes per destination pixel
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Encode a packed ARGB color in this format
    #[inline]
    pub fn encode(self, argb: u32) -> [u8; 4] {
        match self {
            PixelFormat::Argb8888 => argb.to_ne_bytes(),
            PixelFormat::Rgba8 => argb_to_rgba(argb),
        }
    }
}

/// A locked, writable view of a presentation surface
///
/// Dropping the view unlocks the surface.
pub struct Surface<'a> {
    pixels: &'a mut [u8],
    pitch: usize,
    format: PixelFormat,
}

impl<'a> Surface<'a> {
    /// Wrap locked surface memory
    ///
    /// # Arguments
    /// * `pixels` - Surface memory
    /// * `pitch` - Bytes from the start of one row to the next
    /// * `format` - Layout of each pixel
    pub fn new(pixels: &'a mut [u8], pitch: usize, format: PixelFormat) -> Self {
        Self {
            pixels,
            pitch,
            format,
        }
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }
}

/// Convert an indexed image into the surface
///
/// Pixel `i` of `src` (row-major, `width` per row) becomes
/// `palette[src[i]]` at the same position in the surface. The palette is
/// read once up front. A source or surface smaller than `width * height`
/// truncates the copy instead of panicking.
pub fn blit(src: &[u8], width: usize, height: usize, palette: &Palette, dst: &mut Surface<'_>) {
    if width == 0 || dst.pitch == 0 {
        return;
    }

    let format = dst.format;
    let colors = palette.snapshot();
    let mut encoded = [[0u8; 4]; PALETTE_SIZE];
    for (slot, &color) in encoded.iter_mut().zip(colors.iter()) {
        *slot = format.encode(color);
    }

    let rows = src.chunks(width).zip(dst.pixels.chunks_mut(dst.pitch));
    for (src_row, dst_row) in rows.take(height) {
        for (out, &index) in dst_row
            .chunks_exact_mut(PixelFormat::BYTES_PER_PIXEL)
            .zip(src_row)
        {
            out.copy_from_slice(&encoded[index as usize]);
        }
    }
}
