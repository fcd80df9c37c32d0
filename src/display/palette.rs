// Palette Table - 256 packed ARGB colors shared with the presentation thread
//
// The application thread may rewrite entries at any time without
// coordinating with a blit in progress. Each entry is an atomic word, so a
// reader always sees a whole color; a blit may observe a mix of old and new
// entries for at most one frame.

use std::sync::atomic::{AtomicU32, Ordering};

/// Number of entries in the palette (one per possible index byte)
pub const PALETTE_SIZE: usize = 256;

/// The 16-color CGA palette in packed ARGB format (0xAARRGGBB)
pub const CGA_PALETTE: [u32; 16] = [
    0xFF000000, 0xFF0000AA, 0xFF00AA00, 0xFF00AAAA, 0xFFAA0000, 0xFFAA00AA, 0xFFAA5500, 0xFFAAAAAA,
    0xFF555555, 0xFF5555FF, 0xFF55FF55, 0xFF55FFFF, 0xFFFF5555, 0xFFFF55FF, 0xFFFFFF55, 0xFFFFFFFF,
];

/// Indexed color table
///
/// Any 32-bit pattern is a legal entry. Entries start out as zero.
pub struct Palette {
    entries: [AtomicU32; PALETTE_SIZE],
}

impl Palette {
    /// Create a palette with every entry set to zero
    pub fn new() -> Self {
        Self {
            entries: std::array::from_fn(|_| AtomicU32::new(0)),
        }
    }

    /// Create a palette whose leading entries are taken from `colors`
    pub fn with_colors(colors: &[u32]) -> Self {
        let palette = Self::new();
        palette.load(colors);
        palette
    }

    /// Get the packed ARGB color for an index
    #[inline]
    pub fn get(&self, index: u8) -> u32 {
        self.entries[index as usize].load(Ordering::Relaxed)
    }

    /// Set the packed ARGB color for an index
    #[inline]
    pub fn set(&self, index: u8, argb: u32) {
        self.entries[index as usize].store(argb, Ordering::Relaxed);
    }

    /// Overwrite entries starting at index 0
    ///
    /// Colors beyond the 256th are ignored.
    pub fn load(&self, colors: &[u32]) {
        for (entry, &color) in self.entries.iter().zip(colors) {
            entry.store(color, Ordering::Relaxed);
        }
    }

    /// Copy out all entries
    ///
    /// The blit works from one snapshot per frame.
    pub fn snapshot(&self) -> [u32; PALETTE_SIZE] {
        std::array::from_fn(|i| self.entries[i].load(Ordering::Relaxed))
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Palette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Palette").finish_non_exhaustive()
    }
}

/// Convert a packed ARGB color to RGBA bytes as expected by the pixels crate
///
/// # Arguments
/// * `argb` - 32-bit color (0xAARRGGBB)
///
/// # Returns
/// Array of [R, G, B, A] bytes
#[inline]
pub fn argb_to_rgba(argb: u32) -> [u8; 4] {
    [
        ((argb >> 16) & 0xFF) as u8, // Red
        ((argb >> 8) & 0xFF) as u8,  // Green
        (argb & 0xFF) as u8,         // Blue
        ((argb >> 24) & 0xFF) as u8, // Alpha
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_starts_zeroed() {
        let palette = Palette::new();
        assert!(palette.snapshot().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_set_get() {
        let palette = Palette::new();
        palette.set(0xFF, 0xDEADBEEF);
        assert_eq!(palette.get(0xFF), 0xDEADBEEF);
        assert_eq!(palette.get(0x00), 0);
    }

    #[test]
    fn test_load_cga() {
        let palette = Palette::with_colors(&CGA_PALETTE);
        assert_eq!(palette.get(1), 0xFF0000AA);
        assert_eq!(palette.get(15), 0xFFFFFFFF);
        assert_eq!(palette.get(16), 0);
    }

    #[test]
    fn test_load_ignores_overflow() {
        let colors = vec![7u32; 300];
        let palette = Palette::new();
        palette.load(&colors);
        assert_eq!(palette.get(255), 7);
    }

    #[test]
    fn test_argb_to_rgba() {
        assert_eq!(argb_to_rgba(0x80123456), [0x12, 0x34, 0x56, 0x80]);
    }
}
