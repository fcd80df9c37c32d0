// Screenshot functionality
//
// Resolves an indexed frame through the palette and saves it as a PNG file.

use crate::display::{argb_to_rgba, Palette};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur during screenshot operations
#[derive(Debug)]
pub enum ScreenshotError {
    /// I/O error
    Io(io::Error),

    /// PNG encoding error
    PngEncoding(png::EncodingError),
}

impl std::fmt::Display for ScreenshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScreenshotError::Io(e) => write!(f, "I/O error: {}", e),
            ScreenshotError::PngEncoding(e) => write!(f, "PNG encoding error: {}", e),
        }
    }
}

impl std::error::Error for ScreenshotError {}

impl From<io::Error> for ScreenshotError {
    fn from(e: io::Error) -> Self {
        ScreenshotError::Io(e)
    }
}

impl From<png::EncodingError> for ScreenshotError {
    fn from(e: png::EncodingError) -> Self {
        ScreenshotError::PngEncoding(e)
    }
}

/// Save a screenshot of an indexed frame
///
/// # Arguments
///
/// * `pixels` - Palette indices, `width * height` bytes
/// * `width` - Frame width
/// * `height` - Frame height
/// * `palette` - Palette to resolve indices with
/// * `dir` - Directory to write into (created if missing)
///
/// # Returns
///
/// Result containing the path to the saved screenshot or an error
pub fn save_screenshot(
    pixels: &[u8],
    width: u32,
    height: u32,
    palette: &Palette,
    dir: &Path,
) -> Result<PathBuf, ScreenshotError> {
    fs::create_dir_all(dir)?;

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S_%3f");
    let file_path = dir.join(format!("screenshot_{}.png", timestamp));

    let rgba = indices_to_rgba(pixels, palette);
    save_png(&file_path, &rgba, width, height)?;

    log::info!("screenshot saved to {}", file_path.display());
    Ok(file_path)
}

/// Resolve palette indices to RGBA8888 bytes
fn indices_to_rgba(pixels: &[u8], palette: &Palette) -> Vec<u8> {
    let colors = palette.snapshot();
    pixels
        .iter()
        .flat_map(|&index| argb_to_rgba(colors[index as usize]))
        .collect()
}

/// Save RGBA data as a PNG file
fn save_png(path: &Path, data: &[u8], width: u32, height: u32) -> Result<(), ScreenshotError> {
    let file = fs::File::create(path)?;
    let w = io::BufWriter::new(file);

    let mut encoder = png::Encoder::new(w, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(data)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_to_rgba() {
        let palette = Palette::with_colors(&[0xFF000000, 0xFF0000AA]);
        let rgba = indices_to_rgba(&[1, 0], &palette);
        assert_eq!(rgba, vec![0x00, 0x00, 0xAA, 0xFF, 0x00, 0x00, 0x00, 0xFF]);
    }

    #[test]
    fn test_save_screenshot_writes_png() {
        let dir = std::env::temp_dir().join(format!("palfb_shots_{}", std::process::id()));
        let palette = Palette::with_colors(&[0xFFFFFFFF]);
        let pixels = vec![0u8; 4 * 3];

        let path = save_screenshot(&pixels, 4, 3, &palette, &dir).unwrap();
        let bytes = fs::read(&path).unwrap();
        let _ = fs::remove_dir_all(&dir);

        assert_eq!(&bytes[1..4], b"PNG");
    }
}
