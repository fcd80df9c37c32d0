// Frame Buffer - The logical indexed image
//
// One byte per pixel, row-major, each byte an index into the palette.

/// Frame buffer allocation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationError {
    /// Number of bytes that could not be allocated
    pub bytes: usize,
}

impl std::fmt::Display for AllocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to allocate {} byte frame buffer", self.bytes)
    }
}

impl std::error::Error for AllocationError {}

/// Frame buffer for storing palette indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    /// Pixel data stored as palette indices
    pixels: Vec<u8>,
}

impl FrameBuffer {
    /// Create a new frame buffer with every pixel set to index 0
    ///
    /// # Arguments
    /// * `width` - Width in pixels
    /// * `height` - Height in pixels
    ///
    /// # Returns
    /// The buffer, or an error if `width * height` bytes can't be allocated
    pub fn new(width: usize, height: usize) -> Result<Self, AllocationError> {
        let bytes = width.checked_mul(height).ok_or(AllocationError {
            bytes: usize::MAX,
        })?;

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(bytes)
            .map_err(|_| AllocationError { bytes })?;
        pixels.resize(bytes, 0);

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Set a pixel at the given coordinates
    ///
    /// # Panics
    /// Panics if coordinates are out of bounds
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, index: u8) {
        assert!(x < self.width, "X coordinate {} out of bounds", x);
        assert!(y < self.height, "Y coordinate {} out of bounds", y);

        self.pixels[y * self.width + x] = index;
    }

    /// Get a pixel at the given coordinates
    ///
    /// # Panics
    /// Panics if coordinates are out of bounds
    #[inline]
    pub fn get_pixel(&self, x: usize, y: usize) -> u8 {
        assert!(x < self.width, "X coordinate {} out of bounds", x);
        assert!(y < self.height, "Y coordinate {} out of bounds", y);

        self.pixels[y * self.width + x]
    }

    /// Fill the whole buffer with one index
    pub fn clear(&mut self, index: u8) {
        self.pixels.fill(index);
    }

    /// Get the raw pixel data as palette indices
    pub fn as_slice(&self) -> &[u8] {
        &self.pixels
    }

    /// Get mutable access to the raw pixel data
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Move the pixel storage out, leaving the buffer empty until `restore`
    pub(crate) fn lease(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.pixels)
    }

    /// Put back storage previously taken with `lease`
    pub(crate) fn restore(&mut self, pixels: Vec<u8>) {
        self.pixels = pixels;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framebuffer_creation() {
        let fb = FrameBuffer::new(4, 3).unwrap();
        assert_eq!(fb.as_slice().len(), 12);
        assert!(fb.as_slice().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_set_get_pixel() {
        let mut fb = FrameBuffer::new(8, 8).unwrap();
        fb.set_pixel(3, 5, 0x20);
        assert_eq!(fb.get_pixel(3, 5), 0x20);
        assert_eq!(fb.as_slice()[5 * 8 + 3], 0x20);
    }

    #[test]
    fn test_clear() {
        let mut fb = FrameBuffer::new(8, 8).unwrap();
        fb.set_pixel(0, 0, 0xFF);
        fb.clear(0x10);
        assert_eq!(fb.get_pixel(0, 0), 0x10);
        assert_eq!(fb.get_pixel(7, 7), 0x10);
    }

    #[test]
    fn test_overflowing_dimensions() {
        assert!(FrameBuffer::new(usize::MAX, 2).is_err());
    }

    #[test]
    fn test_lease_and_restore() {
        let mut fb = FrameBuffer::new(2, 2).unwrap();
        fb.set_pixel(1, 1, 9);
        let pixels = fb.lease();
        assert!(fb.as_slice().is_empty());
        fb.restore(pixels);
        assert_eq!(fb.get_pixel(1, 1), 9);
    }

    #[test]
    #[should_panic]
    fn test_set_pixel_out_of_bounds_x() {
        let mut fb = FrameBuffer::new(4, 4).unwrap();
        fb.set_pixel(4, 0, 0x00);
    }

    #[test]
    #[should_panic]
    fn test_set_pixel_out_of_bounds_y() {
        let mut fb = FrameBuffer::new(4, 4).unwrap();
        fb.set_pixel(0, 4, 0x00);
    }
}
