/// A decoded image as handed from the scanner to the embedder:
/// row-major RGB, 3 bytes per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePixels {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl ImagePixels {
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Self {
        debug_assert_eq!(rgb.len(), (width * height * 3) as usize);
        Self { width, height, rgb }
    }

    /// Number of pixels.
    pub fn pixel_count(&self) -> usize {
        (self.width * self.height) as usize
    }
}
