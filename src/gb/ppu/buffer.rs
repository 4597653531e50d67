//! Owned pixel storage for one frame (§4.7): a flat array of 2-bit shades,
//! handed to the host through `Ppu::framebuffer`.

use crate::gb::{SCREEN_HEIGHT, SCREEN_WIDTH};

pub struct FrameBuffer {
    pixels: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            pixels: vec![0; usize::from(SCREEN_WIDTH) * usize::from(SCREEN_HEIGHT)],
        }
    }

    #[inline]
    pub fn write_pixel(&mut self, x: u8, y: u8, shade: u8) {
        let idx = usize::from(y) * usize::from(SCREEN_WIDTH) + usize::from(x);
        self.pixels[idx] = shade & 0b11;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.pixels
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
