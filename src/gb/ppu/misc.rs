//! Pixel and palette helpers for scanline rendering (§4.7).

/// A raw, non-colorized pixel as read out of tile data: 2 bits, 0-3.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub enum Pixel {
    #[default]
    Zero,
    One,
    Two,
    Three,
}

impl From<Pixel> for u8 {
    #[inline]
    fn from(value: Pixel) -> u8 {
        match value {
            Pixel::Zero => 0b00,
            Pixel::One => 0b01,
            Pixel::Two => 0b10,
            Pixel::Three => 0b11,
        }
    }
}

impl From<u8> for Pixel {
    #[inline]
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0b00 => Pixel::Zero,
            0b01 => Pixel::One,
            0b10 => Pixel::Two,
            0b11 => Pixel::Three,
            _ => unreachable!(),
        }
    }
}

/// Applies a palette byte (BGP/OBP0/OBP1) to a raw color id, every two bits
/// mapping one id to its displayed shade.
#[inline]
pub fn apply_palette(palette: u8, color_id: u8) -> u8 {
    (palette >> (color_id * 2)) & 0b11
}
