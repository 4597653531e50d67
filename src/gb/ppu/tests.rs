use crate::gb::interrupt::InterruptRegister;
use crate::gb::memory::constants::{PPU_BGP, PPU_LCDC, PPU_LY, PPU_STAT};
use crate::gb::ppu::misc::{apply_palette, Pixel};
use crate::gb::ppu::pixel_from_line;
use crate::gb::ppu::registers::{LCDState, PPUMode};
use crate::gb::ppu::Ppu;
use crate::gb::{SCREEN_HEIGHT, SCREEN_WIDTH};

#[test]
fn test_get_lcd_mode() {
    let mut state = LCDState::empty();
    assert_eq!(state.mode(), PPUMode::HBlank);

    state = LCDState::PPU_MODE1;
    assert_eq!(state.mode(), PPUMode::VBlank);

    state = LCDState::PPU_MODE2;
    assert_eq!(state.mode(), PPUMode::OAMScan);

    state = LCDState::PPU_MODE1 | LCDState::PPU_MODE2;
    assert_eq!(state.mode(), PPUMode::PixelTransfer);
}

#[test]
fn test_set_lcd_mode() {
    let mut state = LCDState::empty();
    state.set_mode(PPUMode::HBlank);
    assert_eq!(state.bits(), 0b00000000);

    state.set_mode(PPUMode::VBlank);
    assert_eq!(state.bits(), 0b00000001);

    state.set_mode(PPUMode::OAMScan);
    assert_eq!(state.bits(), 0b00000010);

    state.set_mode(PPUMode::PixelTransfer);
    assert_eq!(state.bits(), 0b00000011);
}

#[test]
fn test_pixel() {
    let data = vec![
        (0b00, Pixel::Zero),
        (0b01, Pixel::One),
        (0b10, Pixel::Two),
        (0b11, Pixel::Three),
    ];
    for (value, pixel) in data {
        assert_eq!(u8::from(pixel), value);
        assert_eq!(Pixel::from(value), pixel);
    }
}

#[test]
fn test_pixel_from_line() {
    let data = vec![
        (0b0000_0000, 0b0000_0000, 0, Pixel::Zero),
        (0b1111_1111, 0b1111_1111, 1, Pixel::Three),
        (0b1010_1010, 0b0101_0101, 2, Pixel::Two),
        (0b1100_1100, 0b0011_0011, 3, Pixel::One),
        (0b1111_0000, 0b0000_1111, 4, Pixel::One),
        (0b0000_1111, 0b1111_0000, 5, Pixel::Two),
        (0b1100_0011, 0b0011_1100, 6, Pixel::One),
        (0b0011_1100, 0b0100_0011, 7, Pixel::Zero),
    ];
    for (byte1, byte2, index, expected) in data {
        let pixel = pixel_from_line(byte1, byte2, index);
        assert_eq!(pixel, expected);
    }
}

#[test]
fn test_apply_palette() {
    let bgp = 0b11_10_01_00;
    assert_eq!(apply_palette(bgp, 0), 0b00);
    assert_eq!(apply_palette(bgp, 1), 0b01);
    assert_eq!(apply_palette(bgp, 2), 0b10);
    assert_eq!(apply_palette(bgp, 3), 0b11);
}

#[test]
fn test_frame_dimensions() {
    let ppu = Ppu::new();
    assert_eq!(
        ppu.framebuffer().len(),
        usize::from(SCREEN_WIDTH) * usize::from(SCREEN_HEIGHT)
    );
}

#[test]
fn test_mode_cycles_through_a_scanline() {
    let mut ppu = Ppu::new();
    ppu.write_register(PPU_LCDC, 0x80); // LCD on, everything else off

    ppu.step(79);
    assert_eq!(ppu.read_register(PPU_STAT) & 0b11, PPUMode::OAMScan as u8);
    ppu.step(1);
    assert_eq!(
        ppu.read_register(PPU_STAT) & 0b11,
        PPUMode::PixelTransfer as u8
    );

    ppu.step(172);
    assert_eq!(ppu.read_register(PPU_STAT) & 0b11, PPUMode::HBlank as u8);

    ppu.step(204);
    assert_eq!(ppu.read_register(PPU_LY), 1);
    assert_eq!(ppu.read_register(PPU_STAT) & 0b11, PPUMode::OAMScan as u8);
}

#[test]
fn test_vblank_interrupt_fires_once_per_frame() {
    let mut ppu = Ppu::new();
    ppu.write_register(PPU_LCDC, 0x80);

    let mut raised = InterruptRegister::empty();
    for _ in 0..144 {
        for _ in 0..456 {
            if let Some(irq) = ppu.step(1) {
                raised |= irq;
            }
        }
    }
    assert!(raised.contains(InterruptRegister::VBLANK));
    assert_eq!(ppu.read_register(PPU_LY), 144);
}

#[test]
fn test_disabled_lcd_holds_ly_at_zero() {
    let mut ppu = Ppu::new();
    ppu.write_register(PPU_LCDC, 0x00);
    ppu.step(10_000);
    assert_eq!(ppu.read_register(PPU_LY), 0);
}

#[test]
fn test_bgp_register_round_trips() {
    let mut ppu = Ppu::new();
    ppu.write_register(PPU_BGP, 0b11_01_10_00);
    assert_eq!(ppu.read_register(PPU_BGP), 0b11_01_10_00);
}
