pub mod apu;
pub mod cartridge;
pub mod cpu;
pub mod display;
pub mod dma;
pub mod interrupt;
pub mod joypad;
pub mod memory;
pub mod ppu;
pub mod serial;
pub mod timer;

use crate::error::GBResult;
use crate::gb::cartridge::Cartridge;
use crate::gb::cpu::CPU;
use crate::gb::display::FramebufferSink;
use crate::gb::joypad::JoypadInput;
use crate::gb::memory::MemoryBus;
use std::path::Path;

/// Host frame rate the real hardware refreshes at; the driver throttles to this.
pub const DISPLAY_REFRESH_RATE: f64 = 59.73;

pub const SCREEN_WIDTH: u8 = 160;
pub const SCREEN_HEIGHT: u8 = 144;
pub const VERTICAL_BLANK_SCAN_LINE_MAX: u8 = 153;

/// Master clock speed in Hz. One CPU cycle is one dot on DMG.
pub const CPU_CLOCK_SPEED: u32 = 4 * 1024 * 1024;

/// One frame is a fixed dot quantum: 456 dots/line * 154 lines.
pub const DOTS_PER_FRAME: u32 = 456 * 154;

/// Common interface every memory-mapped peripheral the bus dispatches to
/// implements. The bus itself also implements this trait so the CPU can be
/// generic over it.
pub trait AddressSpace {
    fn write(&mut self, address: u16, value: u8);
    fn read(&self, address: u16) -> u8;
}

/// Top-level wiring of CPU + bus (§9 "arena"). Every other component is
/// owned, directly or transitively, by `MemoryBus`; the CPU only ever sees
/// it through the `AddressSpace` trait.
pub struct Emulator {
    pub cpu: CPU,
    pub bus: MemoryBus,
}

impl Emulator {
    pub fn new(cartridge: Cartridge) -> Self {
        Self {
            cpu: CPU::new(),
            bus: MemoryBus::new(cartridge),
        }
    }

    pub fn from_path(path: &Path) -> GBResult<Self> {
        Ok(Self::new(Cartridge::try_from(path)?))
    }

    /// Resets CPU and bus state to their post-boot-ROM defaults while
    /// keeping the currently loaded cartridge (§4.5).
    pub fn reset(&mut self) {
        self.cpu = CPU::new();
        self.bus.reset();
    }

    /// Executes exactly one CPU instruction (or interrupt dispatch / HALT
    /// tick) and propagates the spent cycles into every other component in
    /// the fixed order described in §5: PPU, timer, APU, DMA.
    pub fn run_one_instruction(&mut self) -> GBResult<u16> {
        let cycles = self.cpu.step(&mut self.bus)?;
        self.bus.step(cycles);
        Ok(cycles)
    }

    /// Runs until at least `dots` master-clock dots have been consumed,
    /// i.e. the driver's fixed per-frame quantum (§2).
    pub fn run_cycles(&mut self, dots: u32) -> GBResult<()> {
        let mut spent = 0u32;
        while spent < dots {
            spent += u32::from(self.run_one_instruction()?);
        }
        Ok(())
    }

    pub fn run_frame(&mut self) -> GBResult<()> {
        self.run_cycles(DOTS_PER_FRAME)
    }

    pub fn set_joypad_input(&mut self, input: JoypadInput) {
        self.bus.set_joypad_input(input);
    }

    pub fn framebuffer(&self) -> &[u8] {
        self.bus.ppu.framebuffer()
    }

    pub fn drain_samples(&mut self) -> Vec<(f32, f32)> {
        self.bus.apu.drain_samples()
    }

    pub fn render_into<S: FramebufferSink>(&self, sink: &mut S) {
        sink.present(self.bus.ppu.framebuffer());
    }
}
