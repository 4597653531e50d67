pub mod constants;

use crate::gb::apu::Apu;
use crate::gb::cartridge::Cartridge;
use crate::gb::dma::Dma;
use crate::gb::interrupt::InterruptRegister;
use crate::gb::joypad::{Button, Joypad, JoypadInput};
use crate::gb::memory::constants::*;
use crate::gb::ppu::Ppu;
use crate::gb::serial::Serial;
use crate::gb::timer::Timer;
use crate::gb::AddressSpace;

/// The arena (§9): every component besides the CPU and cartridge variant is
/// owned here directly, so the bus can dispatch to them without reference
/// cycles. The CPU only ever touches this through `AddressSpace`.
pub struct MemoryBus {
    cartridge: Cartridge,
    pub ppu: Ppu,
    pub apu: Apu,
    pub timer: Timer,
    pub joypad: Joypad,
    pub serial: Serial,
    pub dma: Dma,

    pub interrupt_enable: InterruptRegister,
    pub interrupt_flag: InterruptRegister,

    wram: [u8; WRAM_SIZE],
    io: [u8; IO_SIZE],
    hram: [u8; HRAM_SIZE],
}

impl MemoryBus {
    pub fn new(cartridge: Cartridge) -> Self {
        Self {
            cartridge,
            ppu: Ppu::new(),
            apu: Apu::new(),
            timer: Timer::new(),
            joypad: Joypad::default(),
            serial: Serial::default(),
            dma: Dma::default(),
            interrupt_enable: InterruptRegister::empty(),
            interrupt_flag: InterruptRegister::empty(),
            wram: [0u8; WRAM_SIZE],
            io: [0u8; IO_SIZE],
            hram: [0u8; HRAM_SIZE],
        }
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    /// Zeros work RAM, high RAM, I/O, IE, and DMA state, leaving the
    /// cartridge (and any battery-backed RAM) untouched (§4.5).
    pub fn reset(&mut self) {
        self.wram = [0u8; WRAM_SIZE];
        self.io = [0u8; IO_SIZE];
        self.hram = [0u8; HRAM_SIZE];
        self.interrupt_enable = InterruptRegister::empty();
        self.interrupt_flag = InterruptRegister::empty();
        self.dma = Dma::default();
        self.ppu = Ppu::new();
        self.apu = Apu::new();
        self.timer = Timer::new();
        self.joypad = Joypad::default();
        self.serial = Serial::default();
    }

    /// Requests an interrupt by OR-ing the given bit into IF. This is the
    /// single entry point every component signals through (§4.2, §9).
    pub fn irq(&mut self, bit: InterruptRegister) {
        self.interrupt_flag.insert(bit);
    }

    #[inline]
    pub fn has_pending_interrupt(&self) -> bool {
        !(self.interrupt_enable & self.interrupt_flag).is_empty()
    }

    pub fn set_joypad_input(&mut self, input: JoypadInput) {
        if self.joypad.handle_input(input) {
            self.irq(InterruptRegister::JOYPAD);
        }
    }

    pub fn press_button(&mut self, button: Button, pressed: bool) {
        if self.joypad.set_button(button, pressed) {
            self.irq(InterruptRegister::JOYPAD);
        }
    }

    /// Advances every other component by `cycles` CPU cycles, in the fixed
    /// order mandated by §5: PPU, timer, APU, DMA.
    pub fn step(&mut self, cycles: u16) {
        if let Some(irq) = self.ppu.step(cycles) {
            self.irq(irq);
        }
        if self.timer.step(cycles) {
            self.irq(InterruptRegister::TIMER);
        }
        self.apu.step(cycles);
        self.step_dma(cycles);
    }

    fn step_dma(&mut self, cycles: u16) {
        if !self.dma.is_active() {
            return;
        }
        let source = self.dma.source();
        for offset in self.dma.step(cycles) {
            let byte = self.read_bypass(source + offset);
            self.ppu.write_oam_raw(offset, byte);
        }
    }

    /// Reads bypassing DMA gating and PPU mode gating, used by the DMA
    /// engine itself which can source from ROM, VRAM, external RAM, or
    /// work RAM regardless of PPU mode (§4.5).
    fn read_bypass(&self, address: u16) -> u8 {
        match address {
            ROM_BANK_0_BEGIN..=ROM_BANK_N_END => self.cartridge.read(address),
            VRAM_BEGIN..=VRAM_END => self.ppu.read_vram_raw(address),
            CRAM_BEGIN..=CRAM_END => self.cartridge.read(address),
            WRAM_BEGIN..=WRAM_END => self.wram[(address - WRAM_BEGIN) as usize],
            ECHO_BEGIN..=ECHO_END => self.wram[(address - ECHO_OFFSET - WRAM_BEGIN) as usize],
            _ => 0xFF,
        }
    }

    fn write_io(&mut self, address: u16, value: u8) {
        match address {
            JOYPAD => self.joypad.write_select(value),
            SERIAL_DATA => self.serial.write_data(value),
            SERIAL_CTRL => self.serial.write_ctrl(value),
            TIMER_DIV => {
                if self.timer.write_div() {
                    self.irq(InterruptRegister::TIMER);
                }
            }
            TIMER_TIMA => self.timer.write_tima(value),
            TIMER_TMA => self.timer.write_tma(value),
            TIMER_TAC => {
                if self.timer.write_tac(value) {
                    self.irq(InterruptRegister::TIMER);
                }
            }
            INTERRUPT_FLAG => {
                self.interrupt_flag = InterruptRegister::from_bits_truncate(value)
            }
            PPU_DMA => self.dma.start(value),
            PPU_LCDC..=PPU_WX => self.ppu.write_register(address, value),
            APU_BEGIN..=APU_END => self.apu.write(address, value),
            _ => self.io[(address - IO_BEGIN) as usize] = value,
        }
    }

    fn read_io(&self, address: u16) -> u8 {
        match address {
            JOYPAD => self.joypad.read(),
            SERIAL_DATA => self.serial.read_data(),
            SERIAL_CTRL => self.serial.read_ctrl(),
            TIMER_DIV => self.timer.div(),
            TIMER_TIMA => self.timer.tima(),
            TIMER_TMA => self.timer.tma(),
            TIMER_TAC => self.timer.tac(),
            INTERRUPT_FLAG => self.interrupt_flag.bits() | 0xE0,
            PPU_DMA => 0xFF,
            PPU_LCDC..=PPU_WX => self.ppu.read_register(address),
            APU_BEGIN..=APU_END => self.apu.read(address),
            _ => self.io[(address - IO_BEGIN) as usize],
        }
    }
}

impl AddressSpace for MemoryBus {
    fn write(&mut self, address: u16, value: u8) {
        if self.dma.is_active() && !(HRAM_BEGIN..=HRAM_END).contains(&address) {
            // CPU writes outside HRAM are ignored while DMA owns the bus.
            return;
        }
        match address {
            ROM_BANK_0_BEGIN..=ROM_BANK_N_END => self.cartridge.write(address, value),
            VRAM_BEGIN..=VRAM_END => self.ppu.write_vram(address, value),
            CRAM_BEGIN..=CRAM_END => self.cartridge.write(address, value),
            WRAM_BEGIN..=WRAM_END => self.wram[(address - WRAM_BEGIN) as usize] = value,
            ECHO_BEGIN..=ECHO_END => {
                self.wram[(address - ECHO_OFFSET - WRAM_BEGIN) as usize] = value
            }
            OAM_BEGIN..=OAM_END => self.ppu.write_oam(address, value),
            UNUSABLE_BEGIN..=UNUSABLE_END => {}
            IO_BEGIN..=IO_END => self.write_io(address, value),
            HRAM_BEGIN..=HRAM_END => self.hram[(address - HRAM_BEGIN) as usize] = value,
            INTERRUPT_ENABLE => {
                self.interrupt_enable = InterruptRegister::from_bits_truncate(value)
            }
        }
    }

    fn read(&self, address: u16) -> u8 {
        if self.dma.is_active() && !(HRAM_BEGIN..=HRAM_END).contains(&address) {
            return 0xFF;
        }
        match address {
            ROM_BANK_0_BEGIN..=ROM_BANK_N_END => self.cartridge.read(address),
            VRAM_BEGIN..=VRAM_END => self.ppu.read_vram(address),
            CRAM_BEGIN..=CRAM_END => self.cartridge.read(address),
            WRAM_BEGIN..=WRAM_END => self.wram[(address - WRAM_BEGIN) as usize],
            ECHO_BEGIN..=ECHO_END => self.wram[(address - ECHO_OFFSET - WRAM_BEGIN) as usize],
            OAM_BEGIN..=OAM_END => self.ppu.read_oam(address),
            UNUSABLE_BEGIN..=UNUSABLE_END => 0xFF,
            IO_BEGIN..=IO_END => self.read_io(address),
            HRAM_BEGIN..=HRAM_END => self.hram[(address - HRAM_BEGIN) as usize],
            INTERRUPT_ENABLE => self.interrupt_enable.bits(),
        }
    }
}
