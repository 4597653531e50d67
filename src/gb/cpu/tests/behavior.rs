use crate::gb::cpu::tests::assert_flags;
use crate::gb::cpu::CPU;
use crate::gb::interrupt::InterruptRegister;
use crate::gb::memory::constants::{INTERRUPT_ENABLE, INTERRUPT_FLAG};
use crate::gb::AddressSpace;

/// Flat 64KiB address space backing opcode-level CPU tests.
struct MockBus {
    memory: [u8; 0x10000],
}

impl MockBus {
    fn new(program: Vec<u8>) -> Self {
        let mut memory = [0u8; 0x10000];
        memory[..program.len()].copy_from_slice(&program);
        Self { memory }
    }

    fn set_ie(&mut self, value: InterruptRegister) {
        self.write(INTERRUPT_ENABLE, value.bits());
    }

    fn set_if(&mut self, value: InterruptRegister) {
        self.write(INTERRUPT_FLAG, value.bits());
    }

    fn get_if(&self) -> InterruptRegister {
        InterruptRegister::from_bits_truncate(self.read(INTERRUPT_FLAG))
    }
}

impl AddressSpace for MockBus {
    fn write(&mut self, address: u16, value: u8) {
        self.memory[address as usize] = value;
    }

    fn read(&self, address: u16) -> u8 {
        self.memory[address as usize]
    }
}

#[test]
fn test_add_a_hli_no_overflow() {
    let mut cpu = CPU { pc: 0, ..Default::default() };
    let mut bus = MockBus::new(vec![0x86, 0x42]);
    cpu.r.a = 0x10;
    cpu.r.set_hl(1);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.a, 0x52);
    assert_eq!(cpu.pc, 1);
    assert_flags(cpu.r.f, false, false, false, false);
}

#[test]
fn test_add_a_hli_overflow_zero() {
    let mut cpu = CPU { pc: 0, ..Default::default() };
    let mut bus = MockBus::new(vec![0x86, 0xFF]);
    cpu.r.a = 1;
    cpu.r.set_hl(1);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.a, 0);
    assert_flags(cpu.r.f, true, false, true, true);
}

#[test]
fn test_sub_a_b_underflow() {
    let mut cpu = CPU { pc: 0, ..Default::default() };
    let mut bus = MockBus::new(vec![0x90]); // SUB B
    cpu.r.a = 0x00;
    cpu.r.b = 0x01;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.a, 0xFF);
    assert_flags(cpu.r.f, false, true, true, true);
}

#[test]
fn test_xor_a_a_always_zero() {
    let mut cpu = CPU { pc: 0, ..Default::default() };
    let mut bus = MockBus::new(vec![0xAF]); // XOR A
    cpu.r.a = 0x42;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.a, 0);
    assert_flags(cpu.r.f, true, false, false, false);
}

#[test]
fn test_inc_b_sets_half_carry_on_nibble_rollover() {
    let mut cpu = CPU { pc: 0, ..Default::default() };
    let mut bus = MockBus::new(vec![0x04]); // INC B
    cpu.r.b = 0x0F;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.b, 0x10);
    assert_flags(cpu.r.f, false, false, true, false);
}

#[test]
fn test_bit_7_h_is_zero_when_set() {
    let mut cpu = CPU { pc: 0, ..Default::default() };
    let mut bus = MockBus::new(vec![0xCB, 0x7C]); // BIT 7, H
    cpu.r.h = 0x80;
    cpu.step(&mut bus).unwrap();
    assert_flags(cpu.r.f, false, false, true, false);
}

#[test]
fn test_jr_nz_taken() {
    let mut cpu = CPU { pc: 0, ..Default::default() };
    let mut bus = MockBus::new(vec![0x20, 0x05]); // JR NZ, +5
    cpu.r.f.set(crate::gb::cpu::registers::FlagsRegister::ZERO, false);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.pc, 7);
}

#[test]
fn test_call_and_ret_round_trip() {
    let mut cpu = CPU { pc: 0, sp: 0x10, ..Default::default() };
    let mut bus = MockBus::new(vec![0xCD, 0x05, 0x00, 0x00, 0x00, 0xC9]); // CALL 0x0005; ...; RET
    cpu.step(&mut bus).unwrap(); // CALL
    assert_eq!(cpu.pc, 5);
    assert_eq!(cpu.sp, 0x0E);
    cpu.step(&mut bus).unwrap(); // RET
    assert_eq!(cpu.pc, 3);
    assert_eq!(cpu.sp, 0x10);
}

#[test]
fn test_push_pop_round_trip() {
    let mut cpu = CPU { pc: 0, sp: 0x10, ..Default::default() };
    let mut bus = MockBus::new(vec![0xC5, 0xD1]); // PUSH BC; POP DE
    cpu.r.set_bc(0x1234);
    cpu.step(&mut bus).unwrap();
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.get_de(), 0x1234);
    assert_eq!(cpu.sp, 0x10);
}

#[test]
fn test_illegal_opcode_is_an_error() {
    let mut cpu = CPU { pc: 0, ..Default::default() };
    let mut bus = MockBus::new(vec![0xD3]); // unofficial/illegal
    assert!(cpu.step(&mut bus).is_err());
}

#[test]
fn test_interrupt_dispatch_when_ime_enabled() {
    let mut cpu = CPU { pc: 0x1234, sp: 0x10, ime: true, ..Default::default() };
    let mut bus = MockBus::new(vec![0x00; 0x100]);
    bus.set_ie(InterruptRegister::VBLANK);
    bus.set_if(InterruptRegister::VBLANK);

    cpu.step(&mut bus).unwrap();

    assert_eq!(cpu.pc, 0x0040);
    assert!(!cpu.ime, "IME should be cleared on dispatch");
    assert_eq!(bus.get_if(), InterruptRegister::empty());
    assert_eq!(cpu.sp, 0x0E);
    assert_eq!(bus.read(0x0E), 0x34);
    assert_eq!(bus.read(0x0F), 0x12);
}

#[test]
fn test_interrupt_does_not_dispatch_when_ime_disabled() {
    let mut cpu = CPU { pc: 0x1234, ime: false, ..Default::default() };
    let mut bus = MockBus::new(vec![0x00; 0x10]); // NOP stream
    bus.set_ie(InterruptRegister::VBLANK);
    bus.set_if(InterruptRegister::VBLANK);

    cpu.step(&mut bus).unwrap();

    assert_eq!(cpu.pc, 0x1235, "with IME clear, a plain NOP should just execute");
}

#[test]
fn test_halt_wakes_on_pending_interrupt_without_ime() {
    let mut cpu = CPU { pc: 0, ime: false, is_halted: true, ..Default::default() };
    let mut bus = MockBus::new(vec![0x00]);
    bus.set_ie(InterruptRegister::VBLANK);
    bus.set_if(InterruptRegister::VBLANK);

    cpu.step(&mut bus).unwrap();

    assert!(!cpu.is_halted, "CPU should always wake up from HALT if an interrupt is pending");
}

#[test]
fn test_ei_takes_effect_one_instruction_later() {
    let mut cpu = CPU { pc: 0, ime: false, ..Default::default() };
    let mut bus = MockBus::new(vec![0xFB, 0x00, 0x00]); // EI; NOP; NOP
    bus.set_ie(InterruptRegister::VBLANK);
    bus.set_if(InterruptRegister::VBLANK);

    cpu.step(&mut bus).unwrap(); // EI itself: schedules the flip
    assert!(!cpu.ime);

    cpu.step(&mut bus).unwrap(); // instruction right after EI still runs with IME false
    assert!(!cpu.ime, "IME must stay false for the instruction right after EI");
    assert_eq!(cpu.pc, 2, "the pending interrupt should not have been dispatched yet");

    cpu.step(&mut bus).unwrap(); // IME flips true here, and this step's own dispatch sees it
    assert_eq!(cpu.pc, 0x0040, "the pending interrupt should now dispatch");
    assert!(!cpu.ime, "dispatch itself clears IME again");
}

#[test]
fn test_halt_bug_reexecutes_following_byte() {
    let mut cpu = CPU { pc: 0, ime: false, is_halted: false, ..Default::default() };
    // HALT; INC B; INC B
    let mut bus = MockBus::new(vec![0x76, 0x04, 0x04]);
    bus.set_ie(InterruptRegister::VBLANK);
    bus.set_if(InterruptRegister::VBLANK);

    cpu.step(&mut bus).unwrap(); // HALT triggers the halt bug, PC -> 1
    assert_eq!(cpu.pc, 1);

    cpu.step(&mut bus).unwrap(); // first INC B, then PC rolls back to 1
    assert_eq!(cpu.r.b, 1);
    assert_eq!(cpu.pc, 1);

    cpu.step(&mut bus).unwrap(); // INC B runs again from the same byte
    assert_eq!(cpu.r.b, 2);
    assert_eq!(cpu.pc, 2);
}
