use crate::error::{GBError, GBResult};
use crate::gb::cpu::instruction::Instruction;
use crate::gb::cpu::misc::{
    ByteSource, ByteTarget, IndirectByteRef, JumpCondition, JumpTarget, Load, PairedRegister,
    ResetCode, WordSource, WordTarget,
};
use crate::gb::interrupt::{self, InterruptRegister};
use crate::gb::memory::constants::{INTERRUPT_ENABLE, INTERRUPT_FLAG};
use crate::gb::AddressSpace;
use crate::utils;
use registers::Registers;

mod instruction;
pub mod misc;
pub mod registers;
#[cfg(test)]
mod tests;

/// Number of clock cycles per CPU cycle (one CPU "cycle" is one M-cycle, 4 dots).
pub const CLOCKS_PER_CYCLE: u16 = 4;

/// Tracks how many dots the current `step()` call has spent. Reset at the
/// start of every step and read back once at the end.
#[derive(Default)]
struct Clock {
    cycles: u16,
}

impl Clock {
    fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        self.cycles = 0;
    }

    fn advance(&mut self, n: u16) {
        self.cycles += n;
    }

    fn ticks(&self) -> u16 {
        self.cycles
    }
}

/// Implements the CPU for the GB (DMG-01), an LR35902 (a subset of i8080 & Z80).
pub struct CPU {
    pub r: Registers, // CPU registers
    pub pc: u16,      // Program counter
    pub sp: u16,      // Stack Pointer
    pub ime: bool,    // Interrupt Master Enable
    pub is_halted: bool,
    /// Set by STOP; cleared on the next step that observes a pending
    /// interrupt, mirroring how a held button wakes real hardware.
    pub is_stopped: bool,

    /// Set when HALT executes with IME clear and an interrupt already
    /// pending: the byte after HALT is fetched and executed, but PC fails
    /// to advance once, so the same byte runs twice.
    halt_bug: bool,
    /// EI takes effect one instruction after itself: `Some(1)` on the
    /// instruction right after EI, `Some(0)` the step IME actually flips.
    ime_enable_delay: Option<u8>,

    clock: Clock,
}

impl Default for CPU {
    fn default() -> Self {
        Self::new()
    }
}

impl CPU {
    pub fn new() -> Self {
        Self {
            r: Registers::default(),
            pc: 0x0100,
            sp: 0xFFFE,
            ime: false,
            is_halted: false,
            is_stopped: false,
            halt_bug: false,
            ime_enable_delay: None,
            clock: Clock::new(),
        }
    }

    fn poll_interrupts<T: AddressSpace>(bus: &T) -> (InterruptRegister, InterruptRegister) {
        let ie = InterruptRegister::from_bits_truncate(bus.read(INTERRUPT_ENABLE));
        let iflag = InterruptRegister::from_bits_truncate(bus.read(INTERRUPT_FLAG));
        (ie, iflag)
    }

    fn service_ime_delay(&mut self) {
        match self.ime_enable_delay {
            Some(0) => {
                self.ime = true;
                self.ime_enable_delay = None;
            }
            Some(n) => self.ime_enable_delay = Some(n - 1),
            None => {}
        }
    }

    fn dispatch_interrupt<T: AddressSpace>(
        &mut self,
        dispatch: interrupt::Dispatch,
        iflag: InterruptRegister,
        bus: &mut T,
    ) -> u16 {
        self.ime = false;
        bus.write(INTERRUPT_FLAG, iflag.difference(dispatch.bit).bits());
        self.clock.advance(CLOCKS_PER_CYCLE * 5);
        self.push(self.pc, bus);
        self.pc = dispatch.vector;
        self.clock.ticks()
    }

    /// Makes one CPU step: services the delayed-EI countdown, wakes from
    /// HALT or dispatches a pending interrupt, then fetches and executes
    /// exactly one instruction.
    pub fn step<T: AddressSpace>(&mut self, bus: &mut T) -> GBResult<u16> {
        self.clock.reset();
        self.service_ime_delay();

        let (ie, iflag) = Self::poll_interrupts(bus);

        if self.is_stopped {
            if interrupt::has_pending(ie, iflag) {
                self.is_stopped = false;
            } else {
                self.clock.advance(CLOCKS_PER_CYCLE);
                return Ok(self.clock.ticks());
            }
        }

        if self.is_halted {
            if interrupt::has_pending(ie, iflag) {
                self.is_halted = false;
            } else {
                self.clock.advance(CLOCKS_PER_CYCLE);
                return Ok(self.clock.ticks());
            }
        }

        if self.ime {
            if let Some(dispatch) = interrupt::pending(ie, iflag) {
                return Ok(self.dispatch_interrupt(dispatch, iflag, bus));
            }
        }

        let apply_halt_bug = self.halt_bug;
        self.halt_bug = false;

        let pc_before = self.pc;
        let (instruction, next_pc) = Instruction::new(self.pc, bus);
        let instruction = match instruction {
            Some(instruction) => instruction,
            None => {
                let opcode = bus.read(self.pc);
                return Err(GBError::IllegalInstruction {
                    opcode,
                    pc: self.pc,
                });
            }
        };

        self.pc = self.execute(instruction, bus, next_pc);

        if apply_halt_bug {
            self.pc = pc_before;
        }

        Ok(self.clock.ticks())
    }

    /// Executes the given instruction, advances the internal clock and
    /// returns the CPU's next program counter. `next_pc` is the address
    /// right after the instruction's own bytes, as already computed by the
    /// decoder; straight-line instructions return it unchanged.
    fn execute<T: AddressSpace>(&mut self, instruction: Instruction, bus: &mut T, next_pc: u16) -> u16 {
        use Instruction::*;
        match instruction {
            ADD(source) => self.handle_add(source, bus, next_pc),
            ADDHL(source) => self.handle_add_hl(source, next_pc),
            ADDSP(value) => self.handle_add_sp(value, next_pc),
            ADC(source) => self.handle_adc(source, bus, next_pc),
            AND(source) => self.handle_and(source, bus, next_pc),
            BIT(bit, target) => self.handle_bit(bit, target, bus, next_pc),
            CALL(test, address) => self.handle_call(test, address, bus, next_pc),
            CCF => self.handle_ccf(next_pc),
            CP(source) => self.handle_cp(source, bus, next_pc),
            CPL => self.handle_cpl(next_pc),
            DAA => self.handle_daa(next_pc),
            DI => self.handle_di(next_pc),
            DEC(target) => self.handle_dec_byte(target, bus, next_pc),
            DEC2(target) => self.handle_dec_word(target, next_pc),
            EI => self.handle_ei(next_pc),
            HALT => self.handle_halt(bus, next_pc),
            INC(target) => self.handle_inc_byte(target, bus, next_pc),
            INC2(target) => self.handle_inc_word(target, next_pc),
            JR(test, offset) => self.handle_jr(test, offset, next_pc),
            JP(test, target) => self.handle_jp(test, target, next_pc),
            LD(load_type) => self.handle_ld(load_type, bus, next_pc),
            NOP => self.handle_nop(next_pc),
            OR(source) => self.handle_or(source, bus, next_pc),
            RES(bit, target) => self.handle_res(bit, target, bus, next_pc),
            RET(test) => self.handle_ret(test, bus, next_pc),
            RETI => self.handle_reti(bus),
            RL(target) => self.handle_rl(target, bus, next_pc),
            RLA => self.handle_rla(next_pc),
            RLC(target) => self.handle_rlc(target, bus, next_pc),
            RLCA => self.handle_rlca(next_pc),
            RR(target) => self.handle_rr(target, bus, next_pc),
            RRA => self.handle_rra(next_pc),
            RRC(target) => self.handle_rrc(target, bus, next_pc),
            RRCA => self.handle_rrca(next_pc),
            RST(code) => self.handle_rst(code, bus, next_pc),
            SBC(source) => self.handle_sbc(source, bus, next_pc),
            SCF => self.handle_scf(next_pc),
            SET(bit, target) => self.handle_set(bit, target, bus, next_pc),
            SLA(target) => self.handle_sla(target, bus, next_pc),
            SRA(target) => self.handle_sra(target, bus, next_pc),
            SRL(target) => self.handle_srl(target, bus, next_pc),
            STOP => self.handle_stop(next_pc),
            SUB(source) => self.handle_sub(source, bus, next_pc),
            SWAP(target) => self.handle_swap(target, bus, next_pc),
            PUSH(target) => self.handle_push(target, bus, next_pc),
            POP(target) => self.handle_pop(target, bus, next_pc),
            XOR(source) => self.handle_xor(source, bus, next_pc),
        }
    }

    /// Push a u16 value onto the stack
    fn push<T: AddressSpace>(&mut self, value: u16, bus: &mut T) {
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, (value >> 8) as u8);
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, value as u8);
    }

    /// Pop a u16 value from the stack
    fn pop<T: AddressSpace>(&mut self, bus: &mut T) -> u16 {
        let lsb = bus.read(self.sp) as u16;
        self.sp = self.sp.wrapping_add(1);
        let msb = bus.read(self.sp) as u16;
        self.sp = self.sp.wrapping_add(1);
        (msb << 8) | lsb
    }

    fn handle_add<T: AddressSpace>(&mut self, source: ByteSource, bus: &mut T, next_pc: u16) -> u16 {
        let source_value = source.read(self, bus);
        let half_carry = (self.r.a & 0x0F) + (source_value & 0x0F) > 0x0F;
        let (new_value, did_overflow) = self.r.a.overflowing_add(source_value);
        self.r.f.update(new_value == 0, false, half_carry, did_overflow);
        self.r.a = new_value;
        self.clock.advance(self.byte_source_cycles(&source));
        next_pc
    }

    fn handle_add_hl(&mut self, source: WordSource, next_pc: u16) -> u16 {
        let value = source.read(self);
        let hl = self.r.get_hl();
        let (result, overflow) = hl.overflowing_add(value);
        let half_carry = (hl ^ value ^ result) & 0x1000 != 0;
        self.r.f.set(registers::FlagsRegister::SUBTRACTION, false);
        self.r.f.set(registers::FlagsRegister::HALF_CARRY, half_carry);
        self.r.f.set(registers::FlagsRegister::CARRY, overflow);
        self.r.set_hl(result);
        self.clock.advance(CLOCKS_PER_CYCLE * 2);
        next_pc
    }

    fn handle_add_sp(&mut self, value: i8, next_pc: u16) -> u16 {
        let sp = self.sp as i32;
        let byte = value as i32;
        let result = sp.wrapping_add(byte);
        let half_carry = (sp ^ byte ^ result) & 0x10 != 0;
        let carry = (sp ^ byte ^ result) & 0x100 != 0;
        self.sp = result as u16;
        self.r.f.update(false, false, half_carry, carry);
        self.clock.advance(CLOCKS_PER_CYCLE * 4);
        next_pc
    }

    fn handle_adc<T: AddressSpace>(&mut self, source: ByteSource, bus: &mut T, next_pc: u16) -> u16 {
        let value = source.read(self, bus);
        let carry_in = u8::from(self.r.f.contains(registers::FlagsRegister::CARRY));
        let half_carry = ((self.r.a & 0x0F) + (value & 0x0F) + carry_in) > 0x0F;

        let (result, overflow1) = self.r.a.overflowing_add(value);
        let (result, overflow2) = result.overflowing_add(carry_in);
        self.r.f.update(result == 0, false, half_carry, overflow1 || overflow2);
        self.r.a = result;
        self.clock.advance(self.byte_source_cycles(&source));
        next_pc
    }

    fn handle_and<T: AddressSpace>(&mut self, source: ByteSource, bus: &mut T, next_pc: u16) -> u16 {
        let value = source.read(self, bus);
        self.r.a &= value;
        self.r.f.update(self.r.a == 0, false, true, false);
        self.clock.advance(self.byte_source_cycles(&source));
        next_pc
    }

    fn handle_bit<T: AddressSpace>(&mut self, bit: u8, target: ByteTarget, bus: &mut T, next_pc: u16) -> u16 {
        let value = target.read(self, bus);
        self.r.f.set(registers::FlagsRegister::ZERO, !utils::bit_at(value, bit));
        self.r.f.set(registers::FlagsRegister::SUBTRACTION, false);
        self.r.f.set(registers::FlagsRegister::HALF_CARRY, true);
        self.clock.advance(self.byte_target_cycles(&target, 2, 3));
        next_pc
    }

    fn handle_call<T: AddressSpace>(&mut self, test: JumpCondition, address: u16, bus: &mut T, next_pc: u16) -> u16 {
        if test.resolve(self) {
            self.clock.advance(CLOCKS_PER_CYCLE * 6);
            self.push(next_pc, bus);
            address
        } else {
            self.clock.advance(CLOCKS_PER_CYCLE * 3);
            next_pc
        }
    }

    fn handle_ccf(&mut self, next_pc: u16) -> u16 {
        let carry = self.r.f.contains(registers::FlagsRegister::CARRY);
        self.r.f.set(registers::FlagsRegister::SUBTRACTION, false);
        self.r.f.set(registers::FlagsRegister::HALF_CARRY, false);
        self.r.f.set(registers::FlagsRegister::CARRY, !carry);
        self.clock.advance(CLOCKS_PER_CYCLE);
        next_pc
    }

    fn handle_cp<T: AddressSpace>(&mut self, source: ByteSource, bus: &mut T, next_pc: u16) -> u16 {
        let value = source.read(self, bus);
        let result = u32::from(self.r.a).wrapping_sub(u32::from(value));
        self.r.f.update(
            result as u8 == 0,
            true,
            (self.r.a ^ value ^ result as u8) & 0x10 != 0,
            result & 0x100 != 0,
        );
        self.clock.advance(self.byte_source_cycles(&source));
        next_pc
    }

    fn handle_cpl(&mut self, next_pc: u16) -> u16 {
        self.r.a = !self.r.a;
        self.r.f.set(registers::FlagsRegister::SUBTRACTION, true);
        self.r.f.set(registers::FlagsRegister::HALF_CARRY, true);
        self.clock.advance(CLOCKS_PER_CYCLE);
        next_pc
    }

    fn handle_daa(&mut self, next_pc: u16) -> u16 {
        use registers::FlagsRegister;
        let negative = self.r.f.contains(FlagsRegister::SUBTRACTION);
        let mut carry = self.r.f.contains(FlagsRegister::CARRY);
        let half_carry = self.r.f.contains(FlagsRegister::HALF_CARRY);

        if negative {
            if carry {
                self.r.a = self.r.a.wrapping_sub(0x60);
            }
            if half_carry {
                self.r.a = self.r.a.wrapping_sub(0x06);
            }
        } else {
            if carry || self.r.a > 0x99 {
                self.r.a = self.r.a.wrapping_add(0x60);
                carry = true;
            }
            if half_carry || (self.r.a & 0x0F) > 0x09 {
                self.r.a = self.r.a.wrapping_add(0x06);
            }
        }

        self.r.f.set(FlagsRegister::ZERO, self.r.a == 0);
        self.r.f.set(FlagsRegister::HALF_CARRY, false);
        self.r.f.set(FlagsRegister::CARRY, carry);

        self.clock.advance(CLOCKS_PER_CYCLE);
        next_pc
    }

    fn handle_dec_byte<T: AddressSpace>(&mut self, target: ByteTarget, bus: &mut T, next_pc: u16) -> u16 {
        let value = target.read(self, bus);
        let result = value.wrapping_sub(1);
        target.write(self, bus, result);
        self.r.f.set(registers::FlagsRegister::HALF_CARRY, value.trailing_zeros() >= 4);
        self.r.f.set(registers::FlagsRegister::ZERO, result == 0);
        self.r.f.set(registers::FlagsRegister::SUBTRACTION, true);
        self.clock.advance(self.byte_target_cycles(&target, 1, 3));
        next_pc
    }

    fn handle_dec_word(&mut self, target: PairedRegister, next_pc: u16) -> u16 {
        let value = target.read(self);
        target.write(self, value.wrapping_sub(1));
        self.clock.advance(CLOCKS_PER_CYCLE * 2);
        next_pc
    }

    /// Handles HALT. If IME is clear and an interrupt is already pending at
    /// the moment HALT executes, the halt bug triggers instead of a real
    /// halt: PC fails to advance once, so the next opcode runs twice.
    fn handle_halt<T: AddressSpace>(&mut self, bus: &T, next_pc: u16) -> u16 {
        let (ie, iflag) = Self::poll_interrupts(bus);
        if !self.ime && interrupt::has_pending(ie, iflag) {
            self.halt_bug = true;
        } else {
            self.is_halted = true;
        }
        self.clock.advance(CLOCKS_PER_CYCLE);
        next_pc
    }

    fn handle_inc_byte<T: AddressSpace>(&mut self, target: ByteTarget, bus: &mut T, next_pc: u16) -> u16 {
        let value = target.read(self, bus);
        let result = value.wrapping_add(1);
        target.write(self, bus, result);
        self.r.f.set(registers::FlagsRegister::HALF_CARRY, value & 0x0F == 0x0F);
        self.r.f.set(registers::FlagsRegister::ZERO, result == 0);
        self.r.f.set(registers::FlagsRegister::SUBTRACTION, false);
        self.clock.advance(self.byte_target_cycles(&target, 1, 3));
        next_pc
    }

    fn handle_inc_word(&mut self, target: PairedRegister, next_pc: u16) -> u16 {
        let value = target.read(self);
        target.write(self, value.wrapping_add(1));
        self.clock.advance(CLOCKS_PER_CYCLE * 2);
        next_pc
    }

    fn handle_di(&mut self, next_pc: u16) -> u16 {
        self.ime = false;
        self.ime_enable_delay = None;
        self.clock.advance(CLOCKS_PER_CYCLE);
        next_pc
    }

    fn handle_ei(&mut self, next_pc: u16) -> u16 {
        self.ime_enable_delay = Some(1);
        self.clock.advance(CLOCKS_PER_CYCLE);
        next_pc
    }

    fn handle_jr(&mut self, test: JumpCondition, offset: i8, next_pc: u16) -> u16 {
        if test.resolve(self) {
            self.clock.advance(CLOCKS_PER_CYCLE * 3);
            (next_pc as i16).wrapping_add(i16::from(offset)) as u16
        } else {
            self.clock.advance(CLOCKS_PER_CYCLE * 2);
            next_pc
        }
    }

    fn handle_jp(&mut self, test: JumpCondition, target: JumpTarget, next_pc: u16) -> u16 {
        if test.resolve(self) {
            let cycles = match target {
                JumpTarget::HL => CLOCKS_PER_CYCLE,
                JumpTarget::D16(_) => CLOCKS_PER_CYCLE * 4,
            };
            self.clock.advance(cycles);
            target.read(self)
        } else {
            self.clock.advance(CLOCKS_PER_CYCLE * 3);
            next_pc
        }
    }

    fn handle_ld<T: AddressSpace>(&mut self, load_type: Load, bus: &mut T, next_pc: u16) -> u16 {
        match load_type {
            Load::Byte(target, source) => {
                let value = source.read(self, bus);
                target.write(self, bus, value);
                self.clock.advance(self.byte_target_cycles(&target, 1, 2));
            }
            Load::Word(target, source) => {
                let value = source.read(self);
                target.write(self, bus, value);
                self.clock.advance(CLOCKS_PER_CYCLE * 3);
            }
            Load::IndirectFrom(target, source) => {
                let value = source.read(self, bus);
                bus.write(target.resolve(self), value);
                let extra = match target {
                    IndirectByteRef::D8I(_) => 1,
                    IndirectByteRef::D16I(_) => 2,
                    _ => 0,
                };
                self.clock.advance(CLOCKS_PER_CYCLE * (2 + extra));
            }
            Load::IndirectFromAInc(target) => {
                let addr = target.resolve(self);
                bus.write(addr, self.r.a);
                self.r.set_hl(addr.wrapping_add(1));
                self.clock.advance(CLOCKS_PER_CYCLE * 2);
            }
            Load::IndirectFromADec(target) => {
                let addr = target.resolve(self);
                bus.write(addr, self.r.a);
                self.r.set_hl(addr.wrapping_sub(1));
                self.clock.advance(CLOCKS_PER_CYCLE * 2);
            }
            Load::IndirectFromWord(target, source) => {
                let value = source.read(self);
                target.write(self, bus, value);
                self.clock.advance(CLOCKS_PER_CYCLE * 5);
            }
            Load::FromIndirectAInc(source) => {
                self.r.a = source.read(self, bus);
                self.r.set_hl(self.r.get_hl().wrapping_add(1));
                self.clock.advance(CLOCKS_PER_CYCLE * 2);
            }
            Load::FromIndirectADec(source) => {
                self.r.a = source.read(self, bus);
                self.r.set_hl(self.r.get_hl().wrapping_sub(1));
                self.clock.advance(CLOCKS_PER_CYCLE * 2);
            }
            Load::IndirectFromSPi8(target, offset) => {
                let sp = self.sp as i32;
                let n = i32::from(offset);
                let result = sp.wrapping_add(n);
                let carry = (sp ^ n ^ result) & 0x100 != 0;
                let half_carry = (sp ^ n ^ result) & 0x10 != 0;
                self.r.f.update(false, false, half_carry, carry);
                target.write(self, bus, result as u16);
                self.clock.advance(CLOCKS_PER_CYCLE * 3);
            }
        }
        next_pc
    }

    fn handle_nop(&mut self, next_pc: u16) -> u16 {
        self.clock.advance(CLOCKS_PER_CYCLE);
        next_pc
    }

    fn handle_or<T: AddressSpace>(&mut self, source: ByteSource, bus: &mut T, next_pc: u16) -> u16 {
        let value = source.read(self, bus);
        self.r.a |= value;
        self.r.f.update(self.r.a == 0, false, false, false);
        self.clock.advance(self.byte_source_cycles(&source));
        next_pc
    }

    fn handle_pop<T: AddressSpace>(&mut self, target: PairedRegister, bus: &mut T, next_pc: u16) -> u16 {
        let result = self.pop(bus);
        target.write(self, result);
        self.clock.advance(CLOCKS_PER_CYCLE * 3);
        next_pc
    }

    fn handle_push<T: AddressSpace>(&mut self, target: PairedRegister, bus: &mut T, next_pc: u16) -> u16 {
        let value = target.read(self);
        self.push(value, bus);
        self.clock.advance(CLOCKS_PER_CYCLE * 4);
        next_pc
    }

    fn handle_res<T: AddressSpace>(&mut self, bit: u8, target: ByteTarget, bus: &mut T, next_pc: u16) -> u16 {
        let value = target.read(self, bus);
        target.write(self, bus, utils::set_bit(value, bit, false));
        self.clock.advance(self.byte_target_cycles(&target, 2, 4));
        next_pc
    }

    fn handle_ret<T: AddressSpace>(&mut self, test: JumpCondition, bus: &mut T, next_pc: u16) -> u16 {
        let should_jump = test.resolve(self);
        let cycles = if test == JumpCondition::Always {
            CLOCKS_PER_CYCLE * 4
        } else if should_jump {
            CLOCKS_PER_CYCLE * 5
        } else {
            CLOCKS_PER_CYCLE * 2
        };
        self.clock.advance(cycles);
        if should_jump {
            self.pop(bus)
        } else {
            next_pc
        }
    }

    fn handle_reti<T: AddressSpace>(&mut self, bus: &mut T) -> u16 {
        self.clock.advance(CLOCKS_PER_CYCLE * 4);
        self.ime = true;
        self.ime_enable_delay = None;
        self.pop(bus)
    }

    fn handle_rl<T: AddressSpace>(&mut self, target: ByteTarget, bus: &mut T, next_pc: u16) -> u16 {
        let value = target.read(self, bus);
        let carry_in = u8::from(self.r.f.contains(registers::FlagsRegister::CARRY));
        let carry = value & 0x80 != 0;
        let result = (value << 1) | carry_in;
        self.r.f.update(result == 0, false, false, carry);
        target.write(self, bus, result);
        self.clock.advance(self.byte_target_cycles(&target, 2, 4));
        next_pc
    }

    fn handle_rla(&mut self, next_pc: u16) -> u16 {
        let carry_in = u8::from(self.r.f.contains(registers::FlagsRegister::CARRY));
        let new_carry = (self.r.a >> 7) != 0;
        self.r.a = (self.r.a << 1) | carry_in;
        self.r.f.update(false, false, false, new_carry);
        self.clock.advance(CLOCKS_PER_CYCLE);
        next_pc
    }

    fn handle_rlc<T: AddressSpace>(&mut self, target: ByteTarget, bus: &mut T, next_pc: u16) -> u16 {
        let value = target.read(self, bus);
        let carry = value & 0x80 != 0;
        let result = value.rotate_left(1);
        self.r.f.update(result == 0, false, false, carry);
        target.write(self, bus, result);
        self.clock.advance(self.byte_target_cycles(&target, 2, 4));
        next_pc
    }

    fn handle_rlca(&mut self, next_pc: u16) -> u16 {
        let carry = self.r.a & 0x80 != 0;
        self.r.a = self.r.a.rotate_left(1);
        self.r.f.update(false, false, false, carry);
        self.clock.advance(CLOCKS_PER_CYCLE);
        next_pc
    }

    fn handle_rr<T: AddressSpace>(&mut self, target: ByteTarget, bus: &mut T, next_pc: u16) -> u16 {
        let value = target.read(self, bus);
        let carry_in = u8::from(self.r.f.contains(registers::FlagsRegister::CARRY));
        let carry = value & 0x01 != 0;
        let result = (value >> 1) | (carry_in << 7);
        target.write(self, bus, result);
        self.r.f.update(result == 0, false, false, carry);
        self.clock.advance(self.byte_target_cycles(&target, 2, 4));
        next_pc
    }

    fn handle_rra(&mut self, next_pc: u16) -> u16 {
        let carry_in = u8::from(self.r.f.contains(registers::FlagsRegister::CARRY));
        let carry = self.r.a & 0x01 != 0;
        self.r.a = (self.r.a >> 1) | (carry_in << 7);
        self.r.f.update(false, false, false, carry);
        self.clock.advance(CLOCKS_PER_CYCLE);
        next_pc
    }

    fn handle_rrc<T: AddressSpace>(&mut self, target: ByteTarget, bus: &mut T, next_pc: u16) -> u16 {
        let value = target.read(self, bus);
        let carry = value & 0x01 != 0;
        let result = value.rotate_right(1);
        self.r.f.update(result == 0, false, false, carry);
        target.write(self, bus, result);
        self.clock.advance(self.byte_target_cycles(&target, 2, 4));
        next_pc
    }

    fn handle_rrca(&mut self, next_pc: u16) -> u16 {
        let carry = self.r.a & 0x01 != 0;
        self.r.a = self.r.a.rotate_right(1);
        self.r.f.update(false, false, false, carry);
        self.clock.advance(CLOCKS_PER_CYCLE);
        next_pc
    }

    fn handle_rst<T: AddressSpace>(&mut self, code: ResetCode, bus: &mut T, next_pc: u16) -> u16 {
        self.clock.advance(CLOCKS_PER_CYCLE * 4);
        self.push(next_pc, bus);
        code as u16
    }

    fn handle_sbc<T: AddressSpace>(&mut self, source: ByteSource, bus: &mut T, next_pc: u16) -> u16 {
        let a = self.r.a as u32;
        let value = source.read(self, bus) as u32;
        let carry_in = u32::from(self.r.f.contains(registers::FlagsRegister::CARRY));
        let result = a.wrapping_sub(value).wrapping_sub(carry_in);
        self.r.f.update(
            result as u8 == 0,
            true,
            (a ^ value ^ result) & 0x10 != 0,
            result & 0x100 != 0,
        );
        self.r.a = result as u8;
        self.clock.advance(self.byte_source_cycles(&source));
        next_pc
    }

    fn handle_scf(&mut self, next_pc: u16) -> u16 {
        self.r.f.set(registers::FlagsRegister::SUBTRACTION, false);
        self.r.f.set(registers::FlagsRegister::HALF_CARRY, false);
        self.r.f.set(registers::FlagsRegister::CARRY, true);
        self.clock.advance(CLOCKS_PER_CYCLE);
        next_pc
    }

    fn handle_set<T: AddressSpace>(&mut self, bit: u8, target: ByteTarget, bus: &mut T, next_pc: u16) -> u16 {
        let value = target.read(self, bus);
        target.write(self, bus, utils::set_bit(value, bit, true));
        self.clock.advance(self.byte_target_cycles(&target, 2, 4));
        next_pc
    }

    fn handle_sla<T: AddressSpace>(&mut self, target: ByteTarget, bus: &mut T, next_pc: u16) -> u16 {
        let value = target.read(self, bus);
        let carry = value & 0x80 != 0;
        let result = value << 1;
        self.r.f.update(result == 0, false, false, carry);
        target.write(self, bus, result);
        self.clock.advance(self.byte_target_cycles(&target, 2, 4));
        next_pc
    }

    fn handle_sra<T: AddressSpace>(&mut self, target: ByteTarget, bus: &mut T, next_pc: u16) -> u16 {
        let value = target.read(self, bus);
        let carry = value & 0x01 != 0;
        let result = (value >> 1) | (value & 0x80);
        self.r.f.update(result == 0, false, false, carry);
        target.write(self, bus, result);
        self.clock.advance(self.byte_target_cycles(&target, 2, 4));
        next_pc
    }

    fn handle_srl<T: AddressSpace>(&mut self, target: ByteTarget, bus: &mut T, next_pc: u16) -> u16 {
        let value = target.read(self, bus);
        let carry = value & 0x01 != 0;
        let result = value >> 1;
        target.write(self, bus, result);
        self.r.f.update(result == 0, false, false, carry);
        self.clock.advance(self.byte_target_cycles(&target, 2, 4));
        next_pc
    }

    fn handle_stop(&mut self, next_pc: u16) -> u16 {
        self.is_stopped = true;
        self.clock.advance(CLOCKS_PER_CYCLE);
        next_pc
    }

    fn handle_sub<T: AddressSpace>(&mut self, source: ByteSource, bus: &mut T, next_pc: u16) -> u16 {
        let a = u16::from(self.r.a);
        let value = u16::from(source.read(self, bus));
        let result = a.wrapping_sub(value);
        let carry_bits = a ^ value ^ result;
        self.r.f.update(
            result as u8 == 0,
            true,
            carry_bits & 0x10 != 0,
            carry_bits & 0x100 != 0,
        );
        self.r.a = result as u8;
        self.clock.advance(self.byte_source_cycles(&source));
        next_pc
    }

    fn handle_swap<T: AddressSpace>(&mut self, target: ByteTarget, bus: &mut T, next_pc: u16) -> u16 {
        let value = target.read(self, bus);
        self.r.f.update(value == 0, false, false, false);
        target.write(self, bus, value.rotate_right(4));
        self.clock.advance(self.byte_target_cycles(&target, 2, 4));
        next_pc
    }

    fn handle_xor<T: AddressSpace>(&mut self, source: ByteSource, bus: &mut T, next_pc: u16) -> u16 {
        let value = source.read(self, bus);
        self.r.a ^= value;
        self.r.f.update(self.r.a == 0, false, false, false);
        self.clock.advance(self.byte_source_cycles(&source));
        next_pc
    }

    fn byte_source_cycles(&self, source: &ByteSource) -> u16 {
        match source {
            ByteSource::D8(_) | ByteSource::HLI | ByteSource::BCI | ByteSource::DEI => {
                CLOCKS_PER_CYCLE * 2
            }
            ByteSource::D16I(_) | ByteSource::D8I(_) | ByteSource::CI => CLOCKS_PER_CYCLE * 3,
            ByteSource::R(_) => CLOCKS_PER_CYCLE,
        }
    }

    fn byte_target_cycles(&self, target: &ByteTarget, register_cycles: u16, indirect_cycles: u16) -> u16 {
        match target {
            ByteTarget::R(_) => CLOCKS_PER_CYCLE * register_cycles,
            ByteTarget::HLI => CLOCKS_PER_CYCLE * indirect_cycles,
        }
    }
}
