use crate::gb::cpu::registers::FlagsRegister;
use crate::gb::cpu::CPU;
use crate::gb::AddressSpace;
use std::fmt;
use std::fmt::Formatter;

/// A single 8-bit register.
#[derive(Copy, Clone, Debug)]
pub enum Register {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
}

impl Register {
    #[inline]
    pub fn read(&self, cpu: &CPU) -> u8 {
        match self {
            Register::A => cpu.r.a,
            Register::B => cpu.r.b,
            Register::C => cpu.r.c,
            Register::D => cpu.r.d,
            Register::E => cpu.r.e,
            Register::H => cpu.r.h,
            Register::L => cpu.r.l,
        }
    }

    #[inline]
    pub fn write(&self, cpu: &mut CPU, value: u8) {
        match self {
            Register::A => cpu.r.a = value,
            Register::B => cpu.r.b = value,
            Register::C => cpu.r.c = value,
            Register::D => cpu.r.d = value,
            Register::E => cpu.r.e = value,
            Register::H => cpu.r.h = value,
            Register::L => cpu.r.l = value,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ident = match self {
            Register::A => "A",
            Register::B => "B",
            Register::C => "C",
            Register::D => "D",
            Register::E => "E",
            Register::H => "H",
            Register::L => "L",
        };
        f.write_str(ident)
    }
}

/// A 16-bit register pair.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PairedRegister {
    AF,
    BC,
    DE,
    HL,
    SP,
}

impl PairedRegister {
    #[inline]
    pub fn read(&self, cpu: &CPU) -> u16 {
        match self {
            PairedRegister::AF => cpu.r.get_af(),
            PairedRegister::BC => cpu.r.get_bc(),
            PairedRegister::DE => cpu.r.get_de(),
            PairedRegister::HL => cpu.r.get_hl(),
            PairedRegister::SP => cpu.sp,
        }
    }

    #[inline]
    pub fn write(&self, cpu: &mut CPU, value: u16) {
        match self {
            PairedRegister::AF => cpu.r.set_af(value),
            PairedRegister::BC => cpu.r.set_bc(value),
            PairedRegister::DE => cpu.r.set_de(value),
            PairedRegister::HL => cpu.r.set_hl(value),
            PairedRegister::SP => cpu.sp = value,
        }
    }
}

impl fmt::Display for PairedRegister {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ident = match self {
            PairedRegister::AF => "AF",
            PairedRegister::BC => "BC",
            PairedRegister::DE => "DE",
            PairedRegister::HL => "HL",
            PairedRegister::SP => "SP",
        };
        f.write_str(ident)
    }
}

/// A location a byte can be written back to: a register or `(HL)`.
#[derive(Copy, Clone)]
pub enum ByteTarget {
    R(Register),
    HLI,
}

impl ByteTarget {
    #[inline]
    pub fn read<T: AddressSpace>(&self, cpu: &CPU, bus: &T) -> u8 {
        match self {
            ByteTarget::R(reg) => reg.read(cpu),
            ByteTarget::HLI => bus.read(cpu.r.get_hl()),
        }
    }

    #[inline]
    pub fn write<T: AddressSpace>(&self, cpu: &mut CPU, bus: &mut T, value: u8) {
        match self {
            ByteTarget::R(reg) => reg.write(cpu, value),
            ByteTarget::HLI => bus.write(cpu.r.get_hl(), value),
        }
    }
}

impl fmt::Display for ByteTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ByteTarget::R(reg) => write!(f, "{reg}"),
            ByteTarget::HLI => write!(f, "(HL)"),
        }
    }
}

/// An address computed for an indirect `LD` of the form `(xx), A` / `A, (xx)`.
#[derive(Copy, Clone)]
pub enum IndirectByteRef {
    BCI,
    DEI,
    HLI,
    D8I(u8),
    D16I(u16),
    CI,
}

impl IndirectByteRef {
    #[inline]
    pub fn resolve(&self, cpu: &CPU) -> u16 {
        match self {
            IndirectByteRef::BCI => cpu.r.get_bc(),
            IndirectByteRef::DEI => cpu.r.get_de(),
            IndirectByteRef::HLI => cpu.r.get_hl(),
            IndirectByteRef::D8I(offset) => u16::from(*offset) | 0xFF00,
            IndirectByteRef::D16I(address) => *address,
            IndirectByteRef::CI => u16::from(cpu.r.c) | 0xFF00,
        }
    }
}

impl fmt::Display for IndirectByteRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            IndirectByteRef::BCI => write!(f, "(BC)"),
            IndirectByteRef::DEI => write!(f, "(DE)"),
            IndirectByteRef::HLI => write!(f, "(HL)"),
            IndirectByteRef::D8I(offset) => write!(f, "({:#06x})", u16::from(*offset) | 0xFF00),
            IndirectByteRef::D16I(address) => write!(f, "({address:#06x})"),
            IndirectByteRef::CI => write!(f, "(C)"),
        }
    }
}

/// A source we can read a byte from.
#[derive(Copy, Clone)]
pub enum ByteSource {
    R(Register),
    D8(u8),
    HLI,
    BCI,
    DEI,
    D16I(u16),
    D8I(u8),
    CI,
}

impl ByteSource {
    #[inline]
    pub fn read<T: AddressSpace>(&self, cpu: &CPU, bus: &T) -> u8 {
        match self {
            ByteSource::R(reg) => reg.read(cpu),
            ByteSource::D8(value) => *value,
            ByteSource::HLI => bus.read(cpu.r.get_hl()),
            ByteSource::BCI => bus.read(cpu.r.get_bc()),
            ByteSource::DEI => bus.read(cpu.r.get_de()),
            ByteSource::D16I(address) => bus.read(*address),
            ByteSource::D8I(offset) => bus.read(u16::from(*offset) | 0xFF00),
            ByteSource::CI => bus.read(u16::from(cpu.r.c) | 0xFF00),
        }
    }
}

impl fmt::Display for ByteSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ByteSource::R(reg) => write!(f, "{reg}"),
            ByteSource::D8(value) => write!(f, "{value:#04x}"),
            ByteSource::HLI => write!(f, "(HL)"),
            ByteSource::BCI => write!(f, "(BC)"),
            ByteSource::DEI => write!(f, "(DE)"),
            ByteSource::D16I(address) => write!(f, "({address:#06x})"),
            ByteSource::D8I(offset) => write!(f, "({:#06x})", u16::from(*offset) | 0xFF00),
            ByteSource::CI => write!(f, "(C)"),
        }
    }
}

/// A location a word can be written back to: a register pair or `(nn)`.
#[derive(Copy, Clone)]
pub enum WordTarget {
    R(PairedRegister),
    D16I(u16),
}

impl WordTarget {
    #[inline]
    pub fn write<T: AddressSpace>(&self, cpu: &mut CPU, bus: &mut T, value: u16) {
        match self {
            WordTarget::R(reg) => reg.write(cpu, value),
            WordTarget::D16I(address) => {
                bus.write(*address, value as u8);
                bus.write(address.wrapping_add(1), (value >> 8) as u8);
            }
        }
    }
}

impl fmt::Display for WordTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            WordTarget::R(reg) => write!(f, "{reg}"),
            WordTarget::D16I(address) => write!(f, "({address:#06x})"),
        }
    }
}

/// A source we can read a word from.
#[derive(Copy, Clone)]
pub enum WordSource {
    R(PairedRegister),
    D16(u16),
}

impl WordSource {
    #[inline]
    pub fn read(&self, cpu: &CPU) -> u16 {
        match self {
            WordSource::R(reg) => reg.read(cpu),
            WordSource::D16(value) => *value,
        }
    }
}

impl fmt::Display for WordSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            WordSource::R(reg) => write!(f, "{reg}"),
            WordSource::D16(value) => write!(f, "{value:#06x}"),
        }
    }
}

/// The possible forms of the `LD` instruction.
#[derive(Copy, Clone)]
pub enum Load {
    Byte(ByteTarget, ByteSource),
    Word(WordTarget, WordSource),
    IndirectFrom(IndirectByteRef, ByteSource),
    IndirectFromAInc(IndirectByteRef),
    IndirectFromADec(IndirectByteRef),
    IndirectFromWord(WordTarget, WordSource),
    FromIndirectAInc(ByteSource),
    FromIndirectADec(ByteSource),
    IndirectFromSPi8(WordTarget, i8),
}

impl fmt::Display for Load {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Load::Byte(target, source) => write!(f, "{target}, {source}"),
            Load::Word(target, source) => write!(f, "{target}, {source}"),
            Load::IndirectFrom(indirect, source) => write!(f, "{indirect}, {source}"),
            Load::IndirectFromAInc(indirect) => write!(f, "{indirect}, A"),
            Load::IndirectFromADec(indirect) => write!(f, "{indirect}, A"),
            Load::IndirectFromWord(target, source) => write!(f, "{target}, {source}"),
            Load::FromIndirectAInc(source) => write!(f, "A, {source}"),
            Load::FromIndirectADec(source) => write!(f, "A, {source}"),
            Load::IndirectFromSPi8(target, value) => write!(f, "{target}, SP{value:+#04x}"),
        }
    }
}

/// Possible conditions for conditional `JP`, `JR`, `CALL` and `RET`.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum JumpCondition {
    NotZero,
    Zero,
    NotCarry,
    Carry,
    Always,
}

impl JumpCondition {
    #[inline]
    pub fn resolve(&self, cpu: &CPU) -> bool {
        match self {
            JumpCondition::NotZero => !cpu.r.f.contains(FlagsRegister::ZERO),
            JumpCondition::Zero => cpu.r.f.contains(FlagsRegister::ZERO),
            JumpCondition::NotCarry => !cpu.r.f.contains(FlagsRegister::CARRY),
            JumpCondition::Carry => cpu.r.f.contains(FlagsRegister::CARRY),
            JumpCondition::Always => true,
        }
    }
}

impl fmt::Display for JumpCondition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ident = match self {
            JumpCondition::NotZero => "NZ",
            JumpCondition::Zero => "Z",
            JumpCondition::NotCarry => "NC",
            JumpCondition::Carry => "C",
            JumpCondition::Always => "",
        };
        f.write_str(ident)
    }
}

/// A target address for `JP`.
#[derive(Copy, Clone)]
pub enum JumpTarget {
    D16(u16),
    HL,
}

impl JumpTarget {
    #[inline]
    pub fn read(&self, cpu: &CPU) -> u16 {
        match self {
            JumpTarget::D16(value) => *value,
            JumpTarget::HL => cpu.r.get_hl(),
        }
    }
}

impl fmt::Display for JumpTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JumpTarget::D16(value) => write!(f, "{value:#06x}"),
            JumpTarget::HL => write!(f, "HL"),
        }
    }
}

#[repr(u16)]
#[derive(Copy, Clone, Debug)]
pub enum ResetCode {
    RST00 = 0x00,
    RST08 = 0x08,
    RST10 = 0x10,
    RST18 = 0x18,
    RST20 = 0x20,
    RST28 = 0x28,
    RST30 = 0x30,
    RST38 = 0x38,
}

impl fmt::Display for ResetCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", *self as u16)
    }
}
