//! Interrupt controller (§4.2): two 5-bit registers, IE at 0xFFFF and IF at
//! 0xFF0F, plus the dispatch algorithm invoked from the CPU before every
//! fetch.

bitflags! {
    /// Represents both IE (0xFFFF) and IF (0xFF0F); only the low 5 bits are
    /// meaningful, in priority order V-Blank (highest) .. Joypad (lowest).
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct InterruptRegister: u8 {
        const VBLANK = 0b0000_0001;
        const STAT   = 0b0000_0010;
        const TIMER  = 0b0000_0100;
        const SERIAL = 0b0000_1000;
        const JOYPAD = 0b0001_0000;
    }
}

const VECTORS: [(InterruptRegister, u16); 5] = [
    (InterruptRegister::VBLANK, 0x0040),
    (InterruptRegister::STAT, 0x0048),
    (InterruptRegister::TIMER, 0x0050),
    (InterruptRegister::SERIAL, 0x0058),
    (InterruptRegister::JOYPAD, 0x0060),
];

/// Outcome of checking for a pending, enabled interrupt.
pub struct Dispatch {
    pub vector: u16,
    pub bit: InterruptRegister,
}

/// Finds the lowest-numbered interrupt that is both requested (`int_flag`)
/// and enabled (`int_enable`), in priority order. Does not mutate anything;
/// the caller clears the IF bit and pushes PC.
pub fn pending(int_enable: InterruptRegister, int_flag: InterruptRegister) -> Option<Dispatch> {
    let active = int_enable & int_flag;
    VECTORS
        .iter()
        .find(|(bit, _)| active.contains(*bit))
        .map(|&(bit, vector)| Dispatch { vector, bit })
}

/// True if any enabled interrupt is pending, used for HALT wakeup which is
/// independent of IME.
#[inline]
pub fn has_pending(int_enable: InterruptRegister, int_flag: InterruptRegister) -> bool {
    !(int_enable & int_flag).is_empty()
}
