pub const ROM_LOW_BANK_BEGIN: u16 = 0x0000;
pub const ROM_LOW_BANK_END: u16 = 0x3FFF;
pub const ROM_HIGH_BANK_BEGIN: u16 = 0x4000;
pub const ROM_HIGH_BANK_END: u16 = 0x7FFF;
pub const CRAM_BANK_BEGIN: u16 = 0xA000;
pub const CRAM_BANK_END: u16 = 0xBFFF;

/// Value read back from disconnected or disabled cartridge RAM.
pub const UNDEFINED_READ: u8 = 0xFF;
