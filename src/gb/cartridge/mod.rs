use crate::error::{GBError, GBResult};
use crate::gb::cartridge::controller::BankController;
use crate::gb::AddressSpace;
use std::path::Path;
use std::{fmt, fs};
use std::sync::Arc;

mod constants;
mod controller;
mod mbc1;
mod nombc;
#[cfg(test)]
mod tests;

/// This area of memory contains the cartridge title
const CARTRIDGE_TITLE_BEGIN: u16 = 0x0134;
const CARTRIDGE_TITLE_END: u16 = 0x0142;

/// When using any CGB registers (including those in the Video/Link chapters),
/// you must first unlock CGB features by changing byte 0143h in the cartridge header.
/// Typically, use a value of 80h for games which support both CGB and monochrome Game Boys,
/// and C0h for games which work on CGBs only. Otherwise,
/// the CGB will operate in monochrome "Non CGB" compatibility mode.
const _CARTRIDGE_CGB_FLAG: u16 = 0x0143;

/// This address contains the cartridge type and what kind of hardware is present.
/// See https://gbdev.io/pandocs/The_Cartridge_Header.html#0147--cartridge-type
const CARTRIDGE_TYPE: u16 = 0x0147;

/// This byte indicates how much ROM is present on the cartridge.
const CARTRIDGE_ROM_SIZE: u16 = 0x0148;

/// This byte indicates how much RAM is present on the cartridge.
const CARTRIDGE_RAM_SIZE: u16 = 0x0149;

/// Header checksum, accumulated byte-wise over 0x0134 - 0x014C.
/// A mismatch against the stored value here is fatal.
const CARTRIDGE_HEADER_CHECKSUM_BEGIN: u16 = 0x0134;
const CARTRIDGE_HEADER_CHECKSUM_END: u16 = 0x014C;
const CARTRIDGE_HEADER_CHECKSUM: u16 = 0x014D;

const ROM_BANK_SIZE: usize = 16384;
const RAM_BANK_SIZE: usize = 8192;

/// The controller type of the cartridge, decoded from the 0x0147 header byte.
/// Only ROM-only carts and the MBC1 family are supported; any other type
/// code is rejected at load time.
#[derive(PartialEq, Copy, Clone, Debug)]
pub enum ControllerType {
    NoMBC { battery: bool },
    MBC1 { battery: bool },
}

impl ControllerType {
    pub const fn has_battery(self) -> bool {
        match self {
            ControllerType::NoMBC { battery } => battery,
            ControllerType::MBC1 { battery } => battery,
        }
    }
}

impl TryFrom<u8> for ControllerType {
    type Error = GBError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let mode = match value {
            0x00 | 0x08 => ControllerType::NoMBC { battery: false },
            0x09 => ControllerType::NoMBC { battery: true },
            0x01 | 0x02 => ControllerType::MBC1 { battery: false },
            0x03 => ControllerType::MBC1 { battery: true },
            _ => return Err(format!("Unsupported cartridge type {value:#04x}").into()),
        };
        Ok(mode)
    }
}

impl fmt::Display for ControllerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControllerType::NoMBC { .. } => "NoMBC",
            ControllerType::MBC1 { .. } => "MBC1",
        };
        write!(f, "{name}")
    }
}

/// Contains the configuration of the cartridge. This includes the controller type,
/// ROM size, RAM size, and the number of banks.
#[derive(Copy, Clone, Debug)]
pub struct CartridgeConfig {
    pub controller: ControllerType,
    pub rom_banks: u16,
    pub ram_banks: u16,
}

impl CartridgeConfig {
    pub fn new(banking: ControllerType, rom_size: u8, ram_size: u8) -> GBResult<Self> {
        let ram_banks = match ram_size {
            0x00 | 0x01 => 0,
            0x02 => 1,
            0x03 => 4,
            0x04 => 16,
            0x05 => 8,
            value => return Err(format!("Unsupported RAM size: {value:#04x}").into()),
        };

        // This can be expressed as 2^(value + 1) up until 512 KiB
        let rom_banks = match rom_size {
            0x00 => 2,
            0x01 => 4,
            0x02 => 8,
            0x03 => 16,
            0x04 => 32,
            0x05 => 64,
            0x06 => 128,
            0x07 => 256,
            0x08 => 512,
            value => return Err(format!("Unsupported ROM size: {value:#04x}").into()),
        };

        Ok(Self {
            controller: banking,
            rom_banks,
            ram_banks,
        })
    }

    #[inline(always)]
    pub const fn ram_size(&self) -> usize {
        self.ram_banks as usize * RAM_BANK_SIZE
    }
}

/// Contains the cartridge header information.
/// See https://gbdev.io/pandocs/The_Cartridge_Header.html
#[derive(Clone)]
pub struct CartridgeHeader {
    pub title: String,
    pub config: CartridgeConfig,
}

impl TryFrom<&[u8]> for CartridgeHeader {
    type Error = GBError;
    fn try_from(buf: &[u8]) -> Result<Self, Self::Error> {
        let controller = ControllerType::try_from(buf[CARTRIDGE_TYPE as usize])?;
        let config = CartridgeConfig::new(
            controller,
            buf[CARTRIDGE_ROM_SIZE as usize],
            buf[CARTRIDGE_RAM_SIZE as usize],
        )?;
        let title = CartridgeHeader::parse_title(buf);
        Ok(Self { title, config })
    }
}

impl CartridgeHeader {
    /// Returns the cartridge title from the cartridge header.
    fn parse_title(buf: &[u8]) -> String {
        let title = buf[CARTRIDGE_TITLE_BEGIN as usize..=CARTRIDGE_TITLE_END as usize]
            .iter()
            .filter_map(|b| b.is_ascii_alphanumeric().then_some(char::from(*b)))
            .collect::<String>();
        match title.is_empty() {
            true => "Unnamed".to_string(),
            false => title,
        }
    }
}

impl fmt::Display for CartridgeHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.config.controller)
    }
}

/// Holds all relevant cartridge information data.
#[derive(Clone)]
pub struct Cartridge {
    pub header: CartridgeHeader,
    controller: Box<dyn BankController>,
}

impl TryFrom<Arc<[u8]>> for Cartridge {
    type Error = GBError;

    fn try_from(rom: Arc<[u8]>) -> Result<Self, Self::Error> {
        verify_header_checksum(rom.as_ref())?;
        if rom.len() > 8 * 1024 * 1024 {
            return Err("Cartridge ROM exceeds 8 MiB".into());
        }
        let header = CartridgeHeader::try_from(rom.as_ref())?;
        let declared_size = header.config.rom_banks as usize * ROM_BANK_SIZE;
        if rom.len() < declared_size {
            return Err(format!(
                "Cartridge ROM is smaller than its declared size: {} < {declared_size}",
                rom.len()
            )
            .into());
        }
        log::info!("loaded cartridge: {header}");
        let controller = controller::new(header.config, rom);
        Ok(Self { controller, header })
    }
}

impl TryFrom<&Path> for Cartridge {
    type Error = GBError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let rom = fs::read(path)?;
        Cartridge::try_from(Arc::from(rom.into_boxed_slice()))
    }
}

impl fmt::Display for Cartridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header)
    }
}

impl AddressSpace for Cartridge {
    #[inline]
    fn write(&mut self, address: u16, value: u8) {
        self.controller.write(address, value);
    }

    #[inline]
    fn read(&self, address: u16) -> u8 {
        self.controller.read(address)
    }
}

/// Validates the header checksum at 0x014D: `x = x - byte - 1` accumulated
/// over bytes 0x0134 - 0x014C. A mismatch is fatal.
fn verify_header_checksum(buf: &[u8]) -> GBResult<()> {
    if buf.len() <= CARTRIDGE_HEADER_CHECKSUM as usize {
        return Err("Cartridge is too small to contain a header".into());
    }

    let calculated = calculate_header_checksum(buf);
    let stored = buf[CARTRIDGE_HEADER_CHECKSUM as usize];
    if calculated != stored {
        return Err(format!(
            "Header checksum mismatch! Expected: {stored:#04x} Got: {calculated:#04x}"
        )
        .into());
    }
    Ok(())
}

fn calculate_header_checksum(buf: &[u8]) -> u8 {
    let range = CARTRIDGE_HEADER_CHECKSUM_BEGIN as usize..=CARTRIDGE_HEADER_CHECKSUM_END as usize;
    buf[range]
        .iter()
        .fold(0u8, |x, &byte| x.wrapping_sub(byte).wrapping_sub(1))
}

/// This function masks the ROM Bank Number to the number of banks in the cartridge.
#[inline]
const fn bank_mask(rom_banks: u16) -> u32 {
    let mask = u16::BITS - rom_banks.leading_zeros();
    (1 << mask) - 1
}
