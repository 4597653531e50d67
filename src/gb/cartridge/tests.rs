use crate::gb::cartridge::{
    bank_mask, calculate_header_checksum, verify_header_checksum, Cartridge, CartridgeConfig,
    ControllerType, CARTRIDGE_HEADER_CHECKSUM,
};
use std::sync::Arc;

fn header_fixture(checksum: u8) -> Vec<u8> {
    let mut buf = vec![0u8; 0x150];
    buf[0x0134] = b'A';
    buf[0x0147] = 0x00; // ROM only
    buf[0x0148] = 0x00; // 32 KiB
    buf[0x0149] = 0x00; // no RAM
    buf[CARTRIDGE_HEADER_CHECKSUM as usize] = checksum;
    buf
}

#[test]
fn test_calculate_header_checksum() {
    let buf = header_fixture(0);
    let checksum = calculate_header_checksum(&buf);
    // buf[0x0134] = 'A', all else in range is 0.
    let mut x = 0u8;
    for byte in &buf[0x0134..=0x014C] {
        x = x.wrapping_sub(*byte).wrapping_sub(1);
    }
    assert_eq!(checksum, x);
}

#[test]
fn test_verify_header_checksum_ok() {
    let mut buf = header_fixture(0);
    let checksum = calculate_header_checksum(&buf);
    buf[CARTRIDGE_HEADER_CHECKSUM as usize] = checksum;
    assert!(verify_header_checksum(&buf).is_ok());
}

#[test]
fn test_verify_header_checksum_mismatch_is_fatal() {
    let buf = header_fixture(0xFF);
    assert!(verify_header_checksum(&buf).is_err());
}

#[test]
fn test_verify_header_checksum_buffer_too_small() {
    let buf = vec![0u8; 4];
    assert!(verify_header_checksum(&buf).is_err());
}

#[test]
fn test_cartridge_config() {
    let config = CartridgeConfig::new(ControllerType::MBC1 { battery: false }, 0x02, 0x03)
        .unwrap();
    assert_eq!(config.controller, ControllerType::MBC1 { battery: false });
    assert_eq!(config.rom_banks, 8);
    assert_eq!(config.ram_banks, 4);
    assert_eq!(config.ram_size(), 32768);
}

#[test]
fn test_bank_mask() {
    assert_eq!(bank_mask(2), 0b11);
    assert_eq!(bank_mask(4), 0b111);
    assert_eq!(bank_mask(8), 0b1111);
    assert_eq!(bank_mask(16), 0b11111);
    assert_eq!(bank_mask(32), 0b111111);
    assert_eq!(bank_mask(64), 0b1111111);
    assert_eq!(bank_mask(128), 0b11111111);
}

#[test]
fn test_cartridge_type_dispatch() {
    assert_eq!(
        ControllerType::try_from(0x00).unwrap(),
        ControllerType::NoMBC { battery: false }
    );
    assert_eq!(
        ControllerType::try_from(0x09).unwrap(),
        ControllerType::NoMBC { battery: true }
    );
    assert_eq!(
        ControllerType::try_from(0x01).unwrap(),
        ControllerType::MBC1 { battery: false }
    );
    assert_eq!(
        ControllerType::try_from(0x03).unwrap(),
        ControllerType::MBC1 { battery: true }
    );
    assert!(ControllerType::try_from(0x05).is_err());
}

#[test]
fn test_cartridge_from_rom_bytes() {
    let mut buf = header_fixture(0);
    let checksum = calculate_header_checksum(&buf);
    buf[CARTRIDGE_HEADER_CHECKSUM as usize] = checksum;
    buf.resize(32 * 1024, 0);
    let cartridge = Cartridge::try_from(Arc::from(buf.into_boxed_slice())).unwrap();
    assert_eq!(cartridge.header.title, "A");
}

#[test]
fn test_cartridge_rejects_truncated_rom() {
    let mut buf = header_fixture(0);
    buf[0x0148] = 0x01; // declares 64 KiB
    let checksum = calculate_header_checksum(&buf);
    buf[CARTRIDGE_HEADER_CHECKSUM as usize] = checksum;
    // buf is only 0x150 bytes long, far short of the declared 64 KiB.
    assert!(Cartridge::try_from(Arc::from(buf.into_boxed_slice())).is_err());
}
