use std::io;
use thiserror::Error;

/// Errors that can surface from the core. Runtime reads/writes are total
/// (§7): this enum only covers load-time failures and the one fatal
/// runtime condition, an illegal opcode.
#[derive(Debug, Error)]
pub enum GBError {
    #[error("failed to load cartridge: {0}")]
    Load(String),

    #[error("illegal opcode {opcode:#04x} at {pc:#06x}")]
    IllegalInstruction { opcode: u8, pc: u16 },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<String> for GBError {
    fn from(msg: String) -> Self {
        GBError::Load(msg)
    }
}

impl From<&str> for GBError {
    fn from(msg: &str) -> Self {
        GBError::Load(msg.to_string())
    }
}

pub type GBResult<T> = Result<T, GBError>;
