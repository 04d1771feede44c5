//! Error types for cartridge loading and CPU execution.
//!
//! Both kinds are fatal: a real console has no recovery path for a bad cartridge or a
//! jammed CPU, so callers are expected to stop emulation when they see one.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read ROM: {0}")]
    Io(#[from] std::io::Error),

    /// First four header bytes are not `NES\x1A`.
    #[error("not an iNES image (bad header magic)")]
    InvalidMagic,

    #[error("ROM image truncated: expected {expected} bytes, got {actual}")]
    TruncatedRom { expected: usize, actual: usize },

    #[error("unsupported mapper {0}")]
    UnsupportedMapper(u8),

    #[error("illegal opcode ${opcode:02X} at ${pc:04X}")]
    IllegalOpcode { opcode: u8, pc: u16 },
}
