//! 6502 CPU emulation for the NES.
//!
//! Table-driven interpreter: every opcode decodes through [`opcodes::OPCODES`] to an operation,
//! an addressing mode, and a base cycle cost. Stable undocumented opcodes are supported; JAM and
//! the unstable ones stop emulation with [`crate::error::Error::IllegalOpcode`].
//! Memory and I/O go through the [`crate::bus::Bus`] trait.

pub mod cpu;
pub mod flags;
pub mod opcodes;
pub mod trace;

#[cfg(test)]
mod tests;
