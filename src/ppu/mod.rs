//! 2C02 picture processing.
//!
//! See [PPU](https://www.nesdev.org/wiki/PPU) and [PPU rendering](https://www.nesdev.org/wiki/PPU_rendering).
//!
//! - **ppu**: dot timing, the background/sprite pipeline, and the $2000–$2007 register file
//! - **registers**: PPUCTRL / PPUMASK / PPUSTATUS bitfields and the loopy `v`/`t` address
//! - **palette**: the 64-entry system palette as RGBA

pub mod palette;
pub mod ppu;
pub mod registers;
