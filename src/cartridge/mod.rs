//! NES cartridge loading and mapper support.
//!
//! - **cartridge**: Loads iNES (.nes) files, holds the board that owns PRG/CHR.
//! - **mapper**: NROM (0), MMC1 (1), UxROM (2), MMC3 (4); PRG/CHR bank switching, nametable
//!   mirroring, and the MMC3 scanline IRQ.

pub mod cartridge;
pub mod mapper;
