//! NES mappers for PRG/CHR memory mapping.
//!
//! Mapper0 (NROM), Mapper1 (MMC1), Mapper2 (UxROM), Mapper4 (MMC3), and the closed [`Board`]
//! type that dispatches between them.

pub mod mapper;

pub mod mapper0;
pub mod mapper1;
pub mod mapper2;
pub mod mapper4;

use mapper::Mapper;
use mapper0::Mapper0;
use mapper1::Mapper1;
use mapper2::Mapper2;
use mapper4::Mapper4;

/// Nametable mirroring mode for PPU.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    SingleLower,
    SingleUpper,
}

/// Forward a call to whichever board is inside.
macro_rules! dispatch {
    ($board:expr, $m:ident => $call:expr) => {
        match $board {
            Board::Nrom($m) => $call,
            Board::Mmc1($m) => $call,
            Board::UxRom($m) => $call,
            Board::Mmc3($m) => $call,
        }
    };
}

/// Every supported cartridge board. One variant per bank-switching scheme.
pub enum Board {
    Nrom(Mapper0),
    Mmc1(Mapper1),
    UxRom(Mapper2),
    Mmc3(Mapper4),
}

impl Board {
    /// iNES mapper number for this board.
    pub fn id(&self) -> u8 {
        match self {
            Board::Nrom(_) => 0,
            Board::Mmc1(_) => 1,
            Board::UxRom(_) => 2,
            Board::Mmc3(_) => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Board::Nrom(_) => "NROM",
            Board::Mmc1(_) => "MMC1",
            Board::UxRom(_) => "UxROM",
            Board::Mmc3(_) => "MMC3",
        }
    }
}

impl Mapper for Board {
    fn prg_read(&self, addr: u16) -> Option<u8> {
        dispatch!(self, m => m.prg_read(addr))
    }

    fn prg_write(&mut self, addr: u16, data: u8) -> bool {
        dispatch!(self, m => m.prg_write(addr, data))
    }

    fn chr_read(&self, addr: u16) -> u8 {
        dispatch!(self, m => m.chr_read(addr))
    }

    fn chr_write(&mut self, addr: u16, data: u8) -> bool {
        dispatch!(self, m => m.chr_write(addr, data))
    }

    fn mirroring(&self) -> Mirroring {
        dispatch!(self, m => m.mirroring())
    }

    fn scanline(&mut self) {
        dispatch!(self, m => m.scanline())
    }

    fn irq_pending(&self) -> bool {
        dispatch!(self, m => m.irq_pending())
    }

    fn irq_clear(&mut self) {
        dispatch!(self, m => m.irq_clear())
    }
}
