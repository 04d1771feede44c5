//! NES cartridge loading from iNES format (.nes files).
//!
//! Implements the [iNES](https://www.nesdev.org/wiki/INES) format: 16-byte header (magic "NES\x1A",
//! PRG size in 16 KiB units, CHR size in 8 KiB units, flags 6–7 for mapper, etc.), an optional
//! 512-byte trainer, then PRG ROM, then CHR ROM. A CHR size of zero means 8 KiB of CHR RAM.
//! The [Mapper](https://www.nesdev.org/wiki/Mapper) implements CPU PRG ($4020–$FFFF) and PPU CHR
//! ($0000–$1FFF) address decoding and bank switching.

use std::path::Path;

use tracing::info;

use crate::cartridge::mapper::mapper::Mapper;
use crate::cartridge::mapper::mapper0::Mapper0;
use crate::cartridge::mapper::mapper1::Mapper1;
use crate::cartridge::mapper::mapper2::Mapper2;
use crate::cartridge::mapper::mapper4::Mapper4;
use crate::cartridge::mapper::{Board, Mirroring};
use crate::error::{Error, Result};

pub const HEADER_LEN: usize = 16;
pub const TRAINER_LEN: usize = 512;
pub const PRG_BANK_SIZE: usize = 16 * 1024;
pub const CHR_BANK_SIZE: usize = 8 * 1024;

const MAGIC: [u8; 4] = *b"NES\x1A";

/// Decoded iNES header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub prg_banks: u8,
    pub chr_banks: u8,
    pub mapper_id: u8,
    pub mirroring: Mirroring,
    pub has_trainer: bool,
}

impl Header {
    /// Parse the 16-byte header. Mapper number = high nibble of byte 7 | high nibble of byte 6;
    /// byte 6 bit 0 selects vertical (1) or horizontal (0) mirroring, bit 2 a trainer.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(Error::TruncatedRom {
                expected: HEADER_LEN,
                actual: data.len(),
            });
        }
        if data[0..4] != MAGIC {
            return Err(Error::InvalidMagic);
        }

        let mirroring = if data[6] & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        Ok(Self {
            prg_banks: data[4],
            chr_banks: data[5],
            mapper_id: (data[7] & 0xF0) | (data[6] >> 4),
            mirroring,
            has_trainer: data[6] & 0x04 != 0,
        })
    }

    /// Total image size this header promises.
    pub fn image_len(&self) -> usize {
        HEADER_LEN
            + if self.has_trainer { TRAINER_LEN } else { 0 }
            + self.prg_banks as usize * PRG_BANK_SIZE
            + self.chr_banks as usize * CHR_BANK_SIZE
    }
}

/// Cartridge: owns the board (PRG/CHR storage and bank registers).
/// CPU reaches PRG through `read`/`write`; the PPU reaches CHR through `read_chr`/`write_chr`.
pub struct Cartridge {
    pub header: Header,
    pub mapper: Board,
}

impl Cartridge {
    /// Load a cartridge from an iNES file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Build a cartridge from an in-memory iNES image.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let header = Header::parse(data)?;
        let expected = header.image_len();
        if data.len() < expected {
            return Err(Error::TruncatedRom {
                expected,
                actual: data.len(),
            });
        }

        let prg_start = HEADER_LEN + if header.has_trainer { TRAINER_LEN } else { 0 };
        let prg_end = prg_start + header.prg_banks as usize * PRG_BANK_SIZE;
        let chr_end = prg_end + header.chr_banks as usize * CHR_BANK_SIZE;

        let prg_rom = data[prg_start..prg_end].to_vec();
        let chr_ram = header.chr_banks == 0;
        let chr = if chr_ram {
            vec![0; CHR_BANK_SIZE]
        } else {
            data[prg_end..chr_end].to_vec()
        };

        let mirroring = header.mirroring;
        let mapper = match header.mapper_id {
            0 => Board::Nrom(Mapper0::new(prg_rom, chr, chr_ram, mirroring)),
            1 => Board::Mmc1(Mapper1::new(prg_rom, chr, chr_ram)),
            2 => Board::UxRom(Mapper2::new(prg_rom, chr, chr_ram, mirroring)),
            4 => Board::Mmc3(Mapper4::new(prg_rom, chr, chr_ram, mirroring)),
            id => return Err(Error::UnsupportedMapper(id)),
        };

        info!(
            mapper = mapper.name(),
            id = mapper.id(),
            prg_banks = header.prg_banks,
            chr_banks = header.chr_banks,
            chr_ram,
            mirroring = ?mirroring,
            "cartridge loaded"
        );

        Ok(Self { header, mapper })
    }

    /// CPU read in cartridge space. `None` if the board does not claim `addr`.
    pub fn read(&self, addr: u16) -> Option<u8> {
        self.mapper.prg_read(addr)
    }

    /// CPU write: PRG RAM or mapper registers. Returns true if the board claimed `addr`.
    pub fn write(&mut self, addr: u16, data: u8) -> bool {
        self.mapper.prg_write(addr, data)
    }

    /// PPU pattern-table read.
    pub fn read_chr(&self, addr: u16) -> u8 {
        self.mapper.chr_read(addr)
    }

    /// PPU pattern-table write (CHR RAM only).
    pub fn write_chr(&mut self, addr: u16, data: u8) {
        self.mapper.chr_write(addr, data);
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mapper.mirroring()
    }

    /// Scanline hook, invoked by the PPU while rendering is enabled.
    pub fn scanline(&mut self) {
        self.mapper.scanline();
    }

    pub fn irq_pending(&self) -> bool {
        self.mapper.irq_pending()
    }

    pub fn irq_clear(&mut self) {
        self.mapper.irq_clear();
    }
}
