//! Mapper 2 (UxROM): switchable 16 KiB bank at $8000, last bank fixed at $C000, 8 KiB CHR RAM.

use tracing::debug;

use crate::cartridge::mapper::{
    Mirroring,
    mapper::{Mapper, bank_offset},
};

pub struct Mapper2 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_ram: bool,
    mirroring: Mirroring,
    prg_bank: u8,
}

impl Mapper2 {
    pub fn new(prg_rom: Vec<u8>, chr: Vec<u8>, chr_ram: bool, mirroring: Mirroring) -> Self {
        Self {
            prg_rom,
            chr,
            chr_ram,
            mirroring,
            prg_bank: 0,
        }
    }
}

impl Mapper for Mapper2 {
    fn prg_read(&self, addr: u16) -> Option<u8> {
        let len = self.prg_rom.len();
        let base = match addr {
            0x8000..=0xBFFF => bank_offset(self.prg_bank as usize, 0x4000, len),
            0xC000..=0xFFFF => len.saturating_sub(0x4000),
            _ => return None,
        };
        self.prg_rom.get(base + (addr & 0x3FFF) as usize).copied()
    }

    fn prg_write(&mut self, addr: u16, data: u8) -> bool {
        if addr < 0x8000 {
            return false;
        }
        self.prg_bank = data & 0x0F;
        debug!(bank = self.prg_bank, "UxROM bank select");
        true
    }

    fn chr_read(&self, addr: u16) -> u8 {
        self.chr.get((addr & 0x1FFF) as usize).copied().unwrap_or(0)
    }

    fn chr_write(&mut self, addr: u16, data: u8) -> bool {
        if !self.chr_ram {
            return false;
        }
        if let Some(b) = self.chr.get_mut((addr & 0x1FFF) as usize) {
            *b = data;
        }
        true
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}
