//! Mapper 0 (NROM): no bank switching, 16/32KB PRG, 8KB CHR ROM or RAM.

use crate::cartridge::mapper::{Mirroring, mapper::Mapper};

/// NROM mapper: fixed PRG and CHR, 16KB PRG mirrored into both halves.
pub struct Mapper0 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_ram: bool,
    mirroring: Mirroring,
}

impl Mapper0 {
    /// Create Mapper0. `chr_ram` marks the CHR storage as writable (header declared no CHR banks).
    pub fn new(prg_rom: Vec<u8>, chr: Vec<u8>, chr_ram: bool, mirroring: Mirroring) -> Self {
        Self {
            prg_rom,
            chr,
            chr_ram,
            mirroring,
        }
    }
}

impl Mapper for Mapper0 {
    fn prg_read(&self, addr: u16) -> Option<u8> {
        match addr {
            0x8000..=0xFFFF => {
                let mask = if self.prg_rom.len() > 0x4000 { 0x7FFF } else { 0x3FFF };
                self.prg_rom.get((addr & mask) as usize).copied()
            }
            _ => None,
        }
    }

    fn prg_write(&mut self, _addr: u16, _data: u8) -> bool {
        false
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_kib_prg_is_mirrored() {
        let mut prg = vec![0; 0x4000];
        prg[0x0010] = 0xAB;
        let m = Mapper0::new(prg, vec![0; 0x2000], false, Mirroring::Horizontal);
        assert_eq!(m.prg_read(0x8010), Some(0xAB));
        assert_eq!(m.prg_read(0xC010), Some(0xAB));
        assert_eq!(m.prg_read(0x6000), None);
    }

    #[test]
    fn chr_rom_ignores_writes() {
        let mut m = Mapper0::new(vec![0; 0x8000], vec![0x11; 0x2000], false, Mirroring::Vertical);
        assert!(!m.chr_write(0x0000, 0x22));
        assert_eq!(m.chr_read(0x0000), 0x11);
    }

    #[test]
    fn chr_ram_accepts_writes() {
        let mut m = Mapper0::new(vec![0; 0x8000], vec![0; 0x2000], true, Mirroring::Vertical);
        assert!(m.chr_write(0x1234, 0x5A));
        assert_eq!(m.chr_read(0x1234), 0x5A);
    }
}
