//! Mapper 4 (MMC3): bank switching, switchable mirroring, PRG RAM, scanline IRQ.
//!
//! [MMC3](https://www.nesdev.org/wiki/MMC3): Bank select at $8000–$9FFE (even), bank data at
//! $8001–$9FFF (odd). R0/R1 = 2 KiB CHR, R2–R5 = 1 KiB CHR, R6/R7 = 8 KiB PRG. Mirroring at
//! $A000–$BFFE (even), PRG RAM protect at $A001. IRQ latch $C000, reload $C001, disable $E000,
//! enable $E001. The IRQ counter is clocked once per rendered scanline by the PPU.

use tracing::debug;

use crate::cartridge::mapper::{
    Mirroring,
    mapper::{Mapper, bank_offset},
};

/// MMC3 state: bank registers with their resolved offsets, mirroring, PRG RAM, IRQ counter/latch/enable.
pub struct Mapper4 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_ram: bool,
    prg_ram: Vec<u8>,
    /// Bank select ($8000): bits 0–2 = register index, bit 6 = PRG mode, bit 7 = CHR A12 invert.
    bank_select: u8,
    /// R0–R5 CHR, R6–R7 PRG.
    regs: [u8; 8],
    /// Byte offsets of the four 8 KiB PRG windows at $8000/$A000/$C000/$E000.
    prg_offsets: [usize; 4],
    /// Byte offsets of the eight 1 KiB CHR windows.
    chr_offsets: [usize; 8],
    mirroring: Mirroring,
    prg_ram_enable: bool,
    prg_ram_write_protect: bool,
    irq_latch: u8,
    irq_counter: u8,
    irq_reload_pending: bool,
    irq_enabled: bool,
    irq_active: bool,
}

impl Mapper4 {
    /// Create MMC3. PRG RAM 8 KiB is allocated for save RAM.
    pub fn new(prg_rom: Vec<u8>, chr: Vec<u8>, chr_ram: bool, mirroring: Mirroring) -> Self {
        let mut mapper = Self {
            prg_rom,
            chr,
            chr_ram,
            prg_ram: vec![0; 0x2000],
            bank_select: 0,
            regs: [0, 2, 4, 5, 6, 7, 0, 1],
            prg_offsets: [0; 4],
            chr_offsets: [0; 8],
            mirroring,
            prg_ram_enable: true,
            prg_ram_write_protect: false,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload_pending: false,
            irq_enabled: false,
            irq_active: false,
        };
        mapper.update_banks();
        mapper
    }

    /// Recompute the PRG/CHR offset tables from the bank registers.
    fn update_banks(&mut self) {
        let chr_len = self.chr.len();
        let r = &self.regs;
        let chr_banks = if self.bank_select & 0x80 == 0 {
            [r[0] & 0xFE, r[0] | 1, r[1] & 0xFE, r[1] | 1, r[2], r[3], r[4], r[5]]
        } else {
            [r[2], r[3], r[4], r[5], r[0] & 0xFE, r[0] | 1, r[1] & 0xFE, r[1] | 1]
        };
        for (slot, bank) in self.chr_offsets.iter_mut().zip(chr_banks) {
            *slot = bank_offset(bank as usize, 0x400, chr_len);
        }

        let prg_len = self.prg_rom.len();
        let count = (prg_len / 0x2000).max(1);
        let last = count - 1;
        let second_last = count.saturating_sub(2);
        let r6 = (r[6] & 0x3F) as usize;
        let r7 = (r[7] & 0x3F) as usize;
        let prg_banks = if self.bank_select & 0x40 == 0 {
            [r6, r7, second_last, last]
        } else {
            [second_last, r7, r6, last]
        };
        for (slot, bank) in self.prg_offsets.iter_mut().zip(prg_banks) {
            *slot = bank_offset(bank, 0x2000, prg_len);
        }
    }

    fn chr_index(&self, addr: u16) -> usize {
        let addr = (addr & 0x1FFF) as usize;
        self.chr_offsets[addr >> 10] + (addr & 0x3FF)
    }
}

impl Mapper for Mapper4 {
    fn prg_read(&self, addr: u16) -> Option<u8> {
        match addr {
            0x6000..=0x7FFF if self.prg_ram_enable => Some(self.prg_ram[(addr & 0x1FFF) as usize]),
            0x8000..=0xFFFF => {
                let window = ((addr - 0x8000) >> 13) as usize;
                let offset = self.prg_offsets[window] + (addr & 0x1FFF) as usize;
                self.prg_rom.get(offset).copied()
            }
            _ => None,
        }
    }

    fn prg_write(&mut self, addr: u16, data: u8) -> bool {
        let even = addr & 1 == 0;
        match addr {
            0x6000..=0x7FFF => {
                if self.prg_ram_enable && !self.prg_ram_write_protect {
                    self.prg_ram[(addr & 0x1FFF) as usize] = data;
                }
            }
            0x8000..=0x9FFF if even => {
                self.bank_select = data;
                self.update_banks();
            }
            0x8000..=0x9FFF => {
                self.regs[(self.bank_select & 7) as usize] = data;
                self.update_banks();
                debug!(register = self.bank_select & 7, bank = data, "MMC3 bank data");
            }
            0xA000..=0xBFFF if even => {
                self.mirroring = if data & 1 == 0 {
                    Mirroring::Vertical
                } else {
                    Mirroring::Horizontal
                };
            }
            0xA000..=0xBFFF => {
                self.prg_ram_enable = data & 0x80 != 0;
                self.prg_ram_write_protect = data & 0x40 != 0;
            }
            0xC000..=0xDFFF if even => self.irq_latch = data,
            0xC000..=0xDFFF => {
                self.irq_counter = 0;
                self.irq_reload_pending = true;
            }
            0xE000..=0xFFFF if even => {
                self.irq_enabled = false;
                self.irq_active = false;
            }
            0xE000..=0xFFFF => self.irq_enabled = true,
            _ => return false,
        }
        true
    }

    fn chr_read(&self, addr: u16) -> u8 {
        self.chr.get(self.chr_index(addr)).copied().unwrap_or(0)
    }

    fn chr_write(&mut self, addr: u16, data: u8) -> bool {
        if !self.chr_ram {
            return false;
        }
        let index = self.chr_index(addr);
        if let Some(b) = self.chr.get_mut(index) {
            *b = data;
        }
        true
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    /// Counter reloads from the latch when zero (or after a $C001 write), otherwise decrements;
    /// reaching zero while enabled asserts IRQ.
    fn scanline(&mut self) {
        if self.irq_counter == 0 || self.irq_reload_pending {
            self.irq_counter = self.irq_latch;
            self.irq_reload_pending = false;
        } else {
            self.irq_counter -= 1;
        }
        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_active = true;
        }
    }

    fn irq_pending(&self) -> bool {
        self.irq_active
    }

    fn irq_clear(&mut self) {
        self.irq_active = false;
    }
}
