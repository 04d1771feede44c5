//! Mapper 1 (MMC1): bank switching via 5-bit shift register.
//!
//! [MMC1](https://www.nesdev.org/wiki/MMC1): writes to $8000–$9FFF (control), $A000–$BFFF (CHR0),
//! $C000–$DFFF (CHR1), $E000–$FFFF (PRG bank). Any write with bit 7 set resets the shift register.
//! Otherwise, bit 0 is shifted in (LSB first); after 5 writes, the value is latched to the register
//! selected by address bits 13–14. Control bits 0–1 = mirroring, 2–3 = PRG mode, 4 = CHR mode.

use tracing::debug;

use crate::cartridge::mapper::{
    Mirroring,
    mapper::{Mapper, bank_offset},
};

/// MMC1 state: 5-bit shift register, control byte (mirroring + PRG/CHR mode), CHR/PRG bank selects.
pub struct Mapper1 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_ram: bool,
    prg_ram: Vec<u8>,
    shift_reg: u8,
    shift_count: u8,
    control: u8,
    chr_bank_0: u8,
    chr_bank_1: u8,
    prg_bank: u8,
}

impl Mapper1 {
    /// Create MMC1. Control defaults to $0C (PRG mode 3: $8000 switchable, $C000 fixed last; 8 KiB CHR).
    pub fn new(prg_rom: Vec<u8>, chr: Vec<u8>, chr_ram: bool) -> Self {
        Self {
            prg_rom,
            chr,
            chr_ram,
            prg_ram: vec![0; 0x2000],
            shift_reg: 0,
            shift_count: 0,
            control: 0x0C,
            chr_bank_0: 0,
            chr_bank_1: 0,
            prg_bank: 0,
        }
    }

    /// PRG bank mode from control bits 2–3: 0/1 = 32 KiB; 2 = $8000 fixed first; 3 = $C000 fixed last.
    fn prg_bank_mode(&self) -> u8 {
        (self.control >> 2) & 0b11
    }

    fn prg_offset(&self, addr: u16) -> usize {
        let len = self.prg_rom.len();
        let bank = (self.prg_bank & 0x0F) as usize;
        let last = (len / 0x4000).max(1) - 1;
        let base = match (self.prg_bank_mode(), addr) {
            (0 | 1, _) => return bank_offset(bank >> 1, 0x8000, len) + (addr & 0x7FFF) as usize,
            (2, 0x8000..=0xBFFF) => 0,
            (2, _) => bank_offset(bank, 0x4000, len),
            (_, 0x8000..=0xBFFF) => bank_offset(bank, 0x4000, len),
            (_, _) => last * 0x4000,
        };
        base + (addr & 0x3FFF) as usize
    }

    fn chr_offset(&self, addr: u16) -> usize {
        let len = self.chr.len();
        if self.control & 0x10 == 0 {
            bank_offset((self.chr_bank_0 >> 1) as usize, 0x2000, len) + (addr & 0x1FFF) as usize
        } else if addr < 0x1000 {
            bank_offset(self.chr_bank_0 as usize, 0x1000, len) + (addr & 0x0FFF) as usize
        } else {
            bank_offset(self.chr_bank_1 as usize, 0x1000, len) + (addr & 0x0FFF) as usize
        }
    }

    fn commit(&mut self, addr: u16, value: u8) {
        match (addr >> 13) & 0x03 {
            0 => self.control = value,
            1 => self.chr_bank_0 = value,
            2 => self.chr_bank_1 = value,
            _ => self.prg_bank = value,
        }
        debug!(
            register = (addr >> 13) & 0x03,
            value, "MMC1 register write"
        );
    }
}

impl Mapper for Mapper1 {
    fn prg_read(&self, addr: u16) -> Option<u8> {
        match addr {
            0x6000..=0x7FFF => Some(self.prg_ram[(addr & 0x1FFF) as usize]),
            0x8000..=0xFFFF => self.prg_rom.get(self.prg_offset(addr)).copied(),
            _ => None,
        }
    }

    fn prg_write(&mut self, addr: u16, data: u8) -> bool {
        match addr {
            0x6000..=0x7FFF => {
                self.prg_ram[(addr & 0x1FFF) as usize] = data;
                true
            }
            0x8000..=0xFFFF => {
                // Bit 7 set: reset the shift register and force PRG mode 3.
                if data & 0x80 != 0 {
                    self.shift_reg = 0;
                    self.shift_count = 0;
                    self.control |= 0x0C;
                    return true;
                }

                self.shift_reg >>= 1;
                self.shift_reg |= (data & 1) << 4;
                self.shift_count += 1;

                if self.shift_count == 5 {
                    self.commit(addr, self.shift_reg & 0x1F);
                    self.shift_reg = 0;
                    self.shift_count = 0;
                }
                true
            }
            _ => false,
        }
    }

    fn chr_read(&self, addr: u16) -> u8 {
        self.chr.get(self.chr_offset(addr)).copied().unwrap_or(0)
    }

    fn chr_write(&mut self, addr: u16, data: u8) -> bool {
        if !self.chr_ram {
            return false;
        }
        let offset = self.chr_offset(addr);
        if let Some(b) = self.chr.get_mut(offset) {
            *b = data;
        }
        true
    }

    /// Mirroring from control bits 0–1: 0 = one-screen lower, 1 = one-screen upper, 2 = vertical, 3 = horizontal.
    fn mirroring(&self) -> Mirroring {
        match self.control & 0b11 {
            0 => Mirroring::SingleLower,
            1 => Mirroring::SingleUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serial_write(m: &mut Mapper1, addr: u16, value: u8) {
        for i in 0..5 {
            m.prg_write(addr, (value >> i) & 1);
        }
    }

    fn banked_prg(banks: usize) -> Vec<u8> {
        let mut prg = vec![0; banks * 0x4000];
        for b in 0..banks {
            prg[b * 0x4000] = b as u8;
        }
        prg
    }

    #[test]
    fn five_writes_commit_to_register_selected_by_address() {
        let mut m = Mapper1::new(banked_prg(8), vec![0; 0x2000], true);

        serial_write(&mut m, 0xA000, 0x15);
        assert_eq!(m.chr_bank_0, 0x15);
        serial_write(&mut m, 0xC000, 0x0A);
        assert_eq!(m.chr_bank_1, 0x0A);
        serial_write(&mut m, 0xE000, 0x03);
        assert_eq!(m.prg_bank, 0x03);
        serial_write(&mut m, 0x8000, 0x02);
        assert_eq!(m.control, 0x02);
        assert_eq!(m.shift_count, 0);
    }

    #[test]
    fn high_bit_resets_shift_without_commit() {
        let mut m = Mapper1::new(banked_prg(8), vec![0; 0x2000], true);

        m.prg_write(0xE000, 1);
        m.prg_write(0xE000, 1);
        m.prg_write(0xE000, 0x80);
        assert_eq!(m.shift_count, 0);
        assert_eq!(m.shift_reg, 0);
        assert_eq!(m.prg_bank, 0);

        // Four more writes must not complete a transfer either.
        for _ in 0..4 {
            m.prg_write(0xE000, 1);
        }
        assert_eq!(m.prg_bank, 0);
        m.prg_write(0xE000, 0);
        assert_eq!(m.prg_bank, 0x0F);
    }

    #[test]
    fn prg_mode_3_switches_low_bank_and_fixes_last() {
        let mut m = Mapper1::new(banked_prg(8), vec![0; 0x2000], true);
        serial_write(&mut m, 0xE000, 5);
        assert_eq!(m.prg_read(0x8000), Some(5));
        assert_eq!(m.prg_read(0xC000), Some(7));
    }

    #[test]
    fn prg_mode_2_fixes_first_and_switches_high_bank() {
        let mut m = Mapper1::new(banked_prg(8), vec![0; 0x2000], true);
        serial_write(&mut m, 0x8000, 0x08);
        serial_write(&mut m, 0xE000, 6);
        assert_eq!(m.prg_read(0x8000), Some(0));
        assert_eq!(m.prg_read(0xC000), Some(6));
    }

    #[test]
    fn control_selects_mirroring() {
        let mut m = Mapper1::new(banked_prg(2), vec![0; 0x2000], true);
        serial_write(&mut m, 0x8000, 0x0C | 2);
        assert_eq!(m.mirroring(), Mirroring::Vertical);
        serial_write(&mut m, 0x8000, 0x0C | 1);
        assert_eq!(m.mirroring(), Mirroring::SingleUpper);
    }

    #[test]
    fn prg_ram_is_claimed() {
        let mut m = Mapper1::new(banked_prg(2), vec![0; 0x2000], true);
        assert!(m.prg_write(0x6123, 0x77));
        assert_eq!(m.prg_read(0x6123), Some(0x77));
    }

    #[test]
    fn four_kib_chr_mode_banks_each_half() {
        let mut chr = vec![0; 0x8000];
        for b in 0..8 {
            chr[b * 0x1000] = b as u8;
        }
        let mut m = Mapper1::new(banked_prg(2), chr, false);
        serial_write(&mut m, 0x8000, 0x1C);
        serial_write(&mut m, 0xA000, 3);
        serial_write(&mut m, 0xC000, 6);
        assert_eq!(m.chr_read(0x0000), 3);
        assert_eq!(m.chr_read(0x1000), 6);
    }
}
