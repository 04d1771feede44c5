//! Mapper trait: PRG/CHR memory access, mirroring, and the scanline IRQ hook.

use crate::cartridge::mapper::Mirroring;

/// Capability set shared by every cartridge board. CPU and PPU reach cartridge space only through these.
pub trait Mapper {
    /// CPU read in cartridge space. `None` means the board does not claim `addr`.
    fn prg_read(&self, addr: u16) -> Option<u8>;
    /// CPU write to PRG RAM or bank registers. Returns true if the board claimed `addr`.
    fn prg_write(&mut self, addr: u16, data: u8) -> bool;
    /// PPU read from pattern space ($0000–$1FFF).
    fn chr_read(&self, addr: u16) -> u8;
    /// PPU write to pattern space. Only honoured for CHR RAM.
    fn chr_write(&mut self, addr: u16, data: u8) -> bool;
    /// Current nametable mirroring for the PPU.
    fn mirroring(&self) -> Mirroring;

    /// Called by the PPU once per rendered scanline.
    fn scanline(&mut self) {}

    /// True while the board is asserting IRQ.
    fn irq_pending(&self) -> bool {
        false
    }

    /// Acknowledge a delivered IRQ.
    fn irq_clear(&mut self) {}
}

/// Map `bank` (in units of `size` bytes) to a byte offset, wrapping to the storage actually present.
pub(crate) fn bank_offset(bank: usize, size: usize, len: usize) -> usize {
    let count = (len / size).max(1);
    (bank % count) * size
}
