//! Memory bus and address decoding for the NES.
//!
//! Maps CPU addresses to the cartridge, RAM, PPU registers, APU registers, OAM DMA, and
//! controllers. See [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map).

use tracing::debug;

use crate::{
    apu::apu::APU, cartridge::cartridge::Cartridge, config::Config, controller::Controller,
    ppu::ppu::PPU,
};

/// Trait for memory-mapped I/O and bus access used by the CPU.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);
}

/// In-progress OAM DMA started by a $4014 write.
#[derive(Debug, Default, Clone, Copy)]
pub struct Dma {
    /// Source page; bytes come from `page << 8 | offset`.
    pub page: u8,
    pub offset: u8,
    pub active: bool,
    /// Halt cycle plus the alignment cycle on odd starts.
    idle_cycles: u8,
    data: u8,
    /// Next cycle reads from the bus (otherwise it writes to OAM).
    reading: bool,
    transferred: u16,
}

impl Dma {
    /// Latch `page` and begin a 256-byte transfer after the halt cycle.
    pub fn start(&mut self, page: u8) {
        *self = Self {
            page,
            offset: 0,
            active: true,
            idle_cycles: 1,
            data: 0,
            reading: true,
            transferred: 0,
        };
    }

    /// Add the alignment cycle when the $4014 write landed on an odd cycle. `write_cycle` counts
    /// the CPU cycles that elapsed before the write.
    pub fn align(&mut self, write_cycle: u64) {
        if write_cycle % 2 == 1 {
            self.idle_cycles += 1;
        }
    }
}

/// Main NES bus: RAM, PPU, APU, cartridge, controllers, and the OAM DMA unit.
pub struct NesBus {
    pub ram: [u8; 2048],
    pub cart: Cartridge,
    pub ppu: PPU,
    pub apu: APU,
    pub controllers: [Controller; 2],
    pub dma: Dma,
    /// CPU cycles elapsed; maintained by the driver.
    pub cycles: u64,
}

impl NesBus {
    /// Create a new bus with the given cartridge and default settings.
    pub fn new(cart: Cartridge) -> Self {
        Self::with_config(cart, &Config::default())
    }

    pub fn with_config(cart: Cartridge, config: &Config) -> Self {
        Self {
            ram: [0; 2048],
            cart,
            ppu: PPU::new(),
            apu: APU::new(config),
            controllers: [Controller::new(); 2],
            dma: Dma::default(),
            cycles: 0,
        }
    }

    /// Advance an active OAM DMA by one CPU cycle.
    pub fn step_dma(&mut self) {
        if !self.dma.active {
            return;
        }
        if self.dma.idle_cycles > 0 {
            self.dma.idle_cycles -= 1;
            return;
        }
        if self.dma.reading {
            let addr = (self.dma.page as u16) << 8 | self.dma.offset as u16;
            self.dma.data = self.read(addr);
            self.dma.reading = false;
            return;
        }

        self.ppu.write_oam_data(self.dma.data);
        self.dma.offset = self.dma.offset.wrapping_add(1);
        self.dma.transferred += 1;
        self.dma.reading = true;
        if self.dma.transferred == 256 {
            self.dma.active = false;
        }
    }

    /// Interrupt request from the cartridge or the APU.
    pub fn irq_pending(&self) -> bool {
        self.cart.irq_pending() || self.apu.irq_pending()
    }
}

impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        // Cartridge claims first: PRG ROM/RAM wherever the board maps it.
        if let Some(data) = self.cart.read(addr) {
            return data;
        }
        match addr {
            // Internal RAM (mirrored 4x in 0x0000-0x1FFF)
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            // PPU registers $2000-$3FFF (mirrored every 8 bytes)
            0x2000..=0x3FFF => self.ppu.read_register(addr, &self.cart),
            0x4015 => self.apu.read_status(),
            0x4016 => self.controllers[0].read(),
            0x4017 => self.controllers[1].read(),
            _ => 0,
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        if self.cart.write(addr, data) {
            return;
        }
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = data,
            0x2000..=0x3FFF => self.ppu.write_register(addr, data, &mut self.cart),
            0x4014 => {
                debug!(page = data, cycle = self.cycles, "OAM DMA");
                self.dma.start(data);
            }
            0x4016 => {
                for pad in &mut self.controllers {
                    pad.write(data);
                }
            }
            0x4000..=0x4013 | 0x4015 | 0x4017 => self.apu.write(addr, data),
            _ => {}
        }
    }
}
