//! famicore: an NES (Nintendo Entertainment System) emulator core.
//!
//! Implements the NES chipset as documented on the
//! [NESdev Wiki](https://www.nesdev.org/wiki/NES_reference_guide): Ricoh 2A03 (CPU+APU),
//! 2C02 PPU, cartridge mappers, OAM DMA, and controller I/O. [`Nes`] owns every component and
//! steps them from one master clock; a frontend only supplies buttons and drains frames and audio.
//!
//! ## Modules (NESdev references)
//!
//! - **apu** – [APU](https://www.nesdev.org/wiki/APU): pulse×2, triangle, noise, DMC, frame
//!   sequencer, [APU Mixer](https://www.nesdev.org/wiki/APU_Mixer)
//! - **bus** – [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map): cartridge, RAM, PPU,
//!   APU, controllers; [OAM DMA](https://www.nesdev.org/wiki/PPU_registers#OAMDMA)
//! - **cartridge** – [iNES](https://www.nesdev.org/wiki/INES) loading; [Mapper](https://www.nesdev.org/wiki/Mapper)
//!   NROM (0), MMC1 (1), UxROM (2), MMC3 (4)
//! - **controller** – [Controller reading](https://www.nesdev.org/wiki/Controller_reading): $4016 latch, shift-out
//! - **cpu** – [6502](https://www.nesdev.org/wiki/CPU) / 2A03: official + stable undocumented opcodes, [NMI](https://www.nesdev.org/wiki/NMI)
//! - **nes** – master clock: 3 PPU dots per CPU cycle, interrupt delivery, frame pacing
//! - **ppu** – [PPU](https://www.nesdev.org/wiki/PPU), [PPU registers](https://www.nesdev.org/wiki/PPU_registers), OAM, nametables, 256×240

pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod config;
pub mod controller;
pub mod cpu;
pub mod error;
pub mod nes;
pub mod ppu;

pub use apu::apu::AudioSink;
pub use cartridge::cartridge::Cartridge;
pub use config::Config;
pub use error::{Error, Result};
pub use nes::Nes;
