//! Master-clock driver tying CPU, PPU, APU, bus, and cartridge together.
//!
//! One [`Nes::clock`] is one PPU dot. Every third dot is a CPU cycle, which either burns a cycle
//! still owed by the previous instruction, advances OAM DMA, enters an interrupt, or executes the
//! next instruction. The APU steps once per CPU cycle.

use crate::{
    apu::apu::AudioSink,
    bus::{Dma, NesBus},
    cartridge::cartridge::Cartridge,
    config::Config,
    cpu::cpu::CPU,
    error::Result,
};

/// PPU dots per CPU cycle.
const PPU_DOTS_PER_CPU_CYCLE: u64 = 3;

pub struct Nes {
    pub cpu: CPU<NesBus>,
    master_clock: u64,
}

impl Nes {
    /// Power on with `cart` inserted and run the reset sequence.
    pub fn new(cart: Cartridge) -> Self {
        Self::with_config(cart, Config::default())
    }

    pub fn with_config(cart: Cartridge, config: Config) -> Self {
        let mut cpu = CPU::new(NesBus::with_config(cart, &config));
        cpu.reset();
        Self {
            cpu,
            master_clock: 0,
        }
    }

    /// Reset button: CPU reset sequence and a fresh driver clock. Memory is left alone.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.cpu.bus.dma = Dma::default();
        self.cpu.bus.cycles = 0;
        self.master_clock = 0;
    }

    /// Master ticks since power-on or the last reset.
    pub fn master_clock(&self) -> u64 {
        self.master_clock
    }

    /// Advance one master tick (one PPU dot).
    pub fn clock(&mut self, sink: &mut impl AudioSink) -> Result<()> {
        let bus = &mut self.cpu.bus;
        bus.ppu.tick(&mut bus.cart);

        if self.master_clock % PPU_DOTS_PER_CPU_CYCLE == 0 {
            self.clock_cpu()?;
            self.clock_apu(sink);
        }
        self.master_clock += 1;
        Ok(())
    }

    fn clock_cpu(&mut self) -> Result<()> {
        self.cpu.bus.cycles += 1;

        if self.cpu.remaining > 0 {
            self.cpu.remaining -= 1;
            return Ok(());
        }
        if self.cpu.bus.dma.active {
            self.cpu.bus.step_dma();
            return Ok(());
        }

        let elapsed = self.cpu.bus.cycles - 1;
        let cycles = if self.cpu.bus.ppu.nmi {
            self.cpu.bus.ppu.nmi = false;
            self.cpu.nmi()
        } else {
            match self.service_irq() {
                Some(cycles) => cycles,
                None => self.cpu.step()?,
            }
        };
        // DMA was idle before this instruction, so an active one was started by it. Stores
        // write on their last cycle.
        if self.cpu.bus.dma.active {
            self.cpu.bus.dma.align(elapsed + cycles as u64 - 1);
        }
        self.cpu.remaining = cycles.saturating_sub(1) as u16;
        Ok(())
    }

    /// Enter the IRQ handler if the line is asserted and the CPU is not masking it.
    fn service_irq(&mut self) -> Option<u8> {
        if !self.cpu.bus.irq_pending() {
            return None;
        }
        match self.cpu.irq() {
            0 => None,
            cycles => {
                self.cpu.bus.cart.irq_clear();
                Some(cycles)
            }
        }
    }

    fn clock_apu(&mut self, sink: &mut impl AudioSink) {
        let bus = &mut self.cpu.bus;
        let stall = bus.apu.step(&bus.cart);
        if bus.apu.samples.is_full() {
            bus.apu.samples.flush(sink);
        }
        self.cpu.remaining += stall as u16;
    }

    /// Clock until the PPU finishes the current frame.
    pub fn run_frame(&mut self, sink: &mut impl AudioSink) -> Result<()> {
        while !self.cpu.bus.ppu.frame_complete {
            self.clock(sink)?;
        }
        self.cpu.bus.ppu.frame_complete = false;
        Ok(())
    }

    /// Last rendered 256×240 frame, packed `0xRRGGBBAA`, row-major.
    pub fn frame(&self) -> &[u32] {
        &self.cpu.bus.ppu.framebuffer
    }

    /// Button snapshot for controller `port` (0 or 1), latched on the next $4016 strobe.
    pub fn set_buttons(&mut self, port: usize, state: u8) {
        if let Some(pad) = self.cpu.bus.controllers.get_mut(port) {
            pad.state = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::cartridge::{HEADER_LEN, PRG_BANK_SIZE};
    use crate::controller::BUTTON_START;

    /// NROM image: `program` at $8000, NMI handler at $9000, IRQ handler at $A000.
    fn cart(program: &[u8], nmi: &[u8], irq: &[u8]) -> Cartridge {
        let mut prg = vec![0xEA; PRG_BANK_SIZE];
        prg[..program.len()].copy_from_slice(program);
        prg[0x1000..0x1000 + nmi.len()].copy_from_slice(nmi);
        prg[0x2000..0x2000 + irq.len()].copy_from_slice(irq);
        prg[0x3FFA..].copy_from_slice(&[0x00, 0x90, 0x00, 0x80, 0x00, 0xA0]);

        let mut rom = vec![0; HEADER_LEN];
        rom[..6].copy_from_slice(&[b'N', b'E', b'S', 0x1A, 1, 0]);
        rom.extend(prg);
        Cartridge::from_bytes(&rom).unwrap()
    }

    fn spin() -> Cartridge {
        // JMP $8000
        cart(&[0x4C, 0x00, 0x80], &[0x40], &[0x40])
    }

    #[test]
    fn cpu_runs_at_a_third_of_master_clock() {
        let mut nes = Nes::new(spin());
        for _ in 0..3000 {
            nes.clock(&mut ()).unwrap();
        }
        assert_eq!(nes.cpu.bus.cycles, 1000);
        assert_eq!(nes.master_clock(), 3000);
    }

    #[test]
    fn frame_is_262_by_341_ticks() {
        let mut nes = Nes::new(spin());
        nes.run_frame(&mut ()).unwrap();
        let first = nes.master_clock();
        nes.run_frame(&mut ()).unwrap();
        assert_eq!(first, 262 * 341);
        assert_eq!(nes.master_clock() - first, 262 * 341);
    }

    #[test]
    fn nmi_delivered_once_per_frame() {
        // LDA #$80; STA $2000; JMP $8005
        let program = [0xA9, 0x80, 0x8D, 0x00, 0x20, 0x4C, 0x05, 0x80];
        // INC $00; RTI
        let mut nes = Nes::new(cart(&program, &[0xE6, 0x00, 0x40], &[0x40]));

        nes.run_frame(&mut ()).unwrap();
        assert_eq!(nes.cpu.bus.ram[0], 1);
        nes.run_frame(&mut ()).unwrap();
        assert_eq!(nes.cpu.bus.ram[0], 2);
    }

    #[test]
    fn apu_frame_irq_reaches_cpu() {
        // CLI; JMP $8001
        let program = [0x58, 0x4C, 0x01, 0x80];
        // LDA $4015 (acknowledge); INC $01; RTI
        let irq = [0xAD, 0x15, 0x40, 0xE6, 0x01, 0x40];
        let mut nes = Nes::new(cart(&program, &[0x40], &irq));

        nes.run_frame(&mut ()).unwrap();
        assert_eq!(nes.cpu.bus.ram[1], 0);
        nes.run_frame(&mut ()).unwrap();
        assert_eq!(nes.cpu.bus.ram[1], 1);
    }

    #[test]
    fn masked_irq_is_not_taken() {
        // SEI; JMP $8001
        let program = [0x78, 0x4C, 0x01, 0x80];
        let irq = [0xE6, 0x01, 0x40];
        let mut nes = Nes::new(cart(&program, &[0x40], &irq));

        nes.run_frame(&mut ()).unwrap();
        nes.run_frame(&mut ()).unwrap();
        assert!(nes.cpu.bus.apu.irq_pending());
        assert_eq!(nes.cpu.bus.ram[1], 0);
    }

    #[test]
    fn oam_dma_stalls_cpu() {
        // LDA #$02; STA $4014; JMP $8005
        let program = [0xA9, 0x02, 0x8D, 0x14, 0x40, 0x4C, 0x05, 0x80];
        let mut nes = Nes::new(cart(&program, &[0x40], &[0x40]));
        nes.cpu.bus.ram[0x200] = 0x42;

        while !nes.cpu.bus.dma.active {
            nes.clock(&mut ()).unwrap();
        }
        let start = nes.cpu.bus.cycles;
        while nes.cpu.bus.dma.active {
            nes.clock(&mut ()).unwrap();
        }
        // Three cycles left over from STA absolute, then the transfer itself. The write lands
        // on cycle 5 (LDA takes 0-1, STA 2-5), so the alignment cycle is added.
        let stalled = nes.cpu.bus.cycles - start;
        assert_eq!(stalled, 3 + 514);
        assert_eq!(nes.cpu.bus.ppu.oam[0], 0x42);
    }

    /// Cycles from the instruction that starts OAM DMA until the transfer ends.
    fn dma_stall(program: &[u8]) -> u64 {
        let mut nes = Nes::new(cart(program, &[0x40], &[0x40]));
        while !nes.cpu.bus.dma.active {
            nes.clock(&mut ()).unwrap();
        }
        let start = nes.cpu.bus.cycles;
        while nes.cpu.bus.dma.active {
            nes.clock(&mut ()).unwrap();
        }
        nes.cpu.bus.cycles - start
    }

    #[test]
    fn dma_alignment_follows_the_write_cycle() {
        // LDX #$14; STA $4000,X: five cycles, write on cycle 6.
        let indexed = dma_stall(&[0xA2, 0x14, 0x9D, 0x00, 0x40, 0x4C, 0x05, 0x80]);
        // LDX #$14; STA $4014: four cycles, write on cycle 5.
        let absolute = dma_stall(&[0xA2, 0x14, 0x8D, 0x14, 0x40, 0x4C, 0x05, 0x80]);

        assert_eq!(indexed, 4 + 513);
        assert_eq!(absolute, 3 + 514);
    }

    #[test]
    fn full_audio_blocks_go_to_sink() {
        let config = Config {
            sample_rate: 44_100,
            audio_block: 256,
        };
        let mut nes = Nes::with_config(spin(), config);
        let mut sink = Vec::new();

        nes.run_frame(&mut sink).unwrap();
        assert_eq!(sink.len(), 512);
        assert!(nes.cpu.bus.apu.samples.len() < 256);
    }

    #[test]
    fn buttons_reach_controller_port() {
        // LDA #$01; STA $4016; LDA $4016; STA $10; JMP $800A
        let program = [
            0xA9, 0x01, 0x8D, 0x16, 0x40, 0xAD, 0x16, 0x40, 0x85, 0x10, 0x4C, 0x0A, 0x80,
        ];
        let mut nes = Nes::new(cart(&program, &[0x40], &[0x40]));
        nes.set_buttons(0, BUTTON_START | 0x01);
        nes.set_buttons(5, 0xFF);

        nes.run_frame(&mut ()).unwrap();
        assert_eq!(nes.cpu.bus.ram[0x10] & 1, 1);
    }

    #[test]
    fn reset_reloads_vector_and_clears_clock() {
        let mut nes = Nes::new(spin());
        nes.run_frame(&mut ()).unwrap();
        nes.reset();

        assert_eq!(nes.cpu.pc, 0x8000);
        assert_eq!(nes.cpu.sp, 0xFD);
        assert_eq!(nes.master_clock(), 0);
        assert_eq!(nes.cpu.bus.cycles, 0);
    }
}
