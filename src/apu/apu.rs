//! NES APU (Audio Processing Unit) implementation.
//!
//! Implements the [APU](https://www.nesdev.org/wiki/APU) as in the Ricoh 2A03: five channels (pulse×2,
//! triangle, noise, DMC), [frame counter](https://www.nesdev.org/wiki/APU_Frame_Counter) (4-step or
//! 5-step), and [APU Mixer](https://www.nesdev.org/wiki/APU_Mixer) (non-linear). Registers $4000–$4013,
//! $4015, $4017.
//!
//! ## Timing
//!
//! - [`APU::step`] is one CPU cycle. Pulse timers run every other step, triangle/noise/DMC every step.
//! - The frame sequencer advances one step every 7457 CPU cycles (~240 Hz).
//! - DMC sample fetches read PRG through the cartridge and report a 4-cycle CPU stall.
//! - One output sample is mixed every `CPU clock / sample rate` cycles into a [`SampleBuffer`].

use tracing::trace;

use crate::apu::channels::{Dmc, Noise, Pulse, Triangle};
use crate::apu::tables::{CPU_CLOCK_HZ, FRAME_SEQUENCER_PERIOD, Mixer};
use crate::cartridge::cartridge::Cartridge;
use crate::config::Config;

/// Consumer of finished audio blocks. `queue` may block until the device has room.
pub trait AudioSink {
    fn queue(&mut self, samples: &[f32]);
}

/// Collects every block; handy for tests and offline rendering.
impl AudioSink for Vec<f32> {
    fn queue(&mut self, samples: &[f32]) {
        self.extend_from_slice(samples);
    }
}

/// Discards audio.
impl AudioSink for () {
    fn queue(&mut self, _samples: &[f32]) {}
}

/// Fixed-capacity block of mixed samples. Once full it must be drained before the APU can step.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    capacity: usize,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a sample. Returns `false` and leaves the block untouched when it is already full;
    /// callers drain with [`SampleBuffer::flush`] before producing more.
    pub fn push(&mut self, sample: f32) -> bool {
        if self.is_full() {
            return false;
        }
        self.samples.push(sample);
        true
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Hands the block to `sink` and empties it.
    pub fn flush(&mut self, sink: &mut impl AudioSink) {
        sink.queue(&self.samples);
        self.samples.clear();
    }
}

/// APU state: pulse×2, triangle, noise, DMC; frame sequencer; output sample block.
pub struct APU {
    pub pulse1: Pulse,
    pub pulse2: Pulse,
    pub triangle: Triangle,
    pub noise: Noise,
    pub dmc: Dmc,
    pub frame_irq: bool,
    pub samples: SampleBuffer,
    mixer: Mixer,
    five_step: bool,
    irq_inhibit: bool,
    sequencer_divider: u32,
    sequencer_step: u8,
    cycle: u64,
    cycles_per_sample: f64,
    sample_phase: f64,
}

impl Default for APU {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl APU {
    pub fn new(config: &Config) -> Self {
        Self {
            pulse1: Pulse::new(true),
            pulse2: Pulse::new(false),
            triangle: Triangle::default(),
            noise: Noise::default(),
            dmc: Dmc::default(),
            frame_irq: false,
            samples: SampleBuffer::new(config.audio_block),
            mixer: Mixer::new(),
            five_step: false,
            irq_inhibit: false,
            sequencer_divider: 0,
            sequencer_step: 0,
            cycle: 0,
            cycles_per_sample: CPU_CLOCK_HZ / config.sample_rate.max(1) as f64,
            sample_phase: 0.0,
        }
    }

    /// Write to APU registers. Undefined addresses ($4009, $400D, $4014, $4016) are ignored.
    pub fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x4000 => self.pulse1.write_control(data),
            0x4001 => self.pulse1.write_sweep(data),
            0x4002 => self.pulse1.write_timer_low(data),
            0x4003 => self.pulse1.write_timer_high(data),
            0x4004 => self.pulse2.write_control(data),
            0x4005 => self.pulse2.write_sweep(data),
            0x4006 => self.pulse2.write_timer_low(data),
            0x4007 => self.pulse2.write_timer_high(data),
            0x4008 => self.triangle.write_linear(data),
            0x400A => self.triangle.write_timer_low(data),
            0x400B => self.triangle.write_timer_high(data),
            0x400C => self.noise.write_control(data),
            0x400E => self.noise.write_period(data),
            0x400F => self.noise.write_length(data),
            0x4010 => self.dmc.write_control(data),
            0x4011 => self.dmc.write_level(data),
            0x4012 => self.dmc.write_address(data),
            0x4013 => self.dmc.write_length(data),
            0x4015 => self.write_status(data),
            0x4017 => self.write_frame_counter(data),
            _ => {}
        }
    }

    /// $4015 write: per-channel enables (bits 0–4). Always acknowledges the DMC IRQ.
    fn write_status(&mut self, data: u8) {
        self.pulse1.set_enabled(data & 0x01 != 0);
        self.pulse2.set_enabled(data & 0x02 != 0);
        self.triangle.set_enabled(data & 0x04 != 0);
        self.noise.set_enabled(data & 0x08 != 0);
        self.dmc.irq = false;
        self.dmc.set_enabled(data & 0x10 != 0);
    }

    /// $4017 write: sequencer mode (bit 7) and IRQ inhibit (bit 6). Restarts the sequence; 5-step
    /// mode also clocks a quarter and a half frame at once.
    fn write_frame_counter(&mut self, data: u8) {
        self.five_step = data & 0x80 != 0;
        self.irq_inhibit = data & 0x40 != 0;
        if self.irq_inhibit {
            self.frame_irq = false;
        }
        self.sequencer_divider = 0;
        self.sequencer_step = 0;
        if self.five_step {
            self.clock_quarter_frame();
            self.clock_half_frame();
        }
    }

    /// Read $4015: bits 0–3 = length counter > 0 for pulse1, pulse2, triangle, noise; bit 4 = DMC
    /// has bytes remaining; bit 6 = frame IRQ; bit 7 = DMC IRQ. Clears the frame IRQ.
    pub fn read_status(&mut self) -> u8 {
        let mut status = 0;
        if self.pulse1.length.value > 0 {
            status |= 0x01;
        }
        if self.pulse2.length.value > 0 {
            status |= 0x02;
        }
        if self.triangle.length.value > 0 {
            status |= 0x04;
        }
        if self.noise.length.value > 0 {
            status |= 0x08;
        }
        if self.dmc.active() {
            status |= 0x10;
        }
        if self.frame_irq {
            status |= 0x40;
        }
        if self.dmc.irq {
            status |= 0x80;
        }
        self.frame_irq = false;
        status
    }

    /// Frame or DMC interrupt is asserted.
    pub fn irq_pending(&self) -> bool {
        self.frame_irq || self.dmc.irq
    }

    /// Envelopes and the triangle linear counter.
    fn clock_quarter_frame(&mut self) {
        self.pulse1.envelope.clock();
        self.pulse2.envelope.clock();
        self.noise.envelope.clock();
        self.triangle.clock_linear();
    }

    /// Length counters and sweep units.
    fn clock_half_frame(&mut self) {
        self.pulse1.length.clock();
        self.pulse2.length.clock();
        self.triangle.length.clock();
        self.noise.length.clock();
        self.pulse1.clock_sweep();
        self.pulse2.clock_sweep();
    }

    fn clock_sequencer(&mut self) {
        if self.five_step {
            match self.sequencer_step {
                0 | 2 => self.clock_quarter_frame(),
                1 | 4 => {
                    self.clock_quarter_frame();
                    self.clock_half_frame();
                }
                _ => {}
            }
            self.sequencer_step = (self.sequencer_step + 1) % 5;
        } else {
            self.clock_quarter_frame();
            if self.sequencer_step & 1 == 1 {
                self.clock_half_frame();
            }
            if self.sequencer_step == 3 && !self.irq_inhibit {
                self.frame_irq = true;
            }
            self.sequencer_step = (self.sequencer_step + 1) % 4;
        }
    }

    /// Current mixed output in 0.0..=1.0.
    pub fn output(&self) -> f32 {
        self.mixer.mix(
            self.pulse1.output(),
            self.pulse2.output(),
            self.triangle.output(),
            self.noise.output(),
            self.dmc.output(),
        )
    }

    /// Advance one CPU cycle. Returns the CPU stall caused by a DMC sample fetch (0 or 4).
    ///
    /// [`APU::samples`] applies backpressure: once it is full the caller must drain it before the
    /// next step. Stepping a full block refuses the new sample.
    pub fn step(&mut self, cart: &Cartridge) -> u8 {
        self.cycle += 1;
        if self.cycle % 2 == 0 {
            self.pulse1.clock_timer();
            self.pulse2.clock_timer();
        }
        self.triangle.clock_timer();
        self.noise.clock_timer();
        let stall = self.dmc.clock(cart);

        self.sequencer_divider += 1;
        if self.sequencer_divider >= FRAME_SEQUENCER_PERIOD {
            self.sequencer_divider = 0;
            self.clock_sequencer();
        }

        self.sample_phase += 1.0;
        if self.sample_phase >= self.cycles_per_sample {
            self.sample_phase -= self.cycles_per_sample;
            let sample = self.output();
            if !self.samples.push(sample) {
                trace!("sample block full, sample refused");
            }
        }
        stall
    }
}
