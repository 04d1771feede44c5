//! APU tone generators and the units they share.
//!
//! Registers per channel (see [APU registers](https://www.nesdev.org/wiki/APU_registers)):
//! pulse 1 $4000–$4003, pulse 2 $4004–$4007, triangle $4008–$400B, noise $400C–$400F,
//! DMC $4010–$4013.

use crate::apu::tables::{
    DMC_RATE_TABLE, DUTY_TABLE, LENGTH_TABLE, NOISE_PERIOD_TABLE, TRIANGLE_SEQUENCE,
};
use crate::cartridge::cartridge::Cartridge;

/// CPU cycles the DMC steals for each sample byte it fetches.
pub const DMC_FETCH_STALL: u8 = 4;

/// Volume envelope shared by the pulse and noise channels.
#[derive(Debug, Default, Clone, Copy)]
pub struct Envelope {
    pub start: bool,
    pub looping: bool,
    pub constant: bool,
    /// Divider period, doubling as the constant volume.
    pub period: u8,
    pub decay: u8,
    divider: u8,
}

impl Envelope {
    fn write(&mut self, data: u8) {
        self.looping = data & 0x20 != 0;
        self.constant = data & 0x10 != 0;
        self.period = data & 0x0F;
    }

    /// Quarter-frame clock.
    pub fn clock(&mut self) {
        if self.start {
            self.start = false;
            self.decay = 15;
            self.divider = self.period;
            return;
        }
        if self.divider > 0 {
            self.divider -= 1;
            return;
        }
        self.divider = self.period;
        if self.decay > 0 {
            self.decay -= 1;
        } else if self.looping {
            self.decay = 15;
        }
    }

    pub fn volume(&self) -> u8 {
        if self.constant { self.period } else { self.decay }
    }
}

/// Length counter: silences its channel when it reaches zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct LengthCounter {
    pub halted: bool,
    pub value: u8,
}

impl LengthCounter {
    fn load(&mut self, index: u8) {
        self.value = LENGTH_TABLE[(index & 0x1F) as usize];
    }

    /// Half-frame clock.
    pub fn clock(&mut self) {
        if !self.halted && self.value > 0 {
            self.value -= 1;
        }
    }
}

/// Pulse sweep unit.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sweep {
    pub enabled: bool,
    pub negate: bool,
    pub shift: u8,
    pub period: u8,
    pub reload: bool,
    divider: u8,
    /// Pulse 1 negates with one's complement, so it subtracts one extra.
    ones_complement: bool,
}

impl Sweep {
    fn write(&mut self, data: u8) {
        self.enabled = data & 0x80 != 0;
        self.period = (data >> 4) & 0x07;
        self.negate = data & 0x08 != 0;
        self.shift = data & 0x07;
        self.reload = true;
    }

    /// Period the sweep would move the timer to.
    pub fn target(&self, timer_period: u16) -> u16 {
        let delta = timer_period >> self.shift;
        if self.negate {
            timer_period.saturating_sub(delta + self.ones_complement as u16)
        } else {
            timer_period + delta
        }
    }

    /// Half-frame clock. Adjusts `timer_period` when the divider expires.
    fn clock(&mut self, timer_period: &mut u16) {
        if self.divider == 0 && self.enabled && self.shift > 0 && !self.mutes(*timer_period) {
            *timer_period = self.target(*timer_period);
        }
        if self.divider == 0 || self.reload {
            self.divider = self.period;
            self.reload = false;
        } else {
            self.divider -= 1;
        }
    }

    /// Periods below 8, or a sweep target past 11 bits, silence the channel.
    fn mutes(&self, timer_period: u16) -> bool {
        timer_period < 8 || self.target(timer_period) > 0x7FF
    }
}

/// Square-wave channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct Pulse {
    pub enabled: bool,
    pub duty: u8,
    pub timer_period: u16,
    pub envelope: Envelope,
    pub length: LengthCounter,
    pub sweep: Sweep,
    step: u8,
    timer: u16,
}

impl Pulse {
    /// `first` selects pulse 1's one's-complement sweep negation.
    pub fn new(first: bool) -> Self {
        Self {
            sweep: Sweep {
                ones_complement: first,
                ..Sweep::default()
            },
            ..Self::default()
        }
    }

    /// $4000/$4004: duty, length halt / envelope loop, constant volume, volume/period.
    pub fn write_control(&mut self, data: u8) {
        self.duty = data >> 6;
        self.length.halted = data & 0x20 != 0;
        self.envelope.write(data);
    }

    /// $4001/$4005.
    pub fn write_sweep(&mut self, data: u8) {
        self.sweep.write(data);
    }

    /// $4002/$4006: timer low 8 bits.
    pub fn write_timer_low(&mut self, data: u8) {
        self.timer_period = (self.timer_period & 0x0700) | data as u16;
    }

    /// $4003/$4007: length load and timer high 3 bits; restarts the envelope and the duty cycle.
    pub fn write_timer_high(&mut self, data: u8) {
        self.timer_period = (self.timer_period & 0x00FF) | ((data & 0x07) as u16) << 8;
        if self.enabled {
            self.length.load(data >> 3);
        }
        self.envelope.start = true;
        self.step = 0;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.length.value = 0;
        }
    }

    /// Clocked every other CPU cycle.
    pub fn clock_timer(&mut self) {
        if self.timer > 0 {
            self.timer -= 1;
        } else {
            self.timer = self.timer_period;
            self.step = (self.step + 1) & 7;
        }
    }

    pub fn clock_sweep(&mut self) {
        self.sweep.clock(&mut self.timer_period);
    }

    pub fn output(&self) -> u8 {
        if !self.enabled
            || self.length.value == 0
            || DUTY_TABLE[self.duty as usize][self.step as usize] == 0
            || self.sweep.mutes(self.timer_period)
        {
            return 0;
        }
        self.envelope.volume()
    }
}

/// Triangle channel. No volume control; gated by both a length and a linear counter.
#[derive(Debug, Default, Clone, Copy)]
pub struct Triangle {
    pub enabled: bool,
    /// $4008 bit 7: halts the length counter and keeps the linear reload flag set.
    pub control: bool,
    pub linear_period: u8,
    pub linear_counter: u8,
    pub linear_reload: bool,
    pub timer_period: u16,
    pub length: LengthCounter,
    step: u8,
    timer: u16,
}

impl Triangle {
    /// $4008.
    pub fn write_linear(&mut self, data: u8) {
        self.control = data & 0x80 != 0;
        self.length.halted = self.control;
        self.linear_period = data & 0x7F;
    }

    /// $400A.
    pub fn write_timer_low(&mut self, data: u8) {
        self.timer_period = (self.timer_period & 0x0700) | data as u16;
    }

    /// $400B: length load and timer high 3 bits; sets the linear reload flag.
    pub fn write_timer_high(&mut self, data: u8) {
        self.timer_period = (self.timer_period & 0x00FF) | ((data & 0x07) as u16) << 8;
        if self.enabled {
            self.length.load(data >> 3);
        }
        self.linear_reload = true;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.length.value = 0;
        }
    }

    /// Clocked every CPU cycle. The sequencer only moves while both counters are non-zero.
    pub fn clock_timer(&mut self) {
        if self.timer > 0 {
            self.timer -= 1;
            return;
        }
        self.timer = self.timer_period;
        if self.length.value > 0 && self.linear_counter > 0 {
            self.step = (self.step + 1) & 31;
        }
    }

    /// Quarter-frame clock.
    pub fn clock_linear(&mut self) {
        if self.linear_reload {
            self.linear_counter = self.linear_period;
        } else if self.linear_counter > 0 {
            self.linear_counter -= 1;
        }
        if !self.control {
            self.linear_reload = false;
        }
    }

    pub fn output(&self) -> u8 {
        // Periods under 2 are ultrasonic and only produce popping.
        if !self.enabled || self.length.value == 0 || self.linear_counter == 0 || self.timer_period < 2 {
            return 0;
        }
        TRIANGLE_SEQUENCE[self.step as usize]
    }
}

/// Noise channel: 15-bit LFSR.
#[derive(Debug, Clone, Copy)]
pub struct Noise {
    pub enabled: bool,
    /// Short mode: feedback from bit 6 instead of bit 1.
    pub mode: bool,
    pub timer_period: u16,
    pub envelope: Envelope,
    pub length: LengthCounter,
    pub shift: u16,
    timer: u16,
}

impl Default for Noise {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: false,
            timer_period: NOISE_PERIOD_TABLE[0],
            envelope: Envelope::default(),
            length: LengthCounter::default(),
            shift: 1,
            timer: 0,
        }
    }
}

impl Noise {
    /// $400C.
    pub fn write_control(&mut self, data: u8) {
        self.length.halted = data & 0x20 != 0;
        self.envelope.write(data);
    }

    /// $400E: mode (bit 7) and period index (bits 0–3).
    pub fn write_period(&mut self, data: u8) {
        self.mode = data & 0x80 != 0;
        self.timer_period = NOISE_PERIOD_TABLE[(data & 0x0F) as usize];
    }

    /// $400F: length load; restarts the envelope.
    pub fn write_length(&mut self, data: u8) {
        if self.enabled {
            self.length.load(data >> 3);
        }
        self.envelope.start = true;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.length.value = 0;
        }
    }

    /// Clocked every CPU cycle.
    pub fn clock_timer(&mut self) {
        if self.timer > 0 {
            self.timer -= 1;
            return;
        }
        self.timer = self.timer_period;
        let tap = if self.mode { 6 } else { 1 };
        let feedback = (self.shift ^ (self.shift >> tap)) & 1;
        self.shift = (self.shift >> 1) | (feedback << 14);
    }

    pub fn output(&self) -> u8 {
        if !self.enabled || self.length.value == 0 || self.shift & 1 != 0 {
            return 0;
        }
        self.envelope.volume()
    }
}

/// Delta-modulation sample channel. Sample bytes are read from cartridge space at $8000–$FFFF.
#[derive(Debug, Clone, Copy)]
pub struct Dmc {
    pub irq_enabled: bool,
    pub looping: bool,
    /// Set when a non-looping sample finishes with IRQs enabled.
    pub irq: bool,
    /// 7-bit output level.
    pub level: u8,
    pub rate: u16,
    pub sample_addr: u16,
    pub sample_len: u16,
    pub current_addr: u16,
    pub bytes_remaining: u16,
    buffer: Option<u8>,
    shifter: u8,
    bits_remaining: u8,
    silence: bool,
    timer: u16,
}

impl Default for Dmc {
    fn default() -> Self {
        Self {
            irq_enabled: false,
            looping: false,
            irq: false,
            level: 0,
            rate: DMC_RATE_TABLE[0],
            sample_addr: 0xC000,
            sample_len: 1,
            current_addr: 0xC000,
            bytes_remaining: 0,
            buffer: None,
            shifter: 0,
            bits_remaining: 0,
            silence: true,
            timer: 0,
        }
    }
}

impl Dmc {
    /// $4010: IRQ enable, loop, rate index. Clearing IRQ enable acknowledges a pending DMC IRQ.
    pub fn write_control(&mut self, data: u8) {
        self.irq_enabled = data & 0x80 != 0;
        if !self.irq_enabled {
            self.irq = false;
        }
        self.looping = data & 0x40 != 0;
        self.rate = DMC_RATE_TABLE[(data & 0x0F) as usize];
    }

    /// $4011: direct load of the output level.
    pub fn write_level(&mut self, data: u8) {
        self.level = data & 0x7F;
    }

    /// $4012: sample address = $C000 + data × 64.
    pub fn write_address(&mut self, data: u8) {
        self.sample_addr = 0xC000 | (data as u16) << 6;
    }

    /// $4013: sample length = data × 16 + 1 bytes.
    pub fn write_length(&mut self, data: u8) {
        self.sample_len = (data as u16) << 4 | 1;
    }

    /// $4015 bit 4: stop the sample, or start it if none is playing.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.bytes_remaining = 0;
        } else if self.bytes_remaining == 0 {
            self.restart();
        }
    }

    pub fn active(&self) -> bool {
        self.bytes_remaining > 0
    }

    fn restart(&mut self) {
        self.current_addr = self.sample_addr;
        self.bytes_remaining = self.sample_len;
    }

    /// One CPU cycle. Returns the cycles the CPU must stall for a sample fetch, if one happened.
    pub fn clock(&mut self, cart: &Cartridge) -> u8 {
        let stall = if self.buffer.is_none() && self.bytes_remaining > 0 {
            self.fetch(cart)
        } else {
            0
        };

        if self.timer > 0 {
            self.timer -= 1;
            return stall;
        }
        self.timer = self.rate - 1;

        if !self.silence {
            if self.shifter & 1 != 0 {
                if self.level <= 125 {
                    self.level += 2;
                }
            } else if self.level >= 2 {
                self.level -= 2;
            }
        }
        self.shifter >>= 1;

        if self.bits_remaining > 0 {
            self.bits_remaining -= 1;
        }
        if self.bits_remaining == 0 {
            self.bits_remaining = 8;
            match self.buffer.take() {
                Some(byte) => {
                    self.shifter = byte;
                    self.silence = false;
                }
                None => self.silence = true,
            }
        }
        stall
    }

    fn fetch(&mut self, cart: &Cartridge) -> u8 {
        self.buffer = Some(cart.read(self.current_addr).unwrap_or(0));
        self.current_addr = if self.current_addr == 0xFFFF {
            0x8000
        } else {
            self.current_addr + 1
        };

        self.bytes_remaining -= 1;
        if self.bytes_remaining == 0 {
            if self.looping {
                self.restart();
            } else if self.irq_enabled {
                self.irq = true;
            }
        }
        DMC_FETCH_STALL
    }

    pub fn output(&self) -> u8 {
        self.level
    }
}
