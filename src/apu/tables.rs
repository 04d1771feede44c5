//! Lookup tables for the APU channels and the non-linear mixer.
//!
//! See [APU Length Counter](https://www.nesdev.org/wiki/APU_Length_Counter),
//! [APU Noise](https://www.nesdev.org/wiki/APU_Noise), [APU DMC](https://www.nesdev.org/wiki/APU_DMC)
//! and [APU Mixer](https://www.nesdev.org/wiki/APU_Mixer).

/// NTSC CPU clock in Hz.
pub const CPU_CLOCK_HZ: f64 = 1_789_773.0;

/// CPU cycles between frame-sequencer steps (~240 Hz).
pub const FRAME_SEQUENCER_PERIOD: u32 = 1_789_773 / 240;

/// Length counter load values, indexed by the 5-bit field of $4003/$4007/$400B/$400F.
pub const LENGTH_TABLE: [u8; 32] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14, 12, 16, 24, 18, 48, 20, 96, 22,
    192, 24, 72, 26, 16, 28, 32, 30,
];

/// Pulse waveforms: 12.5%, 25%, 50%, and 25% negated.
pub const DUTY_TABLE: [[u8; 8]; 4] = [
    [0, 1, 0, 0, 0, 0, 0, 0],
    [0, 1, 1, 0, 0, 0, 0, 0],
    [0, 1, 1, 1, 1, 0, 0, 0],
    [1, 0, 0, 1, 1, 1, 1, 1],
];

/// Triangle ramp: 15 down to 0, then back up.
pub const TRIANGLE_SEQUENCE: [u8; 32] = [
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12,
    13, 14, 15,
];

/// Noise timer periods in CPU cycles.
pub const NOISE_PERIOD_TABLE: [u16; 16] = [
    4, 8, 16, 32, 64, 96, 128, 160, 202, 254, 380, 508, 762, 1016, 2034, 4068,
];

/// DMC output-bit periods in CPU cycles.
pub const DMC_RATE_TABLE: [u16; 16] = [
    428, 380, 340, 320, 286, 254, 226, 214, 190, 160, 142, 128, 106, 84, 72, 54,
];

/// Precomputed mixer curves. `pulse[n]` for n = pulse1 + pulse2 (0..=30),
/// `tnd[n]` for n = 3·triangle + 2·noise + dmc (0..=202).
pub struct Mixer {
    pulse: [f32; 31],
    tnd: [f32; 203],
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mixer {
    pub fn new() -> Self {
        let mut pulse = [0.0; 31];
        for (n, out) in pulse.iter_mut().enumerate().skip(1) {
            *out = 95.52 / (8128.0 / n as f32 + 100.0);
        }
        let mut tnd = [0.0; 203];
        for (n, out) in tnd.iter_mut().enumerate().skip(1) {
            *out = 163.67 / (24329.0 / n as f32 + 100.0);
        }
        Self { pulse, tnd }
    }

    /// Combine channel levels into one sample in 0.0..1.0.
    pub fn mix(&self, pulse1: u8, pulse2: u8, triangle: u8, noise: u8, dmc: u8) -> f32 {
        let p = (pulse1 as usize + pulse2 as usize).min(30);
        let t = (3 * triangle as usize + 2 * noise as usize + dmc as usize).min(202);
        self.pulse[p] + self.tnd[t]
    }
}
