//! Emulator-wide settings that are not part of the emulated hardware.

/// Host audio output rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Samples per block handed to the presentation layer.
pub const DEFAULT_AUDIO_BLOCK: usize = 1024;

/// Settings for a [`Nes`](crate::nes::Nes) session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Host sample rate the APU downsamples to.
    pub sample_rate: u32,
    /// Size of the sample block that must be drained before audio continues.
    pub audio_block: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            audio_block: DEFAULT_AUDIO_BLOCK,
        }
    }
}
