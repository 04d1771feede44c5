//! 2A03 audio: five tone generators, the frame sequencer, and the output mixer.
//!
//! - **channels**: two pulse channels (duty, envelope, sweep, length), the triangle (linear +
//!   length counters), LFSR noise, and the DMC, which pulls 1-bit delta samples from cartridge PRG.
//! - **apu**: register file $4000–$4017, the 4/5-step sequencer, IRQs, and [`apu::SampleBuffer`].
//! - **tables**: lookup tables and the non-linear [`tables::Mixer`].

pub mod apu;
pub mod channels;
pub mod tables;

#[cfg(test)]
mod tests;
