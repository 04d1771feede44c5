use crate::{
    apu::{
        apu::{APU, AudioSink, SampleBuffer},
        channels::{Envelope, Noise},
        tables::FRAME_SEQUENCER_PERIOD,
    },
    cartridge::cartridge::{Cartridge, HEADER_LEN, PRG_BANK_SIZE},
    config::Config,
};

/// NROM cartridge whose PRG is filled with `fill`; DMC samples at $C000 read it back.
fn prg_cart(fill: u8) -> Cartridge {
    let mut rom = vec![0; HEADER_LEN];
    rom[..6].copy_from_slice(&[b'N', b'E', b'S', 0x1A, 1, 0]);
    rom.resize(HEADER_LEN + PRG_BANK_SIZE, fill);
    Cartridge::from_bytes(&rom).unwrap()
}

fn run(apu: &mut APU, cart: &Cartridge, cycles: u32) {
    for _ in 0..cycles {
        apu.step(cart);
    }
}

#[test]
fn pulse_period_below_8_is_silent() {
    let cart = prg_cart(0);
    let mut apu = APU::default();
    apu.write(0x4015, 0x01);
    apu.write(0x4000, 0xBF); // 50% duty, halt, constant volume 15
    apu.write(0x4002, 0x05);
    apu.write(0x4003, 0x08);

    let mut heard = false;
    for _ in 0..200 {
        apu.step(&cart);
        heard |= apu.pulse1.output() > 0;
    }
    assert!(!heard);

    apu.write(0x4002, 0x08);
    for _ in 0..200 {
        apu.step(&cart);
        heard |= apu.pulse1.output() > 0;
    }
    assert!(heard);
}

#[test]
fn sweep_negate_differs_between_pulse_channels() {
    let mut apu = APU::default();
    apu.write(0x4015, 0x03);
    for base in [0x4000, 0x4004] {
        apu.write(base + 1, 0x89); // enabled, divider period 0, negate, shift 1
        apu.write(base + 2, 0x00);
        apu.write(base + 3, 0x01); // period $100
    }

    // 5-step mode clocks a half frame immediately.
    apu.write(0x4017, 0x80);

    assert_eq!(apu.pulse1.timer_period, 0x100 - 0x80 - 1);
    assert_eq!(apu.pulse2.timer_period, 0x100 - 0x80);
}

#[test]
fn sweep_target_past_11_bits_mutes() {
    let cart = prg_cart(0);
    let mut apu = APU::default();
    apu.write(0x4015, 0x01);
    apu.write(0x4000, 0xBF);
    apu.write(0x4001, 0x00); // shift 0 adds the full period
    apu.write(0x4002, 0x00);
    apu.write(0x4003, 0x04 | 0x08); // period $400, target $800

    let mut heard = false;
    for _ in 0..20_000 {
        apu.step(&cart);
        heard |= apu.pulse1.output() > 0;
    }
    assert!(!heard);
}

#[test]
fn envelope_decays_then_holds_or_loops() {
    let mut env = Envelope::default();
    env.start = true;

    env.clock();
    assert_eq!(env.volume(), 15);
    for _ in 0..15 {
        env.clock();
    }
    assert_eq!(env.volume(), 0);
    env.clock();
    assert_eq!(env.volume(), 0);

    env.looping = true;
    env.clock();
    assert_eq!(env.volume(), 15);
}

#[test]
fn envelope_divider_uses_period() {
    let mut env = Envelope::default();
    env.start = true;
    env.period = 2;

    env.clock();
    env.clock();
    env.clock();
    assert_eq!(env.volume(), 15);
    env.clock();
    assert_eq!(env.volume(), 14);

    env.constant = true;
    assert_eq!(env.volume(), 2);
}

#[test]
fn length_counter_clocked_on_half_frames() {
    let cart = prg_cart(0);
    let mut apu = APU::default();
    apu.write(0x4015, 0x01);
    apu.write(0x4003, 0x00); // length index 0 = 10

    assert_eq!(apu.pulse1.length.value, 10);
    run(&mut apu, &cart, 19 * FRAME_SEQUENCER_PERIOD);
    assert_eq!(apu.pulse1.length.value, 1);
    assert_eq!(apu.read_status() & 0x01, 0x01);
    run(&mut apu, &cart, FRAME_SEQUENCER_PERIOD);
    assert_eq!(apu.read_status() & 0x01, 0);
}

#[test]
fn length_load_ignored_while_disabled() {
    let mut apu = APU::default();
    apu.write(0x4003, 0x08);
    apu.write(0x400F, 0x08);
    assert_eq!(apu.read_status() & 0x0F, 0);

    apu.write(0x4015, 0x09);
    apu.write(0x4003, 0x08);
    apu.write(0x400F, 0x08);
    assert_eq!(apu.read_status() & 0x0F, 0x09);

    apu.write(0x4015, 0x00);
    assert_eq!(apu.read_status() & 0x0F, 0);
}

#[test]
fn four_step_sequence_raises_frame_irq() {
    let cart = prg_cart(0);
    let mut apu = APU::default();

    run(&mut apu, &cart, 4 * FRAME_SEQUENCER_PERIOD - 1);
    assert!(!apu.irq_pending());
    apu.step(&cart);
    assert!(apu.irq_pending());

    assert_eq!(apu.read_status() & 0x40, 0x40);
    assert_eq!(apu.read_status() & 0x40, 0);
    assert!(!apu.irq_pending());
}

#[test]
fn frame_irq_suppressed_by_inhibit_and_five_step_mode() {
    let cart = prg_cart(0);

    let mut apu = APU::default();
    apu.write(0x4017, 0x40);
    run(&mut apu, &cart, 8 * FRAME_SEQUENCER_PERIOD);
    assert!(!apu.irq_pending());

    let mut apu = APU::default();
    apu.write(0x4017, 0x80);
    run(&mut apu, &cart, 10 * FRAME_SEQUENCER_PERIOD);
    assert!(!apu.irq_pending());
}

#[test]
fn inhibit_write_clears_pending_frame_irq() {
    let cart = prg_cart(0);
    let mut apu = APU::default();
    run(&mut apu, &cart, 4 * FRAME_SEQUENCER_PERIOD);
    assert!(apu.frame_irq);

    apu.write(0x4017, 0x40);
    assert!(!apu.frame_irq);
}

#[test]
fn triangle_linear_counter_reload() {
    let mut apu = APU::default();
    apu.write(0x4015, 0x04);
    apu.write(0x4008, 0x05);
    apu.write(0x400B, 0x08);

    apu.triangle.clock_linear();
    assert_eq!(apu.triangle.linear_counter, 5);
    apu.triangle.clock_linear();
    assert_eq!(apu.triangle.linear_counter, 4);

    // Control bit keeps the reload flag set.
    apu.write(0x4008, 0x85);
    apu.write(0x400B, 0x08);
    apu.triangle.clock_linear();
    apu.triangle.clock_linear();
    assert_eq!(apu.triangle.linear_counter, 5);
}

#[test]
fn triangle_silent_without_linear_count() {
    let mut apu = APU::default();
    apu.write(0x4015, 0x04);
    apu.write(0x4008, 0x00);
    apu.write(0x400A, 0x40);
    apu.write(0x400B, 0x08);
    apu.triangle.clock_linear();
    assert_eq!(apu.triangle.linear_counter, 0);
    assert_eq!(apu.triangle.output(), 0);
}

#[test]
fn noise_feedback_tap_follows_mode() {
    let mut noise = Noise::default();
    noise.shift = 0b11;
    noise.clock_timer();
    assert_eq!(noise.shift, 0b1);

    let mut noise = Noise::default();
    noise.mode = true;
    noise.shift = 0b11;
    noise.clock_timer();
    assert_eq!(noise.shift, 0x4001);
}

#[test]
fn noise_silent_when_low_bit_set() {
    let mut apu = APU::default();
    apu.write(0x4015, 0x08);
    apu.write(0x400C, 0x1F);
    apu.write(0x400F, 0x08);

    apu.noise.shift = 0x0001;
    assert_eq!(apu.noise.output(), 0);
    apu.noise.shift = 0x0002;
    assert_eq!(apu.noise.output(), 15);
}

#[test]
fn dmc_fetch_stalls_cpu_and_raises_irq() {
    let cart = prg_cart(0xFF);
    let mut apu = APU::default();
    apu.write(0x4010, 0x8F);
    apu.write(0x4012, 0x00);
    apu.write(0x4013, 0x00); // one byte
    apu.write(0x4015, 0x10);
    assert_eq!(apu.read_status() & 0x10, 0x10);

    assert_eq!(apu.step(&cart), 4);
    assert!(apu.dmc.irq);
    assert!(apu.irq_pending());
    assert_eq!(apu.read_status() & 0x90, 0x80);
    assert_eq!(apu.step(&cart), 0);

    apu.write(0x4015, 0x00);
    assert!(!apu.irq_pending());
}

#[test]
fn dmc_loop_restarts_without_irq() {
    let cart = prg_cart(0x00);
    let mut apu = APU::default();
    apu.write(0x4010, 0xCF); // IRQ enabled, loop
    apu.write(0x4012, 0x01);
    apu.write(0x4013, 0x00);
    apu.write(0x4015, 0x10);

    apu.step(&cart);
    assert!(!apu.dmc.irq);
    assert_eq!(apu.dmc.current_addr, 0xC040);
    assert_eq!(apu.dmc.bytes_remaining, 1);
}

#[test]
fn dmc_output_moves_two_per_bit_and_clamps() {
    let cart = prg_cart(0xFF);
    let mut apu = APU::default();
    apu.write(0x4010, 0x0F); // fastest rate, 54 cycles per bit
    apu.write(0x4011, 0x40);
    apu.write(0x4015, 0x10);

    run(&mut apu, &cart, 1 + 54 * 7);
    assert_eq!(apu.dmc.output(), 0x40 + 14);
    run(&mut apu, &cart, 54);
    assert_eq!(apu.dmc.output(), 0x40 + 16);

    let mut apu = APU::default();
    apu.write(0x4010, 0x0F);
    apu.write(0x4011, 0x7D);
    apu.write(0x4015, 0x10);
    run(&mut apu, &cart, 1 + 54 * 8);
    assert_eq!(apu.dmc.output(), 0x7F);
}

#[test]
fn dmc_address_wraps_to_8000() {
    let cart = prg_cart(0);
    let mut apu = APU::default();
    apu.write(0x4012, 0xFF); // $FFC0
    apu.write(0x4013, 0x04); // 65 bytes
    apu.write(0x4015, 0x10);
    apu.dmc.current_addr = 0xFFFF;

    apu.step(&cart);
    assert_eq!(apu.dmc.current_addr, 0x8000);
}

#[test]
fn samples_fill_block_then_stop() {
    let cart = prg_cart(0);
    let config = Config {
        sample_rate: 44_100,
        audio_block: 16,
    };
    let mut apu = APU::new(&config);

    run(&mut apu, &cart, 600);
    assert!(!apu.samples.is_full());
    run(&mut apu, &cart, 100);
    assert!(apu.samples.is_full());
    run(&mut apu, &cart, 1000);
    assert_eq!(apu.samples.len(), 16);

    let mut sink = Vec::new();
    apu.samples.flush(&mut sink);
    assert_eq!(sink.len(), 16);
    assert!(apu.samples.is_empty());
}

#[test]
fn one_second_yields_sample_rate_samples() {
    let cart = prg_cart(0);
    let config = Config {
        sample_rate: 44_100,
        audio_block: 50_000,
    };
    let mut apu = APU::new(&config);
    run(&mut apu, &cart, 1_789_773);
    assert!((44_099..=44_101).contains(&apu.samples.len()));
}

#[test]
fn silent_apu_mixes_to_zero() {
    let cart = prg_cart(0);
    let mut apu = APU::default();
    run(&mut apu, &cart, 100);
    assert!(apu.samples.as_slice().iter().all(|&s| s == 0.0));
}

struct Counter(usize);

impl AudioSink for Counter {
    fn queue(&mut self, samples: &[f32]) {
        self.0 += samples.len();
    }
}

#[test]
fn sample_buffer_flush_hands_block_to_sink() {
    let mut buffer = SampleBuffer::new(4);
    for i in 0..4 {
        assert!(buffer.push(i as f32));
    }
    assert!(buffer.is_full());
    assert!(!buffer.push(4.0));
    assert_eq!(buffer.as_slice(), &[0.0, 1.0, 2.0, 3.0]);

    let mut sink = Counter(0);
    buffer.flush(&mut sink);
    assert_eq!(sink.0, 4);
    assert!(buffer.push(9.0));
    buffer.clear();
    assert!(buffer.is_empty());
}
