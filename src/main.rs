//! NES emulator entry point.
//!
//! Loads a cartridge and runs it in a window with keyboard input and audio.
//! Usage: famicore [OPTIONS] <ROM>

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use ansi_term::Colour::Red;
use anyhow::{Context, anyhow};
use clap::Parser;
use famicore::{
    AudioSink, Cartridge, Config, Nes,
    controller::{
        BUTTON_A, BUTTON_B, BUTTON_DOWN, BUTTON_LEFT, BUTTON_RIGHT, BUTTON_SELECT, BUTTON_START,
        BUTTON_UP,
    },
    ppu::{
        palette::rgba_to_rgb,
        ppu::{HEIGHT, WIDTH},
    },
};
use minifb::{Key, Scale, Window, WindowOptions};
use rodio::{OutputStream, Sink, buffer::SamplesBuffer};
use tracing::{Level, info};

/// Blocks queued in the audio device before the emulator waits for it to drain.
const MAX_QUEUED_BLOCKS: usize = 2;

/// Keyboard layout for controller 1.
const KEYMAP: [(Key, u8); 8] = [
    (Key::X, BUTTON_A),
    (Key::Z, BUTTON_B),
    (Key::RightShift, BUTTON_SELECT),
    (Key::Enter, BUTTON_START),
    (Key::Up, BUTTON_UP),
    (Key::Down, BUTTON_DOWN),
    (Key::Left, BUTTON_LEFT),
    (Key::Right, BUTTON_RIGHT),
];

/// NES emulator
#[derive(Parser, Debug)]
#[command(name = "famicore", version, about)]
struct Args {
    /// Path to the iNES ROM file
    rom: PathBuf,

    /// Window scale (1, 2, 4 or 8)
    #[arg(short, long, default_value_t = 2)]
    scale: u8,

    /// Run without audio; frames are paced by the window instead
    #[arg(short, long)]
    mute: bool,

    /// Log every CPU instruction in nestest format
    #[arg(long)]
    trace: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Audio sink that hands blocks to rodio and waits while the device is behind.
struct Speaker {
    sink: Sink,
    sample_rate: u32,
    _stream: OutputStream,
}

impl Speaker {
    fn new(sample_rate: u32) -> anyhow::Result<Self> {
        let (stream, handle) =
            OutputStream::try_default().context("failed to open audio output")?;
        let sink = Sink::try_new(&handle).context("failed to create audio sink")?;
        Ok(Self {
            sink,
            sample_rate,
            _stream: stream,
        })
    }
}

impl AudioSink for Speaker {
    fn queue(&mut self, samples: &[f32]) {
        while self.sink.len() > MAX_QUEUED_BLOCKS {
            thread::sleep(Duration::from_millis(1));
        }
        self.sink
            .append(SamplesBuffer::new(1, self.sample_rate, samples.to_vec()));
    }
}

fn main() {
    let args = Args::parse();
    init_logging(&args);

    if let Err(err) = run(&args) {
        eprintln!("{}: {err:#}", Red.bold().paint("ERROR"));
        std::process::exit(1);
    }
}

fn init_logging(args: &Args) {
    let level = match (args.trace, args.verbose) {
        (true, _) => Level::TRACE,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, _) => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> anyhow::Result<()> {
    let cart = Cartridge::load(&args.rom)
        .with_context(|| format!("failed to load {}", args.rom.display()))?;
    let config = Config::default();
    let mut nes = Nes::with_config(cart, config);

    let scale = match args.scale {
        1 => Scale::X1,
        2 => Scale::X2,
        4 => Scale::X4,
        8 => Scale::X8,
        _ => Scale::FitScreen,
    };
    let mut window = Window::new(
        "famicore",
        WIDTH,
        HEIGHT,
        WindowOptions {
            resize: true,
            scale,
            scale_mode: minifb::ScaleMode::AspectRatioStretch,
            ..WindowOptions::default()
        },
    )
    .map_err(|err| anyhow!("failed to create window: {err}"))?;

    let mut speaker = if args.mute {
        None
    } else {
        Some(Speaker::new(config.sample_rate)?)
    };
    if speaker.is_none() {
        window.set_target_fps(60);
    }
    info!(rom = %args.rom.display(), audio = speaker.is_some(), "running");

    let mut pixels = vec![0u32; WIDTH * HEIGHT];
    while window.is_open() && !window.is_key_down(Key::Escape) {
        let buttons = KEYMAP
            .iter()
            .filter(|(key, _)| window.is_key_down(*key))
            .fold(0, |state, (_, button)| state | button);
        nes.set_buttons(0, buttons);
        if window.is_key_down(Key::R) {
            nes.reset();
        }

        match speaker.as_mut() {
            Some(speaker) => nes.run_frame(speaker)?,
            None => nes.run_frame(&mut ())?,
        }

        for (out, &color) in pixels.iter_mut().zip(nes.frame()) {
            *out = rgba_to_rgb(color);
        }
        window
            .update_with_buffer(&pixels, WIDTH, HEIGHT)
            .map_err(|err| anyhow!("failed to update window: {err}"))?;
    }
    Ok(())
}
