//! Runs a raw 6502 test image (Klaus Dormann's functional test by default)
//! on the cycle-stepped core and reports whether it reached its success
//! trap.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use emu_core::SimpleBus;
use log::{error, info, warn};
use mos_6502::{Mos6502, RESET_VECTOR};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

mod harness;
mod image;

use harness::{Limits, Outcome};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Raw binary image to load
    rom: PathBuf,

    /// Load address of the image
    #[arg(long, default_value = "0000", value_parser = parse_hex)]
    origin: u16,

    /// Entry point, written to the reset vector
    #[arg(long, default_value = "0400", value_parser = parse_hex)]
    start: u16,

    /// Address whose execution means the test passed
    #[arg(long, default_value = "3469", value_parser = parse_hex)]
    success: u16,

    /// Write one trace line per instruction to this file
    #[arg(long, value_name = "FILE")]
    trace: Option<PathBuf>,

    /// Give up after this many instructions
    #[arg(long, default_value_t = 100_000_000)]
    max_instructions: u64,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging from the CPU core
    #[arg(short, long)]
    verbose: bool,
}

/// Parse a 16-bit address written in hex, with an optional `$` or `0x`.
fn parse_hex(text: &str) -> Result<u16, String> {
    let digits = text
        .strip_prefix('$')
        .or_else(|| text.strip_prefix("0x"))
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid address '{text}': {e}"))
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let log_level = if args.verbose {
        LevelFilter::Trace
    } else if args.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    let data = std::fs::read(&args.rom)
        .with_context(|| format!("Failed to read {}", args.rom.display()))?;
    info!(
        "Loaded {} ({} bytes) at ${:04X}",
        args.rom.display(),
        data.len(),
        args.origin
    );

    let mut bus = SimpleBus::new();
    image::load(&mut bus, args.origin, &data).context("Failed to load image")?;
    bus.poke_word(RESET_VECTOR, args.start);

    let mut cpu = Mos6502::new(bus);

    let mut trace_file = match &args.trace {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create trace file {}", path.display()))?;
            info!("Tracing to {}", path.display());
            Some(BufWriter::new(file))
        }
        None => None,
    };

    let limits = Limits {
        success: args.success,
        max_instructions: args.max_instructions,
        timeout: Duration::from_secs(args.timeout),
    };

    info!(
        "Starting at ${:04X}, success at ${:04X}",
        args.start, args.success
    );
    let report = harness::run(
        &mut cpu,
        &limits,
        trace_file.as_mut().map(|w| w as &mut dyn Write),
    )
    .context("Failed to write trace")?;

    if let Some(mut file) = trace_file {
        file.flush().context("Failed to flush trace")?;
    }

    info!(
        "{} instructions, {} cycles in {:.2?} ({:.2} MHz)",
        report.instructions,
        report.cycles,
        report.elapsed,
        report.mhz()
    );

    let regs = cpu.registers();
    match report.outcome {
        Outcome::Success => {
            info!("SUCCESS: reached ${:04X}", args.success);
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Trapped { pc } => {
            error!("TRAP at ${pc:04X}");
            error!(
                "A=${:02X} X=${:02X} Y=${:02X} SP=${:02X} P=${:02X}",
                regs.a, regs.x, regs.y, regs.s, regs.p.0
            );
            let start = pc.saturating_sub(8);
            let bytes: Vec<String> = (0..16u16)
                .map(|i| format!("{:02X}", cpu.bus().peek(start.wrapping_add(i))))
                .collect();
            error!("Memory at ${start:04X}: {}", bytes.join(" "));
            Ok(ExitCode::FAILURE)
        }
        Outcome::InstructionLimit => {
            warn!(
                "Gave up after {} instructions at PC=${:04X}",
                args.max_instructions, regs.pc
            );
            Ok(ExitCode::FAILURE)
        }
        Outcome::Timeout => {
            warn!("Timed out after {}s at PC=${:04X}", args.timeout, regs.pc);
            Ok(ExitCode::FAILURE)
        }
    }
}
