use clap::{Parser, Subcommand};
use dmg_core::gb::Emulator;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

mod gui;

#[derive(Parser)]
#[command(name = "dmg-core", version, about = "A cycle-accurate Game Boy (DMG) emulator core")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Loads a ROM and prints its cartridge header, then exits.
    Info { rom: PathBuf },
    /// Runs a ROM in a window.
    Run {
        rom: PathBuf,
        /// Integer upscale factor applied to the 160x144 framebuffer.
        #[arg(long, default_value_t = 3)]
        scale: usize,
    },
    /// Runs a ROM headlessly, scanning its serial output for a Blargg-style
    /// "Passed"/"Failed" banner. Exits 0 on Passed, 1 on Failed or timeout.
    Test {
        rom: PathBuf,
        /// Wall-clock budget before giving up.
        #[arg(long, default_value_t = 60)]
        timeout: u64,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Info { rom } => exit_code(info(&rom)),
        Command::Run { rom, scale } => exit_code(run(&rom, scale)),
        Command::Test { rom, timeout } => test(&rom, Duration::from_secs(timeout)),
    }
}

fn exit_code(result: Result<(), Box<dyn std::error::Error>>) -> ExitCode {
    if let Err(err) = result {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn info(rom: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let emulator = Emulator::from_path(rom)?;
    println!("{}", emulator.bus.cartridge());
    Ok(())
}

fn run(rom: &Path, scale: usize) -> Result<(), Box<dyn std::error::Error>> {
    let emulator = Emulator::from_path(rom)?;
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "dmg-core",
        options,
        Box::new(move |_cc| Ok(Box::new(gui::EmulatorApp::new(emulator, scale)))),
    )
    .map_err(|err| format!("failed to start window: {err}").into())
}

/// Runs headlessly until the serial output contains a Blargg-style
/// "Passed"/"Failed" banner, or until `timeout` elapses.
fn test(rom: &Path, timeout: Duration) -> ExitCode {
    let mut emulator = match Emulator::from_path(rom) {
        Ok(emulator) => emulator,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Err(err) = emulator.run_frame() {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }

        let output = emulator.bus.serial.output();
        if output.contains("Passed") {
            println!("{output}");
            return ExitCode::SUCCESS;
        }
        if output.contains("Failed") {
            println!("{output}");
            return ExitCode::FAILURE;
        }
    }

    eprintln!("timed out after {timeout:?} waiting for test ROM result");
    ExitCode::FAILURE
}
