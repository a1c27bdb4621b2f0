// Desktop tooling crate: unwrap/expect/panic acceptable in non-embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]
#![allow(missing_docs)]

mod check;
mod extract;
mod test;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Fault-dump firmware development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a serial capture into colourised log lines and crash dumps
    Extract {
        /// Capture file, or `-` for stdin (e.g. piped from a serial terminal)
        capture: PathBuf,
        /// Firmware ELF; when given, each dump is backtraced with GDB + CrashDebug
        #[arg(short, long)]
        elf: Option<PathBuf>,
        /// Where each dump is written
        #[arg(short, long, default_value = extract::DEFAULT_DUMP_FILE)]
        out: PathBuf,
        /// CrashDebug executable
        #[arg(long, default_value = extract::default_crash_debug())]
        crash_debug: PathBuf,
        /// Keep full file paths in log lines
        #[arg(long)]
        full: bool,
    },
    /// Check firmware builds for the hardware target and the host crates
    Check,
    /// Run all host tests (unit, integration, and doc)
    Test {
        /// Run only unit tests
        #[arg(long)]
        unit: bool,
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            capture,
            elf,
            out,
            crash_debug,
            full,
        } => extract::run(
            &capture,
            &extract::Options {
                out,
                elf,
                crash_debug,
                full,
            },
        ),
        Commands::Check => check::run(),
        Commands::Test { unit, integration } => test::run(unit, integration),
    }
}
