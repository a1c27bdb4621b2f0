use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use colored::{Color, ColoredString, Colorize};
use crashdump::{CaptureScanner, CrashDump, LogRecord, ScanEvent};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

/// File CrashDebug reads the dump from.
pub const DEFAULT_DUMP_FILE: &str = "last_crash_dump.txt";

/// CrashDebug binary shipped next to the repository checkout.
pub const fn default_crash_debug() -> &'static str {
    if cfg!(target_os = "macos") {
        "../CrashDebug/osx64/CrashDebug"
    } else {
        "../CrashDebug/lin64/CrashDebug"
    }
}

pub struct Options {
    pub out: PathBuf,
    pub elf: Option<PathBuf>,
    pub crash_debug: PathBuf,
    pub full: bool,
}

pub fn run(capture: &Path, options: &Options) -> Result<()> {
    let stdout = io::stdout();
    let dumps = if capture.as_os_str() == "-" {
        extract(io::stdin().lock(), stdout.lock(), options)?
    } else {
        let file = File::open(capture)
            .with_context(|| format!("Failed to open capture {}", capture.display()))?;
        extract(BufReader::new(file), stdout.lock(), options)?
    };

    if dumps == 0 {
        println!("{}", "No crash dump in capture".dimmed());
    }
    Ok(())
}

/// Echo `input` to `console`, writing every crash dump to `options.out`.
///
/// Returns the number of complete dumps.
pub fn extract<R: BufRead, W: Write>(mut input: R, mut console: W, options: &Options) -> Result<usize> {
    let mut scanner = CaptureScanner::new();
    let mut clock = HostClock::default();
    let mut dumps = 0usize;
    let mut raw = Vec::new();

    loop {
        raw.clear();
        if input.read_until(b'\n', &mut raw).context("Failed to read capture")? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&raw);
        match scanner.feed(&line) {
            ScanEvent::Log(record) => {
                let line = render_record(&record, options.full, Local::now(), &mut clock);
                writeln!(console, "{line}")?;
            }
            ScanEvent::Text(text) => writeln!(console, "{text}")?,
            ScanEvent::DumpStarted => {
                writeln!(console, "{}", "Crash detected, retrieving crash info...".red().bold())?;
            }
            ScanEvent::DumpLine => {}
            ScanEvent::DumpComplete(dump) => {
                dumps += 1;
                save_dump(&dump, &options.out)?;
                report_dump(&dump, &mut console, options)?;
            }
        }
    }

    if let Some(partial) = scanner.finish() {
        save_dump(&partial, &options.out)?;
        writeln!(
            console,
            "{}",
            format!(
                "⚠ Capture ended inside a dump; {} partial lines written to {}",
                partial.lines().len(),
                options.out.display()
            )
            .yellow()
        )?;
    }
    Ok(dumps)
}

fn save_dump(dump: &CrashDump, out: &Path) -> Result<()> {
    let file = File::create(out).with_context(|| format!("Failed to create {}", out.display()))?;
    let mut writer = BufWriter::new(file);
    dump.write_to(&mut writer)
        .with_context(|| format!("Failed to write {}", out.display()))
}

fn report_dump<W: Write>(dump: &CrashDump, console: &mut W, options: &Options) -> Result<()> {
    match dump.to_bytes() {
        Ok(bytes) => writeln!(
            console,
            "{}",
            format!(
                "✓ Crash info retrieved: {} bytes in {}",
                bytes.len(),
                options.out.display()
            )
            .green()
        )?,
        Err(e) => writeln!(console, "{}", format!("⚠ Dump is damaged: {e}").yellow())?,
    }

    let Some(elf) = &options.elf else {
        return Ok(());
    };
    let mut gdb = gdb_command(elf, &options.crash_debug, &options.out);
    writeln!(console, "{}", format!("{gdb:?}").dimmed())?;
    let output = gdb
        .output()
        .context("Failed to run arm-none-eabi-gdb. Is the ARM GNU toolchain installed?")?;
    console.write_all(&output.stdout)?;
    if !output.status.success() {
        console.write_all(&output.stderr)?;
    }
    writeln!(console, "---------")?;
    Ok(())
}

/// GDB batch session that backtraces `dump` through the CrashDebug stub.
pub fn gdb_command(elf: &Path, crash_debug: &Path, dump: &Path) -> Command {
    let mut cmd = Command::new("arm-none-eabi-gdb");
    cmd.arg("--batch")
        .arg("--quiet")
        .arg(elf)
        .arg("-ex")
        .arg("set target-charset ASCII")
        .arg("-ex")
        .arg(format!(
            "target remote | {} --elf {} --dump {}",
            crash_debug.display(),
            elf.display(),
            dump.display()
        ))
        .arg("-ex")
        .arg("set print pretty on")
        .arg("-ex")
        .arg("bt full")
        .arg("-ex")
        .arg("quit");
    cmd
}

/// Message colour for a trace level code.
pub fn level_color(code: u8) -> Option<Color> {
    match code {
        0 => Some(Color::Green),
        2 => Some(Color::Yellow),
        3 | 4 => Some(Color::Red),
        _ => None,
    }
}

/// Colour of the queue-depth field: red above 5, yellow above 2.
pub fn load_color(depth: u32) -> Color {
    match depth {
        0..=2 => Color::White,
        3..=5 => Color::Yellow,
        _ => Color::Red,
    }
}

/// Pairs the device tick count with the host wall clock.
///
/// The first trace line anchors both; later lines report how far the
/// device's elapsed time has drifted from the host's.
#[derive(Debug, Default)]
pub struct HostClock {
    origin: Option<(u64, DateTime<Local>)>,
}

impl HostClock {
    /// Device-minus-host elapsed seconds for a line stamped `device_ms`
    /// that arrived at `now`.
    ///
    /// A timestamp below the anchor means the device restarted; it
    /// re-anchors.
    pub fn drift(&mut self, device_ms: u64, now: DateTime<Local>) -> f64 {
        let (origin_ms, origin_at) = match self.origin {
            Some((ms, at)) if device_ms >= ms => (ms, at),
            _ => {
                self.origin = Some((device_ms, now));
                (device_ms, now)
            }
        };
        #[allow(clippy::cast_precision_loss)]
        let device = (device_ms - origin_ms) as f64 / 1000.0;
        #[allow(clippy::cast_precision_loss)]
        let host = (now - origin_at).num_milliseconds() as f64 / 1000.0;
        device - host
    }
}

/// Drift column: a leading space when positive so columns line up.
pub fn format_drift(seconds: f64) -> String {
    if seconds > 0.0 {
        format!("( {seconds:.3}s)")
    } else {
        format!("({seconds:.3}s)")
    }
}

/// Host arrival time: time of day, or full date and time with `full`.
pub fn format_local(now: DateTime<Local>, full: bool) -> String {
    if full {
        now.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
    } else {
        now.format("%H:%M:%S%.3f").to_string()
    }
}

fn render_record(
    record: &LogRecord,
    full: bool,
    now: DateTime<Local>,
    clock: &mut HostClock,
) -> String {
    let file = if full {
        record.file.clone()
    } else {
        record.file.replace("../", "")
    };
    let message: ColoredString = match level_color(record.level_code) {
        Some(color) if record.level_code == 4 => record.message.color(color).bold(),
        Some(color) => record.message.color(color),
        None => record.message.normal(),
    };
    let drift = clock.drift(record.timestamp, now);
    let drift = if full {
        format_drift(drift).bold().to_string()
    } else {
        String::new()
    };
    format!(
        "{} [{}{}:{}:{}:{}] {}",
        format_local(now, full),
        format!("{:010}", record.timestamp).blue(),
        drift,
        record.queue_depth.to_string().color(load_color(record.queue_depth)),
        file.cyan(),
        record.line.to_string().magenta(),
        message
    )
}
