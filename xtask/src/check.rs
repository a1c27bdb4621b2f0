use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

const THUMB: &str = "thumbv7em-none-eabihf";

/// One `cargo` invocation of the check run.
#[derive(Debug)]
pub struct Check {
    pub label: &'static str,
    pub args: &'static [&'static str],
    /// Failing a blocking check fails the run; advisory ones only warn.
    pub blocking: bool,
}

/// The check matrix: both HardFault handlers on the target, the no_std core,
/// the host build without a board, then lints.
pub const CHECKS: &[Check] = &[
    Check {
        label: "firmware, hardware + crash-dump (nRF52832)",
        args: &["check", "-p", "firmware", "--target", THUMB, "--features", "hardware"],
        blocking: true,
    },
    Check {
        label: "firmware, hardware without crash-dump (defmt::panic HardFault)",
        args: &[
            "check",
            "-p",
            "firmware",
            "--target",
            THUMB,
            "--no-default-features",
            "--features",
            "hardware",
        ],
        blocking: true,
    },
    Check {
        label: "platform + crashdump (no_std)",
        args: &[
            "check",
            "-p",
            "platform",
            "-p",
            "crashdump",
            "--target",
            THUMB,
            "--no-default-features",
        ],
        blocking: true,
    },
    Check {
        label: "crashdump host tools (std)",
        args: &["check", "-p", "crashdump", "--features", "std"],
        blocking: true,
    },
    Check {
        label: "firmware host build without a board",
        args: &["check", "-p", "firmware", "--no-default-features", "--all-targets"],
        blocking: true,
    },
    Check {
        label: "clippy",
        args: &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        blocking: false,
    },
    Check {
        label: "formatting",
        args: &["fmt", "--all", "--check"],
        blocking: false,
    },
];

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking firmware builds...".cyan().bold());
    println!();

    let total_start = Instant::now();
    let mut warnings = 0usize;

    for check in CHECKS {
        println!("{}", format!("  Checking {}...", check.label).cyan());
        let start = Instant::now();
        let output = Command::new("cargo")
            .args(check.args)
            .output()
            .with_context(|| format!("Failed to run cargo for {}", check.label))?;

        if output.status.success() {
            println!(
                "{}",
                format!(
                    "  ✓ {} passed in {:.2}s",
                    check.label,
                    start.elapsed().as_secs_f64()
                )
                .green()
            );
        } else if check.blocking {
            eprintln!("{}", format!("  ✗ {} failed", check.label).red().bold());
            eprintln!();
            eprintln!("{}", String::from_utf8_lossy(&output.stderr));
            anyhow::bail!("{} failed", check.label);
        } else {
            warnings += 1;
            eprintln!("{}", format!("  ⚠ {} reported issues", check.label).yellow().bold());
            eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        }
        println!();
    }

    let summary = format!(
        "✓ All checks completed in {:.2}s ({warnings} advisory warnings)",
        total_start.elapsed().as_secs_f64()
    );
    println!("{}", summary.green().bold());
    println!();

    Ok(())
}
