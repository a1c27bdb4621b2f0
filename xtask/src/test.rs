use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

/// Workspace members that may carry a `tests/` directory.
const MEMBERS: &[(&str, &str)] = &[
    ("platform", "crates/platform"),
    ("crashdump", "crates/crashdump"),
    ("firmware", "crates/firmware"),
    ("xtask", "xtask"),
];

/// One `tests/*.rs` integration target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationTarget {
    pub package: String,
    pub name: String,
}

impl IntegrationTarget {
    fn cargo_args(&self) -> Vec<&str> {
        vec!["test", "-p", self.package.as_str(), "--test", self.name.as_str()]
    }
}

pub fn run(unit_only: bool, integration_only: bool) -> Result<()> {
    println!();
    println!("{}", "🧪 Running tests...".cyan().bold());
    println!();

    let total_start = Instant::now();

    if !integration_only {
        // Library and binary unit tests only; `tests/` targets run below.
        let out = cargo_step("Unit tests", &["test", "--workspace", "--lib", "--bins"])?;
        println!("{}", format!("  ✓ Unit tests {}", summarize(&out)).green());
        println!();
    }

    if !unit_only {
        let root = workspace_root();
        let targets = integration_targets(&root)?;
        if targets.is_empty() {
            println!("{}", "  ⚠ No integration tests found".yellow());
        }
        for target in &targets {
            let label = format!("{}/{}", target.package, target.name);
            let out = cargo_step(&label, &target.cargo_args())?;
            println!("{}", format!("  ✓ {label} {}", summarize(&out)).green());
        }
        println!();
    }

    // Doc-test failures are reported but do not fail the run.
    match cargo_step("Doc tests", &["test", "--doc", "--workspace"]) {
        Ok(out) => println!("{}", format!("  ✓ Doc tests {}", summarize(&out)).green()),
        Err(_) => eprintln!("{}", "  ⚠ Doc tests failed".yellow().bold()),
    }
    println!();

    println!(
        "{}",
        format!(
            "✓ All tests completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}

/// Run `cargo <args>`, echoing its output on failure. Returns stdout.
fn cargo_step(label: &str, args: &[&str]) -> Result<String> {
    println!("{}", format!("  Running {label}...").cyan());
    let start = Instant::now();
    let output = Command::new("cargo")
        .args(args)
        .output()
        .with_context(|| format!("Failed to run {label}"))?;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

    if !output.status.success() {
        eprintln!("{}", format!("  ✗ {label} failed").red().bold());
        eprintln!();
        for line in stdout.lines() {
            eprintln!("  {line}");
        }
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        anyhow::bail!("{label} failed");
    }
    println!(
        "{}",
        format!("    done in {:.2}s", start.elapsed().as_secs_f64()).dimmed()
    );
    Ok(stdout)
}

fn workspace_root() -> PathBuf {
    // xtask lives one level below the workspace root.
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Every `tests/*.rs` file of every member, as `-p <crate> --test <stem>`.
pub fn integration_targets(root: &Path) -> Result<Vec<IntegrationTarget>> {
    let mut targets = Vec::new();
    for (package, dir) in MEMBERS {
        let tests = root.join(dir).join("tests");
        if !tests.is_dir() {
            continue;
        }
        let mut names: Vec<String> = fs::read_dir(&tests)
            .with_context(|| format!("Failed to list {}", tests.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "rs"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        targets.extend(names.into_iter().map(|name| IntegrationTarget {
            package: (*package).to_string(),
            name,
        }));
    }
    Ok(targets)
}

/// Sum of every `test result:` line in cargo's output.
pub fn summarize(output: &str) -> String {
    let mut passed = 0u64;
    let mut failed = 0u64;
    let mut ignored = 0u64;
    let mut seen = false;
    for line in output.lines() {
        let Some(rest) = line.split("test result:").nth(1) else {
            continue;
        };
        seen = true;
        for part in rest.split(';') {
            let mut words = part.split_whitespace().rev();
            let (Some(kind), Some(count)) = (words.next(), words.next()) else {
                continue;
            };
            let Ok(count) = count.parse::<u64>() else {
                continue;
            };
            match kind {
                "passed" => passed += count,
                "failed" => failed += count,
                "ignored" => ignored += count,
                _ => {}
            }
        }
    }
    if seen {
        format!("({passed} passed, {failed} failed, {ignored} ignored)")
    } else {
        "(summary not available)".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_are_only_tests_dir_files() {
        let root = tempfile::tempdir().unwrap();
        let platform = root.path().join("crates/platform");
        fs::create_dir_all(platform.join("tests")).unwrap();
        fs::create_dir_all(platform.join("src")).unwrap();
        fs::write(platform.join("tests/b_case.rs"), "").unwrap();
        fs::write(platform.join("tests/a_case.rs"), "").unwrap();
        fs::write(platform.join("tests/notes.md"), "").unwrap();
        fs::write(platform.join("src/lib.rs"), "").unwrap();

        let targets = integration_targets(root.path()).unwrap();
        let names: Vec<&str> = targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["a_case", "b_case"]);
        assert!(targets.iter().all(|t| t.package == "platform"));
        assert_eq!(
            targets[0].cargo_args(),
            ["test", "-p", "platform", "--test", "a_case"]
        );
    }

    #[test]
    fn test_members_without_tests_dir_are_skipped() {
        let root = tempfile::tempdir().unwrap();
        assert!(integration_targets(root.path()).unwrap().is_empty());
    }

    #[test]
    fn test_workspace_has_integration_targets() {
        let targets = integration_targets(&workspace_root()).unwrap();
        for (package, name) in [
            ("crashdump", "session_protocol"),
            ("firmware", "crash_transcript"),
            ("platform", "log_channel_proptest"),
        ] {
            assert!(
                targets.iter().any(|t| t.package == package && t.name == name),
                "missing {package}/{name}"
            );
        }
    }

    #[test]
    fn test_summary_adds_up_every_binary() {
        let out = "test result: ok. 17 passed; 0 failed; 1 ignored; 0 measured; 0 filtered out; finished in 0.01s\n\
                   running 4 tests\n\
                   test result: ok. 4 passed; 0 failed; 0 ignored; 0 measured; 0 filtered out\n";
        assert_eq!(summarize(out), "(21 passed, 0 failed, 1 ignored)");
        assert_eq!(summarize("nothing"), "(summary not available)");
    }
}
