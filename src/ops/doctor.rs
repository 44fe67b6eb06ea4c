//! Environment health checks.
//!
//! The `doctor` command verifies that the tools needed to build the native
//! bridge are available and that the configured bridge library loads.
//!
//! ## Checks Performed
//!
//! - C++ compiler availability (`CXX`, c++, g++, clang++)
//! - make
//! - pkg-config (optional, only needed for `--stage install`)
//! - The bridge library named by `XAPIAN_BRIDGE_LIB` or `[bridge] library`

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::api::Bridge;
use crate::util::process::{find_cxx_compiler, find_make, find_pkg_config, ProcessBuilder};
use crate::util::diagnostic::suggestions;
use crate::util::{Config, GlobalContext};

/// Result of a single health check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,

    pub passed: bool,

    /// Human-readable status message
    pub message: String,

    /// Path to the tool (if applicable)
    pub path: Option<PathBuf>,

    pub version: Option<String>,

    pub duration: Duration,

    /// Whether this check is required or optional
    pub required: bool,
}

impl CheckResult {
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: true,
            message: message.into(),
            path: None,
            version: None,
            duration: Duration::ZERO,
            required: true,
        }
    }

    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            passed: false,
            ..Self::pass(name, message)
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Summary of all health checks.
#[derive(Debug, Clone, Default)]
pub struct DoctorReport {
    pub checks: Vec<CheckResult>,

    pub total_duration: Duration,

    /// Environment information
    pub environment: HashMap<String, String>,
}

impl DoctorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    /// Check if all required checks passed.
    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    pub fn required_failed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .count()
    }
}

/// Run the doctor command.
pub fn doctor(ctx: &GlobalContext) -> Result<DoctorReport> {
    let start = Instant::now();
    let mut report = DoctorReport::new();
    let config = ctx.load_config();

    report
        .environment
        .insert("os".to_string(), std::env::consts::OS.to_string());
    report
        .environment
        .insert("arch".to_string(), std::env::consts::ARCH.to_string());

    report.add(check_tool("C++ Compiler", find_cxx_compiler(), "--version", true));
    report.add(check_tool("make", find_make(), "--version", true));
    report.add(check_tool("pkg-config", find_pkg_config(), "--version", false));
    report.add(check_bridge_library(&config));

    report.total_duration = start.elapsed();
    Ok(report)
}

fn check_tool(name: &str, found: Option<PathBuf>, version_flag: &str, required: bool) -> CheckResult {
    let start = Instant::now();

    let result = match found {
        Some(path) => {
            let version = tool_version(&path, version_flag);
            let check = CheckResult::pass(name, format!("Found {}", path.display()));
            let check = match version {
                Some(version) => check.with_version(version),
                None => check,
            };
            check.with_path(path)
        }
        None => CheckResult::fail(name, format!("{} not found in PATH", name)),
    };

    let result = result.with_duration(start.elapsed());
    if required {
        result
    } else {
        result.optional()
    }
}

/// First non-empty line a tool prints for its version flag.
fn tool_version(path: &std::path::Path, flag: &str) -> Option<String> {
    let output = ProcessBuilder::new(path).arg(flag).exec().ok()?;
    let text = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).into_owned()
    } else {
        String::from_utf8_lossy(&output.stdout).into_owned()
    };
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

fn check_bridge_library(config: &Config) -> CheckResult {
    let start = Instant::now();

    let Some(path) = config.bridge_library() else {
        return CheckResult::fail(
            "Bridge library",
            format!("No bridge library configured. {}", suggestions::BRIDGE_LIBRARY),
        )
        .with_duration(start.elapsed());
    };

    match Bridge::load(&path) {
        Ok(bridge) => CheckResult::pass("Bridge library", "Bridge library loads")
            .with_version(bridge.version())
            .with_path(path)
            .with_duration(start.elapsed()),
        Err(e) => CheckResult::fail("Bridge library", e.to_string())
            .with_path(path)
            .with_duration(start.elapsed()),
    }
}

/// Format the doctor report for display.
pub fn format_report(report: &DoctorReport, verbose: bool) -> String {
    use std::fmt::Write;

    let mut output = String::new();

    let _ = writeln!(output, "xapian-bridge doctor");
    let _ = writeln!(output, "====================\n");

    if verbose {
        let unknown = "unknown".to_string();
        let _ = writeln!(output, "Environment:");
        let _ = writeln!(
            output,
            "  OS: {} ({})\n",
            report.environment.get("os").unwrap_or(&unknown),
            report.environment.get("arch").unwrap_or(&unknown)
        );
    }

    let _ = writeln!(output, "Checks:");
    for check in &report.checks {
        let status = if check.passed { "[OK]" } else { "[!!]" };
        let required = if check.required { "" } else { " (optional)" };
        let _ = writeln!(output, "  {} {}{}", status, check.name, required);

        if verbose || !check.passed {
            let _ = writeln!(output, "      {}", check.message);
        }
        if verbose {
            if let Some(path) = &check.path {
                let _ = writeln!(output, "      Path: {}", path.display());
            }
            if let Some(version) = &check.version {
                let _ = writeln!(output, "      Version: {}", version);
            }
        }
    }

    let _ = writeln!(output);

    let failed = report.failed_count();
    let required_failed = report.required_failed_count();
    let _ = writeln!(
        output,
        "Summary: {} passed, {} failed",
        report.passed_count(),
        failed
    );

    if required_failed > 0 {
        let _ = writeln!(
            output,
            "\nWarning: {} required check(s) failed.",
            required_failed
        );
    } else if failed > 0 {
        let _ = writeln!(
            output,
            "\nAll required checks passed. {} optional check(s) failed.",
            failed
        );
    } else {
        let _ = writeln!(output, "\nAll checks passed.");
    }

    output
}
