//! Built-in self-test, run when a tool is invoked without arguments.
//!
//! A self-test is an ordered table of [`Probe`]s. Every probe is independent, takes no
//! arguments, cleans up whatever it creates, and reports a plain pass or fail.

use std::io::{self, Write};

use ansi_term::Colour;

/// A single named check.
#[derive(Debug, Copy, Clone)]
pub struct Probe {
    pub name: &'static str,
    pub run: fn() -> bool,
}

/// Build a [`Probe`] named after the function it runs.
#[macro_export]
macro_rules! probe {
    ($f:path) => {
        $crate::selftest::Probe {
            name: stringify!($f),
            run: $f,
        }
    };
}

/// Specifics of how the report is rendered.
#[derive(Debug, Copy, Clone)]
pub struct ReportFormat {
    /// Color passes green and failures red.
    pub ansi: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Report {
    pub passed: usize,
    pub total: usize,
}

/// Run every probe in order, writing one line per probe and a summary to `out`.
pub fn run_probes<W: Write>(
    probes: &[Probe],
    format: ReportFormat,
    out: &mut W,
) -> io::Result<Report> {
    let mut passed = 0;

    for (idx, probe) in probes.iter().enumerate() {
        let ok = (probe.run)();
        tracing::debug!(name = probe.name, ok, "ran probe");

        let (verdict, colour) = if ok {
            passed += 1;
            ("PASSED", Colour::Green)
        } else {
            ("FAILED", Colour::Red)
        };
        let verdict = if format.ansi {
            colour.paint(verdict).to_string()
        } else {
            verdict.to_string()
        };
        writeln!(out, "TEST {} {} {verdict}", idx + 1, probe.name)?;
    }

    let report = Report {
        passed,
        total: probes.len(),
    };
    writeln!(out, "{}/{} tests passed", report.passed, report.total)?;
    Ok(report)
}
