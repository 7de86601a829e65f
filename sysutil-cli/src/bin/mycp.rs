use std::ffi::OsString;

use clap::Parser;
use sysutil_cli::selftest::{self, ReportFormat};
use sysutil_cli::{cfgs, cp, logging, probes};
use sysutil_filesystem::stdio::RawStdout;
use sysutil_filesystem::Filesystem;

/// Copy regular files. Runs the self-test when given no arguments.
#[derive(Debug, Parser)]
#[command(name = "mycp", disable_help_flag = true, disable_version_flag = true)]
struct Args {
    /// Sources followed by the destination.
    #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
    paths: Vec<OsString>,
}

fn main() {
    logging::init();
    let args = Args::parse();

    let code = match run(args) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(%err, "mycp failed");
            0
        }
    };
    std::process::exit(code);
}

fn run(args: Args) -> anyhow::Result<i32> {
    let configs = cfgs::load();
    let ansi = cfgs::COLOR.read(&configs);
    let fs = Filesystem::new(configs);
    let mut out = RawStdout::new();

    if args.paths.is_empty() {
        let report = selftest::run_probes(&probes::copy_probes(), ReportFormat { ansi }, &mut out)?;
        tracing::info!(passed = report.passed, total = report.total, "self-test finished");
        return Ok(0);
    }

    let paths: Vec<&[u8]> = args.paths.iter().map(|path| path.as_encoded_bytes()).collect();
    let code = cp::run(&fs, &paths, &mut out)?;
    Ok(code)
}
