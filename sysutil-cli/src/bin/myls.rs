use std::ffi::OsString;

use clap::Parser;
use sysutil_cli::selftest::{self, ReportFormat};
use sysutil_cli::{cfgs, logging, ls, probes};
use sysutil_filesystem::stdio::RawStdout;
use sysutil_filesystem::Filesystem;

/// Long listing of files and directories. Runs the self-test when given no paths.
#[derive(Debug, Parser)]
#[command(name = "myls", disable_help_flag = true, disable_version_flag = true)]
struct Args {
    #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
    paths: Vec<OsString>,
}

fn main() {
    logging::init();
    let args = Args::parse();

    // Output problems aren't something we can report, the exit code is always 0.
    if let Err(err) = run(args) {
        tracing::error!(%err, "myls failed");
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let configs = cfgs::load();
    let ansi = cfgs::COLOR.read(&configs);
    let fs = Filesystem::new(configs);
    let mut out = RawStdout::new();

    if args.paths.is_empty() {
        let report = selftest::run_probes(&probes::list_probes(), ReportFormat { ansi }, &mut out)?;
        tracing::info!(passed = report.passed, total = report.total, "self-test finished");
        return Ok(());
    }

    let paths: Vec<&[u8]> = args.paths.iter().map(|path| path.as_encoded_bytes()).collect();
    ls::list_all(&fs, &paths, &mut out)?;
    Ok(())
}
