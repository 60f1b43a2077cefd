// SPDX-License-Identifier: AGPL-3.0-only

//! `lutreg`: read or write a LUT-backed FPGA register.
//!
//! ```text
//! USAGE:
//!   lutreg [OPTIONS] <REG_NAME> <REG_INDEX> -r            Print the register value
//!   lutreg [OPTIONS] <REG_NAME> <REG_INDEX> -w <HEX32>    Write a new value
//! ```
//!
//! Reads print `0x%08x` on stdout. Every failure prints one line on stderr
//! and exits 1.

use anyhow::{Context, Result};
use clap::{ArgAction, ArgGroup, Parser};
use lutreg_driver::{
    ArtifactPaths, LutRegError, Operation, Outcome, ProcessBackend, ReconfigurationPipeline,
    Tool, ToolConfig,
};
use lutreg_fabric::protocol::parse_hex_u64;
use lutreg_fabric::RegisterIndex;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "lutreg",
    about = "Read/write LUT-backed FPGA registers through partial reconfiguration",
    version
)]
#[command(group(ArgGroup::new("mode").required(true).args(["read", "write"])))]
struct Cli {
    /// Register name as known to the locator.
    reg_name: String,

    /// Register index, 0 to 31.
    #[arg(allow_negative_numbers = true)]
    reg_index: String,

    /// Read the register and print its value.
    #[arg(short, long)]
    read: bool,

    /// Write a 32-bit hex value (optional 0x prefix).
    #[arg(short, long, value_name = "HEX32", value_parser = parse_hex32)]
    write: Option<u32>,

    /// Directory for the frame dump and derived bitstreams.
    #[arg(long, env = "LUTREG_WORK_DIR", default_value = ".")]
    work_dir: PathBuf,

    /// Directory containing the tool scripts.
    #[arg(long)]
    tools_dir: Option<PathBuf>,

    /// Interpreter used to run the tool scripts.
    #[arg(long)]
    python: Option<PathBuf>,

    /// Register locator script (name → slice/lut lines).
    #[arg(long)]
    locator: Option<PathBuf>,

    /// Frame address resolver script (slice/lut → hex addresses).
    #[arg(long)]
    resolver: Option<PathBuf>,

    /// More logging (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn operation(&self) -> Operation {
        match self.write {
            Some(value) => Operation::Write(value),
            None => Operation::Read,
        }
    }
}

fn parse_hex32(text: &str) -> std::result::Result<u32, LutRegError> {
    let raw = parse_hex_u64(text)?;
    u32::try_from(raw).map_err(|_| LutRegError::invalid_value(text, "does not fit in 32 bits"))
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let index: RegisterIndex = cli
        .reg_index
        .parse()
        .map_err(LutRegError::InvalidRegisterIndex)?;

    let cwd = std::env::current_dir().context("cannot determine the current directory")?;
    let config = tool_config(cli, &cwd);
    let paths = ArtifactPaths::in_dir(absolute(&cwd, &cli.work_dir));
    info!("Artifacts in {}", paths.frame_dump.display());

    let backend = ProcessBackend::new(config);
    let pipeline = ReconfigurationPipeline::new(&backend, &backend, &backend, paths);

    match pipeline.run(&cli.reg_name, index, cli.operation())? {
        Outcome::Read(value) => println!("{value:#010x}"),
        Outcome::Written(summary) => info!(
            "Wrote {:#010x}: {} word(s) changed in {} slice(s)",
            summary.value, summary.words_changed, summary.slices_flushed
        ),
    }
    Ok(())
}

/// Environment, then flags; every relative script path ends up absolute
///
/// Tools run inside the work directory, so a script path relative to the
/// caller's directory would no longer resolve.
fn tool_config(cli: &Cli, cwd: &Path) -> ToolConfig {
    let mut config = ToolConfig::from_env();

    if let Some(python) = &cli.python {
        config = config.with_interpreter(python);
    }
    if let Some(locator) = &cli.locator {
        config = config.with_script(Tool::Locator, absolute(cwd, locator));
    }
    if let Some(resolver) = &cli.resolver {
        config = config.with_script(Tool::Resolver, absolute(cwd, resolver));
    }
    if let Some(dir) = &cli.tools_dir {
        config = config.with_tools_dir(&absolute(cwd, dir));
    }

    config.with_tools_dir(cwd)
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
