// SPDX-License-Identifier: AGPL-3.0-only

//! Process backend: every collaborator is an external script
//!
//! Each call runs one blocking child process through the configured
//! interpreter. Tool stdout is captured (it is either the payload or logged
//! at debug level) so it never mixes with the register value printed by the
//! CLI. A non-zero exit is fatal.
//!
//! Tools that write artifacts into their working directory are started in
//! the artifact directory, and the expected output file is checked after the
//! tool reports success. Script and artifact paths should therefore be
//! absolute; the CLI resolves them before building the backend.

use crate::backend::{BitstreamTools, ConfigPort, RegisterLookup, Tool};
use crate::config::ToolConfig;
use crate::error::{LutRegError, Result};
use lutreg_fabric::protocol::{hex_arg, parse_hex_u64, DEVCFG_READ, DEVCFG_WRITE, FLAG_READ};
use lutreg_fabric::RegisterLocation;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info, warn};

/// Collaborators backed by external scripts
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    config: ToolConfig,
}

impl ProcessBackend {
    /// Backend running the tools in `config`
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    /// Tool configuration in use
    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Run `tool` with `args`, returning its stdout
    fn run(&self, tool: Tool, args: &[OsString], cwd: Option<&Path>) -> Result<String> {
        let script = self.config.script(tool);
        let name = script.display().to_string();

        let mut command = Command::new(&self.config.interpreter);
        command.arg(script).args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        debug!(
            "Running {} {} {}",
            self.config.interpreter.display(),
            name,
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let output = command.output().map_err(|source| LutRegError::Spawn {
            tool: name.clone(),
            source,
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            for line in stderr.lines() {
                warn!("{name}: {line}");
            }
            return Err(LutRegError::external_tool(name, &output.status));
        }
        for line in stderr.lines() {
            debug!("{name} (stderr): {line}");
        }

        String::from_utf8(output.stdout)
            .map_err(|e| LutRegError::tool_output(name, format!("output is not UTF-8: {e}")))
    }

    /// Run `tool` and discard its stdout
    fn run_quiet(&self, tool: Tool, args: &[OsString], cwd: Option<&Path>) -> Result<()> {
        let stdout = self.run(tool, args, cwd)?;
        for line in stdout.lines() {
            debug!("{}: {line}", self.config.script(tool).display());
        }
        Ok(())
    }

    fn expect_artifact(&self, tool: Tool, path: &Path) -> Result<()> {
        if path.is_file() {
            Ok(())
        } else {
            Err(LutRegError::MissingArtifact {
                tool: self.config.script(tool).display().to_string(),
                path: path.to_path_buf(),
            })
        }
    }
}

fn artifact_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

impl RegisterLookup for ProcessBackend {
    fn locate(&self, register: &str) -> Result<Vec<RegisterLocation>> {
        let stdout = self.run(Tool::Locator, &[OsString::from(register)], None)?;

        stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.parse::<RegisterLocation>().map_err(LutRegError::from))
            .collect()
    }

    fn frame_addresses(&self, location: &RegisterLocation) -> Result<Vec<u32>> {
        let stdout = self.run(Tool::Resolver, &[OsString::from(location.to_string())], None)?;
        let tool = self.config.script(Tool::Resolver).display().to_string();

        stdout
            .split_whitespace()
            .map(|token| {
                let raw = parse_hex_u64(token)
                    .map_err(|e| LutRegError::tool_output(&tool, format!("bad address {token:?}: {e}")))?;
                u32::try_from(raw).map_err(|_| {
                    LutRegError::tool_output(&tool, format!("address {token} exceeds 32 bits"))
                })
            })
            .collect()
    }
}

impl ConfigPort for ProcessBackend {
    fn read_frames(&self, start: u32, count: usize, dump: &Path) -> Result<()> {
        info!("Reading {count} frame(s) from {:#x}", start);
        let args: [OsString; 3] = [
            DEVCFG_READ.into(),
            hex_arg(u64::from(start)).into(),
            count.to_string().into(),
        ];
        self.run_quiet(Tool::DeviceConfig, &args, artifact_dir(dump))?;
        self.expect_artifact(Tool::DeviceConfig, dump)
    }

    fn write_image(&self, image: &Path) -> Result<()> {
        info!("Writing {} to device", image.display());
        let args: [OsString; 2] = [DEVCFG_WRITE.into(), image.as_os_str().to_owned()];
        self.run_quiet(Tool::DeviceConfig, &args, artifact_dir(image))
    }
}

impl BitstreamTools for ProcessBackend {
    fn assemble_partial(&self, dump: &Path, addresses: &[u32], partial: &Path) -> Result<()> {
        let args: Vec<OsString> = std::iter::once(dump.as_os_str().to_owned())
            .chain(addresses.iter().map(|&a| hex_arg(u64::from(a)).into()))
            .collect();
        self.run_quiet(Tool::PartialAssembler, &args, artifact_dir(dump))?;
        self.expect_artifact(Tool::PartialAssembler, partial)
    }

    fn init_listing(&self, bitstream: &Path, slice: &str) -> Result<String> {
        let args: [OsString; 3] = [
            bitstream.as_os_str().to_owned(),
            slice.into(),
            FLAG_READ.into(),
        ];
        self.run(Tool::InitEditor, &args, None)
    }

    fn patch_init(&self, bitstream: &Path, slice: &str, flags: &[String]) -> Result<()> {
        let args: Vec<OsString> = [bitstream.as_os_str().to_owned(), slice.into()]
            .into_iter()
            .chain(flags.iter().map(OsString::from))
            .collect();
        self.run_quiet(Tool::InitEditor, &args, None)
    }

    fn pack(&self, bitstream: &Path, image: &Path) -> Result<()> {
        let args = [bitstream.as_os_str().to_owned()];
        self.run_quiet(Tool::Packager, &args, artifact_dir(bitstream))?;
        self.expect_artifact(Tool::Packager, image)
    }
}
