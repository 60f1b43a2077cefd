// SPDX-License-Identifier: AGPL-3.0-only

//! Tool locations and intermediate artifact paths
//!
//! Precedence, lowest first: built-in defaults, `LUTREG_*` environment
//! variables, explicit overrides from the caller (CLI flags).

use crate::backend::Tool;
use lutreg_fabric::protocol::{FRAME_DUMP_NAME, IMAGE_SUFFIX, PARTIAL_SUFFIX};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Interpreter used to run the tool scripts unless overridden
pub const DEFAULT_INTERPRETER: &str = "python";

/// Environment variable overriding the interpreter
pub const ENV_INTERPRETER: &str = "LUTREG_PYTHON";

/// Environment variable naming a directory the relative scripts live in
pub const ENV_TOOLS_DIR: &str = "LUTREG_TOOLS_DIR";

/// Where the external tools live and how to run them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Interpreter every script is run with
    pub interpreter: PathBuf,
    /// Register name → locations
    pub locator: PathBuf,
    /// Location → frame addresses
    pub resolver: PathBuf,
    /// Device configuration interface
    pub device_config: PathBuf,
    /// Partial-bitstream assembler
    pub partial_assembler: PathBuf,
    /// LUT INIT editor
    pub init_editor: PathBuf,
    /// Bitstream → binary packager
    pub packager: PathBuf,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from(DEFAULT_INTERPRETER),
            locator: PathBuf::from(Tool::Locator.default_script()),
            resolver: PathBuf::from(Tool::Resolver.default_script()),
            device_config: PathBuf::from(Tool::DeviceConfig.default_script()),
            partial_assembler: PathBuf::from(Tool::PartialAssembler.default_script()),
            init_editor: PathBuf::from(Tool::InitEditor.default_script()),
            packager: PathBuf::from(Tool::Packager.default_script()),
        }
    }
}

impl ToolConfig {
    /// Defaults with `LUTREG_*` environment overrides applied
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var_os(key))
    }

    /// Apply overrides from a variable source
    ///
    /// Per-tool variables replace the script path; `LUTREG_TOOLS_DIR` is then
    /// prefixed to every script path that is still relative.
    #[must_use]
    pub fn with_overrides(mut self, var: impl Fn(&str) -> Option<OsString>) -> Self {
        if let Some(interpreter) = var(ENV_INTERPRETER) {
            self.interpreter = PathBuf::from(interpreter);
        }

        for tool in Tool::ALL {
            if let Some(path) = var(tool.env_var()) {
                tracing::debug!("{} overridden by {}", tool, tool.env_var());
                *self.script_mut(tool) = PathBuf::from(path);
            }
        }

        match var(ENV_TOOLS_DIR) {
            Some(dir) => self.with_tools_dir(Path::new(&dir)),
            None => self,
        }
    }

    /// Resolve every relative script path against `dir`
    #[must_use]
    pub fn with_tools_dir(mut self, dir: &Path) -> Self {
        for tool in Tool::ALL {
            let script = self.script_mut(tool);
            if script.is_relative() {
                *script = dir.join(&*script);
            }
        }
        self
    }

    /// Replace the interpreter
    #[must_use]
    pub fn with_interpreter(mut self, interpreter: impl Into<PathBuf>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// Replace one script path
    #[must_use]
    pub fn with_script(mut self, tool: Tool, path: impl Into<PathBuf>) -> Self {
        *self.script_mut(tool) = path.into();
        self
    }

    /// Script path for a tool
    pub fn script(&self, tool: Tool) -> &Path {
        match tool {
            Tool::Locator => &self.locator,
            Tool::Resolver => &self.resolver,
            Tool::DeviceConfig => &self.device_config,
            Tool::PartialAssembler => &self.partial_assembler,
            Tool::InitEditor => &self.init_editor,
            Tool::Packager => &self.packager,
        }
    }

    fn script_mut(&mut self, tool: Tool) -> &mut PathBuf {
        match tool {
            Tool::Locator => &mut self.locator,
            Tool::Resolver => &mut self.resolver,
            Tool::DeviceConfig => &mut self.device_config,
            Tool::PartialAssembler => &mut self.partial_assembler,
            Tool::InitEditor => &mut self.init_editor,
            Tool::Packager => &mut self.packager,
        }
    }
}

/// Intermediate artifacts of one pipeline run
///
/// The device interface always writes its dump as `devcfg.out` in its working
/// directory, and the later tools derive their output names from their
/// inputs. Only the directory is therefore configurable; the three paths are
/// `<dir>/devcfg.out`, `<dir>/devcfg.out.partial` and
/// `<dir>/devcfg.out.partial.bin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Raw frame dump written by the device read
    pub frame_dump: PathBuf,
    /// Partial bitstream the codec edits in place
    pub partial: PathBuf,
    /// Packed binary image written back to the device
    pub image: PathBuf,
}

impl ArtifactPaths {
    /// Artifact paths inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let frame_dump = dir.as_ref().join(FRAME_DUMP_NAME);
        let partial = with_suffix(&frame_dump, PARTIAL_SUFFIX);
        let image = with_suffix(&partial, IMAGE_SUFFIX);
        Self {
            frame_dump,
            partial,
            image,
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
