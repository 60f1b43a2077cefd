// SPDX-License-Identifier: AGPL-3.0-only

//! Software (virtual fabric) backend
//!
//! Implements all three collaborator traits in memory, speaking the same
//! text and flag protocols as the external tools. This enables:
//!
//! 1. **CI without hardware**: the codec and pipeline run end-to-end against
//!    a simulated configuration memory.
//!
//! 2. **Protocol checks**: INIT listings are rendered and write flags are
//!    parsed exactly as the INIT editor does, so formatting mistakes in the
//!    codec surface as errors.
//!
//! 3. **Side-effect audits**: every collaborator call is recorded, so tests
//!    can assert what was (and was not) touched.
//!
//! ## Model
//!
//! ```text
//! device     slice → SliceInit, plus slice → frame addresses
//! read       frames [start, start+count) → dump of every slice whose frames overlap
//! assemble   dump + address list → partial holding the slices on those frames
//! pack       partial → image (copy)
//! write      image → device (slices in the image replace device state)
//! ```

use crate::backend::{BitstreamTools, ConfigPort, RegisterLookup, Tool};
use crate::error::{LutRegError, Result};
use lutreg_fabric::protocol::{parse_hex_u64, FLAG_NOCRC};
use lutreg_fabric::{Lut, LutInitWord, RegisterLocation, SliceInit};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One recorded collaborator call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    /// `locate(register)`
    Locate(String),
    /// `frame_addresses(location)`
    Resolve(RegisterLocation),
    /// `read_frames(start, count)`
    ReadFrames {
        /// First frame
        start: u32,
        /// Frame count
        count: usize,
    },
    /// `assemble_partial(addresses)`
    AssemblePartial(Vec<u32>),
    /// `init_listing(slice)`
    InitListing(String),
    /// `patch_init(slice, flags)`
    PatchInit {
        /// Slice patched
        slice: String,
        /// Flags passed
        flags: Vec<String>,
    },
    /// `pack()`
    Pack,
    /// `write_image()`
    WriteImage,
}

impl ToolCall {
    /// Tool this call goes to
    pub const fn tool(&self) -> Tool {
        match self {
            Self::Locate(_) => Tool::Locator,
            Self::Resolve(_) => Tool::Resolver,
            Self::ReadFrames { .. } | Self::WriteImage => Tool::DeviceConfig,
            Self::AssemblePartial(_) => Tool::PartialAssembler,
            Self::InitListing(_) | Self::PatchInit { .. } => Tool::InitEditor,
            Self::Pack => Tool::Packager,
        }
    }
}

type SliceMap = BTreeMap<String, SliceInit>;

/// Simulated fabric with an in-memory artifact store
#[derive(Debug, Default)]
pub struct SoftwareFabric {
    registers: HashMap<String, Vec<RegisterLocation>>,
    frames: BTreeMap<String, Vec<u32>>,
    device: RefCell<SliceMap>,
    artifacts: RefCell<HashMap<PathBuf, SliceMap>>,
    calls: RefCell<Vec<ToolCall>>,
    failing: Option<Tool>,
    /// Number of calls to the failing tool to let through before failing
    fail_after: Cell<usize>,
}

impl SoftwareFabric {
    /// Empty fabric
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slice backed by `frames` with initial INIT words (A..D)
    #[must_use]
    pub fn with_slice(mut self, slice: &str, frames: &[u32], init: [u64; 4]) -> Self {
        self.frames.insert(slice.to_string(), frames.to_vec());
        self.device
            .get_mut()
            .insert(slice.to_string(), SliceInit::from_raw(init));
        self
    }

    /// Register a named register with its ordered locations
    #[must_use]
    pub fn with_register(
        mut self,
        name: &str,
        locations: impl IntoIterator<Item = RegisterLocation>,
    ) -> Self {
        self.registers
            .insert(name.to_string(), locations.into_iter().collect());
        self
    }

    /// Make every call to `tool` fail with a non-zero exit
    #[must_use]
    pub fn with_failing_tool(self, tool: Tool) -> Self {
        self.with_failing_tool_after(tool, 0)
    }

    /// Let `calls` calls to `tool` succeed, then fail every later one
    #[must_use]
    pub fn with_failing_tool_after(mut self, tool: Tool, calls: usize) -> Self {
        self.failing = Some(tool);
        self.fail_after = Cell::new(calls);
        self
    }

    /// Current device INIT words of a slice
    pub fn device_init(&self, slice: &str) -> Option<SliceInit> {
        self.device.borrow().get(slice).copied()
    }

    /// Current INIT word of one LUT on the device
    pub fn device_word(&self, location: &RegisterLocation) -> Option<LutInitWord> {
        self.device_init(&location.slice)
            .map(|init| init.get(location.lut))
    }

    /// INIT words of a slice inside an artifact
    pub fn artifact_init(&self, artifact: &Path, slice: &str) -> Option<SliceInit> {
        self.artifacts
            .borrow()
            .get(artifact)
            .and_then(|slices| slices.get(slice).copied())
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.borrow().clone()
    }

    /// Calls made to one tool
    pub fn calls_to(&self, tool: Tool) -> Vec<ToolCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.tool() == tool)
            .cloned()
            .collect()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: ToolCall) -> Result<()> {
        let tool = call.tool();
        debug!("software fabric: {call:?}");
        self.calls.borrow_mut().push(call);

        if self.failing == Some(tool) {
            let remaining = self.fail_after.get();
            if remaining == 0 {
                return Err(LutRegError::tool_failed(tool.to_string(), "exit status: 1"));
            }
            self.fail_after.set(remaining - 1);
        }
        Ok(())
    }

    fn artifact(&self, tool: Tool, path: &Path) -> Result<SliceMap> {
        self.artifacts
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| LutRegError::tool_output(tool.to_string(), format!("no such file: {}", path.display())))
    }

    fn slices_on_frames(&self, slices: &SliceMap, keep: impl Fn(u32) -> bool) -> SliceMap {
        slices
            .iter()
            .filter(|(name, _)| {
                self.frames
                    .get(*name)
                    .is_some_and(|frames| frames.iter().any(|&f| keep(f)))
            })
            .map(|(name, init)| (name.clone(), *init))
            .collect()
    }
}

impl RegisterLookup for SoftwareFabric {
    fn locate(&self, register: &str) -> Result<Vec<RegisterLocation>> {
        self.record(ToolCall::Locate(register.to_string()))?;
        Ok(self.registers.get(register).cloned().unwrap_or_default())
    }

    fn frame_addresses(&self, location: &RegisterLocation) -> Result<Vec<u32>> {
        self.record(ToolCall::Resolve(location.clone()))?;
        Ok(self.frames.get(&location.slice).cloned().unwrap_or_default())
    }
}

impl ConfigPort for SoftwareFabric {
    fn read_frames(&self, start: u32, count: usize, dump: &Path) -> Result<()> {
        self.record(ToolCall::ReadFrames { start, count })?;

        let end = u64::from(start).saturating_add(u64::try_from(count).unwrap_or(u64::MAX));
        let in_range = |f: u32| u64::from(f) >= u64::from(start) && u64::from(f) < end;
        let contents = self.slices_on_frames(&self.device.borrow(), in_range);

        self.artifacts
            .borrow_mut()
            .insert(dump.to_path_buf(), contents);
        Ok(())
    }

    fn write_image(&self, image: &Path) -> Result<()> {
        self.record(ToolCall::WriteImage)?;

        let slices = self.artifact(Tool::DeviceConfig, image)?;
        self.device.borrow_mut().extend(slices);
        Ok(())
    }
}

impl BitstreamTools for SoftwareFabric {
    fn assemble_partial(&self, dump: &Path, addresses: &[u32], partial: &Path) -> Result<()> {
        self.record(ToolCall::AssemblePartial(addresses.to_vec()))?;

        let frames = self.artifact(Tool::PartialAssembler, dump)?;
        let contents = self.slices_on_frames(&frames, |f| addresses.contains(&f));

        self.artifacts
            .borrow_mut()
            .insert(partial.to_path_buf(), contents);
        Ok(())
    }

    fn init_listing(&self, bitstream: &Path, slice: &str) -> Result<String> {
        self.record(ToolCall::InitListing(slice.to_string()))?;

        let slices = self.artifact(Tool::InitEditor, bitstream)?;
        let init = slices.get(slice).ok_or_else(|| {
            LutRegError::tool_failed(Tool::InitEditor.to_string(), "exit status: 1")
        })?;

        let mut listing = format!("INIT values of {slice}\n");
        for (lut, word) in init.iter() {
            listing.push_str(&format!("{slice} {lut} {word}\n"));
        }
        Ok(listing)
    }

    fn patch_init(&self, bitstream: &Path, slice: &str, flags: &[String]) -> Result<()> {
        self.record(ToolCall::PatchInit {
            slice: slice.to_string(),
            flags: flags.to_vec(),
        })?;

        let tool = Tool::InitEditor.to_string();
        if !flags.iter().any(|f| f == FLAG_NOCRC) {
            return Err(LutRegError::tool_output(&tool, "write without --nocrc"));
        }

        let mut artifacts = self.artifacts.borrow_mut();
        let init = artifacts
            .get_mut(bitstream)
            .and_then(|slices| slices.get_mut(slice))
            .ok_or_else(|| LutRegError::tool_failed(&tool, "exit status: 1"))?;

        for flag in flags.iter().filter(|f| *f != FLAG_NOCRC) {
            let (name, value) = flag
                .split_once('=')
                .ok_or_else(|| LutRegError::tool_output(&tool, format!("bad flag {flag}")))?;
            let lut = Lut::ALL
                .into_iter()
                .find(|l| l.write_flag() == name)
                .ok_or_else(|| LutRegError::tool_output(&tool, format!("unknown flag {name}")))?;
            if !value.starts_with("0x") {
                return Err(LutRegError::tool_output(&tool, format!("{flag}: missing 0x")));
            }
            let raw = parse_hex_u64(value)
                .map_err(|e| LutRegError::tool_output(&tool, format!("{flag}: {e}")))?;
            init.set(lut, LutInitWord::new(raw));
        }
        Ok(())
    }

    fn pack(&self, bitstream: &Path, image: &Path) -> Result<()> {
        self.record(ToolCall::Pack)?;

        let slices = self.artifact(Tool::Packager, bitstream)?;
        self.artifacts
            .borrow_mut()
            .insert(image.to_path_buf(), slices);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lut_init::parse_listing;

    fn loc(text: &str) -> RegisterLocation {
        text.parse().unwrap()
    }

    fn fabric() -> SoftwareFabric {
        SoftwareFabric::new()
            .with_slice("SLICE_X0Y0", &[0x100, 0x101], [1, 2, 3, 4])
            .with_slice("SLICE_X0Y1", &[0x101], [5, 6, 7, 8])
            .with_slice("SLICE_X9Y9", &[0x900], [9, 9, 9, 9])
            .with_register("R", [loc("SLICE_X0Y0/A6LUT")])
    }

    #[test]
    fn read_covers_only_requested_frames() {
        let f = fabric();
        let dump = Path::new("dump");
        f.read_frames(0x100, 2, dump).unwrap();

        assert!(f.artifact_init(dump, "SLICE_X0Y0").is_some());
        assert!(f.artifact_init(dump, "SLICE_X0Y1").is_some());
        assert!(f.artifact_init(dump, "SLICE_X9Y9").is_none());
    }

    #[test]
    fn listing_round_trips_through_parser() {
        let f = fabric();
        f.read_frames(0x100, 2, Path::new("d")).unwrap();
        f.assemble_partial(Path::new("d"), &[0x100, 0x101], Path::new("p"))
            .unwrap();

        let listing = f.init_listing(Path::new("p"), "SLICE_X0Y1").unwrap();
        assert_eq!(parse_listing(&listing).unwrap(), SliceInit::from_raw([5, 6, 7, 8]));
    }

    #[test]
    fn slice_outside_partial_fails() {
        let f = fabric();
        f.read_frames(0x100, 2, Path::new("d")).unwrap();
        f.assemble_partial(Path::new("d"), &[0x100, 0x101], Path::new("p"))
            .unwrap();
        assert!(f.init_listing(Path::new("p"), "SLICE_X9Y9").is_err());
    }

    #[test]
    fn patch_requires_nocrc_and_known_flags() {
        let f = fabric();
        f.read_frames(0x100, 1, Path::new("d")).unwrap();
        f.assemble_partial(Path::new("d"), &[0x100], Path::new("p"))
            .unwrap();

        let p = Path::new("p");
        assert!(f
            .patch_init(p, "SLICE_X0Y0", &["--a6lut=0x1".to_string()])
            .is_err());
        assert!(f
            .patch_init(p, "SLICE_X0Y0", &["--nocrc".into(), "--e6lut=0x1".into()])
            .is_err());

        f.patch_init(p, "SLICE_X0Y0", &["--nocrc".into(), "--b6lut=0xff".into()])
            .unwrap();
        assert_eq!(f.artifact_init(p, "SLICE_X0Y0").unwrap().get(Lut::B).raw(), 0xff);
        // device untouched until the image is written
        assert_eq!(f.device_word(&loc("SLICE_X0Y0/B6LUT")).unwrap().raw(), 2);
    }

    #[test]
    fn failing_tool_after_n_calls() {
        let f = fabric().with_failing_tool_after(Tool::Locator, 1);
        assert!(f.locate("R").is_ok());
        assert!(f.locate("R").is_err());
        assert_eq!(f.calls_to(Tool::Locator).len(), 2);
    }

    #[test]
    fn unknown_register_is_empty() {
        let f = fabric();
        assert!(f.locate("NOPE").unwrap().is_empty());
        assert!(f.frame_addresses(&loc("SLICE_X5Y5/A6LUT")).unwrap().is_empty());
    }
}
