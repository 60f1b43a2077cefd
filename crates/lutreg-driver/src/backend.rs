// SPDX-License-Identifier: AGPL-3.0-only

//! Collaborator abstraction for the reconfiguration pipeline
//!
//! Everything outside the register codec is reached through one of three
//! narrow traits. The process backend maps them onto the external scripts;
//! the software backend keeps a simulated fabric in memory so the codec and
//! pipeline can be exercised without a device.

use crate::error::Result;
use lutreg_fabric::RegisterLocation;
use std::fmt::{self, Debug};
use std::path::Path;

/// Name → location and location → frame lookups
pub trait RegisterLookup: Debug {
    /// Ordered locations of a register instance
    ///
    /// The returned order defines bit positions. An empty list means the
    /// register is unknown.
    ///
    /// # Errors
    ///
    /// Returns error if the lookup itself fails.
    fn locate(&self, register: &str) -> Result<Vec<RegisterLocation>>;

    /// Configuration-frame addresses backing one location
    ///
    /// An empty list means no frames are known for the location.
    ///
    /// # Errors
    ///
    /// Returns error if the lookup itself fails.
    fn frame_addresses(&self, location: &RegisterLocation) -> Result<Vec<u32>>;
}

/// Raw access to the device's configuration memory
pub trait ConfigPort: Debug {
    /// Read `count` frames starting at `start` into `dump`
    ///
    /// Blocks until the device interface finishes.
    ///
    /// # Errors
    ///
    /// Returns error if the device read fails.
    fn read_frames(&self, start: u32, count: usize, dump: &Path) -> Result<()>;

    /// Write a packed binary image to the device
    ///
    /// # Errors
    ///
    /// Returns error if the device write fails.
    fn write_image(&self, image: &Path) -> Result<()>;
}

/// Partial-bitstream assembly, INIT editing and packaging
pub trait BitstreamTools: Debug {
    /// Build a partial bitstream at `partial` from the frames in `dump`
    ///
    /// # Errors
    ///
    /// Returns error if the assembler fails.
    fn assemble_partial(&self, dump: &Path, addresses: &[u32], partial: &Path) -> Result<()>;

    /// Raw INIT listing of one slice (header line + four value lines)
    ///
    /// # Errors
    ///
    /// Returns error if the INIT editor fails.
    fn init_listing(&self, bitstream: &Path, slice: &str) -> Result<String>;

    /// Apply INIT write flags to one slice, in place
    ///
    /// # Errors
    ///
    /// Returns error if the INIT editor fails.
    fn patch_init(&self, bitstream: &Path, slice: &str, flags: &[String]) -> Result<()>;

    /// Pack a partial bitstream into a binary image at `image`
    ///
    /// # Errors
    ///
    /// Returns error if the packager fails.
    fn pack(&self, bitstream: &Path, image: &Path) -> Result<()>;
}

/// External collaborators, as named in diagnostics and configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Register name → slice locations
    Locator,
    /// Slice location → frame addresses
    Resolver,
    /// Device configuration interface (frame read, image write)
    DeviceConfig,
    /// Frame dump → partial bitstream
    PartialAssembler,
    /// LUT INIT reader/writer
    InitEditor,
    /// Partial bitstream → binary image
    Packager,
}

impl Tool {
    /// All tools
    pub const ALL: [Self; 6] = [
        Self::Locator,
        Self::Resolver,
        Self::DeviceConfig,
        Self::PartialAssembler,
        Self::InitEditor,
        Self::Packager,
    ];

    /// Default script for this tool
    pub const fn default_script(self) -> &'static str {
        match self {
            Self::Locator => "reg2loc.py",
            Self::Resolver => "loc2addr.py",
            Self::DeviceConfig => "xilinx-devcfg/devcfg.py",
            Self::PartialAssembler => "gen_partial_bitstream.py",
            Self::InitEditor => "bitmod_init.py",
            Self::Packager => "bit2bin.py",
        }
    }

    /// Environment variable overriding the script path
    pub const fn env_var(self) -> &'static str {
        match self {
            Self::Locator => "LUTREG_REG2LOC",
            Self::Resolver => "LUTREG_LOC2ADDR",
            Self::DeviceConfig => "LUTREG_DEVCFG",
            Self::PartialAssembler => "LUTREG_PARBIT",
            Self::InitEditor => "LUTREG_BITMOD",
            Self::Packager => "LUTREG_BIT2BIN",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_script())
    }
}
