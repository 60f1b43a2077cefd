// SPDX-License-Identifier: AGPL-3.0-only

//! Read-modify-write reconfiguration pipeline
//!
//! ```text
//! Locate → ResolveAddr → ReadFrames → BuildPartial ─┬→ ReadRegister                 (read)
//!                                                   └→ ModifyRegister → Pack → WriteFrames (write)
//! ```
//!
//! Stages run strictly in order, one blocking collaborator call at a time.
//! The first failure aborts the run; there is no resume, a retry starts again
//! at `Locate`. All frames of a register are assumed to be covered by the
//! frames of its first location, so only that location is resolved.

use crate::backend::{BitstreamTools, ConfigPort, RegisterLookup};
use crate::codec::{EncodeSummary, RegisterCodec};
use crate::config::ArtifactPaths;
use crate::error::{LutRegError, Result};
use crate::lut_init::LutInitCodec;
use lutreg_fabric::{FrameAddressSet, RegisterDescriptor, RegisterIndex};
use std::fmt;
use tracing::{debug, info};

/// Pipeline stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Register name → ordered locations
    Locate,
    /// First location → frame addresses
    ResolveAddr,
    /// Device frames → frame dump
    ReadFrames,
    /// Frame dump → partial bitstream
    BuildPartial,
    /// Decode the register value (read path, terminal)
    ReadRegister,
    /// Encode the new value into the partial bitstream (write path)
    ModifyRegister,
    /// Partial bitstream → binary image
    Pack,
    /// Binary image → device (write path, terminal)
    WriteFrames,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Locate => "locate",
            Self::ResolveAddr => "resolve-addr",
            Self::ReadFrames => "read-frames",
            Self::BuildPartial => "build-partial",
            Self::ReadRegister => "read-register",
            Self::ModifyRegister => "modify-register",
            Self::Pack => "pack",
            Self::WriteFrames => "write-frames",
        };
        f.write_str(name)
    }
}

/// What to do with the register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Read and report the current value
    Read,
    /// Write a new value
    Write(u32),
}

/// Successful pipeline result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Value read from the register
    Read(u32),
    /// Value written; device reconfigured
    Written(EncodeSummary),
}

/// Sequences collaborators and the register codec for one register access
#[derive(Debug)]
pub struct ReconfigurationPipeline<'a> {
    lookup: &'a dyn RegisterLookup,
    port: &'a dyn ConfigPort,
    tools: &'a dyn BitstreamTools,
    paths: ArtifactPaths,
}

impl<'a> ReconfigurationPipeline<'a> {
    /// Pipeline over the given collaborators and artifact paths
    pub fn new(
        lookup: &'a dyn RegisterLookup,
        port: &'a dyn ConfigPort,
        tools: &'a dyn BitstreamTools,
        paths: ArtifactPaths,
    ) -> Self {
        Self {
            lookup,
            port,
            tools,
            paths,
        }
    }

    /// Run the pipeline for one register access
    ///
    /// # Errors
    ///
    /// Returns `LutRegError::StageFailed` naming the first stage that failed.
    pub fn run(&self, register: &str, index: RegisterIndex, operation: Operation) -> Result<Outcome> {
        info!("{operation:?} {register}[{index}]");

        let descriptor = run_stage(Stage::Locate, || self.locate(register))?;
        let frames = run_stage(Stage::ResolveAddr, || self.resolve(register, &descriptor))?;
        run_stage(Stage::ReadFrames, || self.read_frames(&frames))?;
        run_stage(Stage::BuildPartial, || {
            self.tools
                .assemble_partial(&self.paths.frame_dump, &frames.to_vec(), &self.paths.partial)
        })?;

        let mut codec = RegisterCodec::new(LutInitCodec::new(self.tools, &self.paths.partial));

        match operation {
            Operation::Read => {
                let value = run_stage(Stage::ReadRegister, || codec.decode(&descriptor, index))?;
                info!("{register}[{index}] = {value:#010x}");
                Ok(Outcome::Read(value))
            }
            Operation::Write(value) => {
                let summary = run_stage(Stage::ModifyRegister, || {
                    codec.encode(&descriptor, index, value)
                })?;
                run_stage(Stage::Pack, || {
                    self.tools.pack(&self.paths.partial, &self.paths.image)
                })?;
                run_stage(Stage::WriteFrames, || self.port.write_image(&self.paths.image))?;
                info!("{register}[{index}] <- {:#010x}", summary.value);
                Ok(Outcome::Written(summary))
            }
        }
    }

    /// Ordered locations of `register`
    ///
    /// # Errors
    ///
    /// Returns `LutRegError::RegisterNotFound` if the locator knows none.
    pub fn locate(&self, register: &str) -> Result<RegisterDescriptor> {
        let locations = self.lookup.locate(register)?;
        if locations.is_empty() {
            return Err(LutRegError::RegisterNotFound {
                register: register.to_string(),
            });
        }

        let descriptor = RegisterDescriptor::new(locations)?;
        debug!("{register}: {} location(s): {descriptor}", descriptor.len());
        Ok(descriptor)
    }

    /// Frames of the register's first location
    ///
    /// # Errors
    ///
    /// Returns `LutRegError::FramesNotFound` if the resolver knows none.
    pub fn resolve(&self, register: &str, descriptor: &RegisterDescriptor) -> Result<FrameAddressSet> {
        let frames: FrameAddressSet = self
            .lookup
            .frame_addresses(descriptor.first())?
            .into_iter()
            .collect();

        if frames.is_empty() {
            return Err(LutRegError::FramesNotFound {
                register: register.to_string(),
            });
        }

        debug!("{register}: frames {frames}");
        Ok(frames)
    }

    fn read_frames(&self, frames: &FrameAddressSet) -> Result<()> {
        let start = frames
            .start()
            .ok_or_else(|| LutRegError::invariant("empty frame set reached read-frames"))?;
        self.port
            .read_frames(start, frames.len(), &self.paths.frame_dump)
    }
}

fn run_stage<T>(stage: Stage, f: impl FnOnce() -> Result<T>) -> Result<T> {
    debug!("Stage {stage}");
    f().map_err(|err| {
        debug!("Stage {stage} failed: {err}");
        LutRegError::stage_failed(stage, err)
    })
}
