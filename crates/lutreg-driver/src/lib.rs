// SPDX-License-Identifier: AGPL-3.0-only

//! Register access for LUT-backed FPGA registers.
//!
//! A "register" here is not a hardware register. Its bits live in the INIT
//! words of LUTs spread across fabric slices, and it is read or written by
//! partially reconfiguring only the frames that hold those LUTs. The rest of
//! the design keeps running.
//!
//! # Pipeline
//!
//! ```text
//! name ──locate──▶ [slice/lut, ..] ──resolve──▶ frames ──read──▶ frame dump
//!      ──assemble──▶ partial bitstream ──codec──▶ value           (read)
//!                                      ──codec──▶ edited partial
//!      ──pack──▶ binary image ──write──▶ device                   (write)
//! ```
//!
//! # Backend hierarchy
//!
//! ```text
//! Production:
//!   ProcessBackend: external device/bitstream scripts, one child process per call
//!
//! Development / CI:
//!   SoftwareFabric: simulated configuration memory, same text protocols
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use lutreg_driver::{ArtifactPaths, Operation, ProcessBackend, ReconfigurationPipeline, ToolConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = ProcessBackend::new(ToolConfig::from_env());
//! let pipeline = ReconfigurationPipeline::new(
//!     &backend,
//!     &backend,
//!     &backend,
//!     ArtifactPaths::in_dir("/tmp/lutreg"),
//! );
//!
//! let outcome = pipeline.run("CTRL", "3".parse()?, Operation::Read)?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

mod backend;
pub mod backends;
pub mod codec;
mod config;
mod error;
pub mod lut_init;
pub mod pipeline;

pub use backend::{BitstreamTools, ConfigPort, RegisterLookup, Tool};
pub use backends::{ProcessBackend, SoftwareFabric, ToolCall};
pub use codec::{EncodeSummary, RegisterCodec};
pub use config::{ArtifactPaths, ToolConfig};
pub use error::{ErrorKind, LutRegError, Result};
pub use lut_init::LutInitCodec;
pub use pipeline::{Operation, Outcome, ReconfigurationPipeline, Stage};

/// Fabric model types (re-exported from lutreg-fabric).
pub mod fabric {
    pub use lutreg_fabric::*;
}
