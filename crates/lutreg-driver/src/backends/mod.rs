// SPDX-License-Identifier: AGPL-3.0-only

//! Collaborator backend implementations
//!
//! Two backends available:
//! - **Process**: runs the external device/bitstream scripts (production)
//! - **Software**: simulated fabric held in memory (tests, no device)

pub mod process;
pub mod software;

pub use process::ProcessBackend;
pub use software::{SoftwareFabric, ToolCall};
