// SPDX-License-Identifier: AGPL-3.0-only

//! Fabric model for LUT-backed registers.
//!
//! This crate has **no dependencies** and **no device access**. It is a pure
//! model of how a logical register is spread over the INIT words of 6-input
//! LUTs: which slot a LUT occupies in a slice, which INIT bits feed the o5/o6
//! outputs, and how a register's bits map onto an ordered list of locations.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`lut`] | `Lut` slot symbols and `RegisterLocation` (`SLICE_X10Y20/A6LUT`) |
//! | [`init`] | `LutInitWord` o5/o6 bit access, `SliceInit` (A..D words of a slice) |
//! | [`register`] | `RegisterIndex`, `RegisterDescriptor`, register bit layout |
//! | [`frames`] | `FrameAddressSet`, the configuration frames behind a register |
//! | [`protocol`] | Wire constants shared with the external bitstream tools |
//!
//! # Bit layout
//!
//! ```text
//! LutInitWord (64 bits)
//!   63 ............ 32 | 31 ............. 0
//!   o6[31..0]          | o5[31..0]
//!
//! Register value for a descriptor of N locations, register index k:
//!   bit i     = o5 bit k of location i   (0 <= i < N)
//!   bit N + i = o6 bit k of location i
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod frames;
pub mod init;
pub mod lut;
pub mod protocol;
pub mod register;

mod error;

pub use error::FabricError;
pub use frames::FrameAddressSet;
pub use init::{LutInitWord, SliceInit};
pub use lut::{Lut, RegisterLocation};
pub use register::{RegisterDescriptor, RegisterIndex};
