// SPDX-License-Identifier: AGPL-3.0-only

//! Errors raised while building fabric model values.
//!
//! Hand-written `Display`/`Error` impls keep this crate dependency-free.

use std::fmt;

/// Errors from constructing or parsing fabric model values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FabricError {
    /// Register index outside `[0, 31]` or not an integer
    InvalidIndex {
        /// Offending input as given
        input: String,
    },

    /// LUT symbol is not one of A6LUT, B6LUT, C6LUT, D6LUT
    UnknownLut {
        /// Offending symbol
        symbol: String,
    },

    /// Location text is not of the form `<slice>/<lut>`
    MalformedLocation {
        /// Offending text
        text: String,
    },

    /// Register descriptor has no locations
    EmptyDescriptor,

    /// Register descriptor spans more than 32 bits
    DescriptorTooWide {
        /// Number of locations supplied
        locations: usize,
    },

    /// The same `<slice>/<lut>` appears twice in one register
    DuplicateLocation {
        /// Repeated location
        location: String,
    },

    /// Hex token is empty, signed, non-hex or wider than 64 bits
    InvalidHex {
        /// Offending token
        token: String,
    },
}

impl fmt::Display for FabricError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIndex { input } => write!(
                f,
                "Valid register index is in the range [0-31] (got {input:?})"
            ),
            Self::UnknownLut { symbol } => write!(f, "Unknown LUT symbol: {symbol}"),
            Self::MalformedLocation { text } => {
                write!(f, "Malformed register location {text:?} (expected <slice>/<lut>)")
            }
            Self::EmptyDescriptor => write!(f, "Register descriptor has no locations"),
            Self::DescriptorTooWide { locations } => write!(
                f,
                "Register spans {locations} locations ({} bits), limit is {} locations",
                locations * 2,
                crate::register::MAX_LOCATIONS
            ),
            Self::DuplicateLocation { location } => {
                write!(f, "Location {location} appears more than once in the register")
            }
            Self::InvalidHex { token } => write!(f, "Not a 64-bit hex value: {token:?}"),
        }
    }
}

impl std::error::Error for FabricError {}
