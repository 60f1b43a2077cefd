// SPDX-License-Identifier: AGPL-3.0-only

//! LUT slot symbols and register locations.
//!
//! A slice carries four 6-input LUTs, named A6LUT..D6LUT. The external
//! tools always list and accept them in that order, so a `Lut` doubles as
//! the positional slot inside a [`SliceInit`](crate::SliceInit).

use std::fmt;
use std::str::FromStr;

use crate::error::FabricError;

/// One of the four 6-input LUTs in a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lut {
    /// A6LUT, slot 0
    A,
    /// B6LUT, slot 1
    B,
    /// C6LUT, slot 2
    C,
    /// D6LUT, slot 3
    D,
}

impl Lut {
    /// All LUTs in slot order.
    pub const ALL: [Self; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// Positional slot inside a slice (A=0 .. D=3).
    #[must_use]
    pub const fn slot(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }

    /// Full symbol as the tools print it, e.g. `A6LUT`.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::A => "A6LUT",
            Self::B => "B6LUT",
            Self::C => "C6LUT",
            Self::D => "D6LUT",
        }
    }

    /// Write flag understood by the INIT editor, e.g. `--a6lut`.
    #[must_use]
    pub const fn write_flag(self) -> &'static str {
        match self {
            Self::A => crate::protocol::FLAG_A6LUT,
            Self::B => crate::protocol::FLAG_B6LUT,
            Self::C => crate::protocol::FLAG_C6LUT,
            Self::D => crate::protocol::FLAG_D6LUT,
        }
    }
}

impl fmt::Display for Lut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Lut {
    type Err = FabricError;

    /// Accepts `A6LUT` or the bare letter `A` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A6LUT" | "A" => Ok(Self::A),
            "B6LUT" | "B" => Ok(Self::B),
            "C6LUT" | "C" => Ok(Self::C),
            "D6LUT" | "D" => Ok(Self::D),
            _ => Err(FabricError::UnknownLut {
                symbol: s.to_string(),
            }),
        }
    }
}

/// One physical contribution to a register: a LUT inside a named slice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegisterLocation {
    /// Slice identifier, e.g. `SLICE_X10Y20`
    pub slice: String,
    /// LUT within the slice
    pub lut: Lut,
}

impl RegisterLocation {
    /// Create a location.
    pub fn new(slice: impl Into<String>, lut: Lut) -> Self {
        Self {
            slice: slice.into(),
            lut,
        }
    }
}

impl fmt::Display for RegisterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.slice, self.lut)
    }
}

impl FromStr for RegisterLocation {
    type Err = FabricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let malformed = || FabricError::MalformedLocation {
            text: text.to_string(),
        };

        let (slice, lut) = text.split_once('/').ok_or_else(malformed)?;
        if slice.is_empty() || lut.contains('/') {
            return Err(malformed());
        }

        Ok(Self::new(slice, lut.parse()?))
    }
}
