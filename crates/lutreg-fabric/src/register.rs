// SPDX-License-Identifier: AGPL-3.0-only

//! Register footprints and bit layout.
//!
//! A register is an ordered list of N LUT locations. For register index `k`,
//! location `i` contributes its o5 bit `k` as register bit `i` and its o6 bit
//! `k` as register bit `N + i`. The order of the list is the only source of
//! truth for bit positions, so the same descriptor must be used for a read
//! and any later write of the same register.

use std::fmt;
use std::str::FromStr;

use crate::error::FabricError;
use crate::lut::RegisterLocation;

/// Highest valid register index.
pub const MAX_INDEX: u8 = 31;

/// Registers are capped at 32 bits, i.e. 16 locations.
pub const MAX_LOCATIONS: usize = 16;

/// Validated register index in `[0, 31]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegisterIndex(u8);

impl RegisterIndex {
    /// Validate a register index.
    ///
    /// # Errors
    ///
    /// Returns `FabricError::InvalidIndex` if `index > 31`.
    pub fn new(index: u8) -> Result<Self, FabricError> {
        if index > MAX_INDEX {
            return Err(FabricError::InvalidIndex {
                input: index.to_string(),
            });
        }
        Ok(Self(index))
    }

    /// Index as a shift amount.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0 as u32
    }
}

impl TryFrom<i64> for RegisterIndex {
    type Error = FabricError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| FabricError::InvalidIndex {
                input: value.to_string(),
            })
            .and_then(Self::new)
    }
}

impl FromStr for RegisterIndex {
    type Err = FabricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s.trim().parse().map_err(|_| FabricError::InvalidIndex {
            input: s.to_string(),
        })?;
        Self::try_from(value)
    }
}

impl fmt::Display for RegisterIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered list of locations making up one register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDescriptor {
    locations: Vec<RegisterLocation>,
}

impl RegisterDescriptor {
    /// Build a descriptor, keeping the given order.
    ///
    /// # Errors
    ///
    /// Returns `FabricError::EmptyDescriptor` for an empty list,
    /// `FabricError::DescriptorTooWide` for more than 16 locations and
    /// `FabricError::DuplicateLocation` if a location repeats (two register
    /// bits would share one INIT bit).
    pub fn new(locations: Vec<RegisterLocation>) -> Result<Self, FabricError> {
        if locations.is_empty() {
            return Err(FabricError::EmptyDescriptor);
        }
        if locations.len() > MAX_LOCATIONS {
            return Err(FabricError::DescriptorTooWide {
                locations: locations.len(),
            });
        }
        for (i, loc) in locations.iter().enumerate() {
            if locations[..i].contains(loc) {
                return Err(FabricError::DuplicateLocation {
                    location: loc.to_string(),
                });
            }
        }
        Ok(Self { locations })
    }

    /// Locations in bit order.
    #[must_use]
    pub fn locations(&self) -> &[RegisterLocation] {
        &self.locations
    }

    /// Number of locations (N).
    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Always false; descriptors are non-empty by construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// First location; its frames stand in for the whole register.
    #[must_use]
    pub fn first(&self) -> &RegisterLocation {
        &self.locations[0]
    }

    /// Register width in bits (2N).
    #[must_use]
    pub fn width(&self) -> u32 {
        // len <= 16, checked in new()
        #[allow(clippy::cast_possible_truncation)]
        let n = self.locations.len() as u32;
        2 * n
    }

    /// Mask of the bits a register value may use.
    #[must_use]
    pub fn value_mask(&self) -> u32 {
        match self.width() {
            32 => u32::MAX,
            w => (1u32 << w) - 1,
        }
    }

    /// Register bit positions `(o5, o6)` fed by location `i`.
    #[must_use]
    pub fn bit_positions(&self, i: usize) -> (u32, u32) {
        #[allow(clippy::cast_possible_truncation)]
        let (i, n) = (i as u32, self.locations.len() as u32);
        (i, n + i)
    }

    /// Target `(o5, o6)` values of location `i` for a register value.
    #[must_use]
    pub fn outputs_for(&self, i: usize, value: u32) -> (bool, bool) {
        let (o5_pos, o6_pos) = self.bit_positions(i);
        (value & (1 << o5_pos) != 0, value & (1 << o6_pos) != 0)
    }

    /// Fold location `i`'s `(o5, o6)` outputs into a register value.
    #[must_use]
    pub fn place_outputs(&self, value: u32, i: usize, o5: bool, o6: bool) -> u32 {
        let (o5_pos, o6_pos) = self.bit_positions(i);
        value | (u32::from(o5) << o5_pos) | (u32::from(o6) << o6_pos)
    }
}

impl<'a> IntoIterator for &'a RegisterDescriptor {
    type Item = &'a RegisterLocation;
    type IntoIter = std::slice::Iter<'a, RegisterLocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.locations.iter()
    }
}

impl fmt::Display for RegisterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, loc) in self.locations.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{loc}")?;
        }
        Ok(())
    }
}
