// SPDX-License-Identifier: AGPL-3.0-only

//! Configuration frame addresses.
//!
//! The frames backing a register are read as one contiguous run starting at
//! the lowest address, then re-assembled into a partial bitstream covering
//! exactly the resolved addresses.

use std::collections::BTreeSet;
use std::fmt;

/// Set of configuration-frame addresses covering a register.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameAddressSet(BTreeSet<u32>);

impl FrameAddressSet {
    /// Lowest address, or `None` if empty.
    #[must_use]
    pub fn start(&self) -> Option<u32> {
        self.0.first().copied()
    }

    /// Number of distinct frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no frames were resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Addresses in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    /// Addresses in ascending order, collected.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }
}

impl FromIterator<u32> for FrameAddressSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for FrameAddressSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, addr) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{addr:#x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_is_minimum_and_duplicates_collapse() {
        let set: FrameAddressSet = [0x0042_0102, 0x0042_0100, 0x0042_0101, 0x0042_0100]
            .into_iter()
            .collect();
        assert_eq!(set.start(), Some(0x0042_0100));
        assert_eq!(set.len(), 3);
        assert_eq!(set.to_vec(), vec![0x0042_0100, 0x0042_0101, 0x0042_0102]);
    }

    #[test]
    fn empty_set_has_no_start() {
        let set = FrameAddressSet::default();
        assert!(set.is_empty());
        assert_eq!(set.start(), None);
    }

    #[test]
    fn display_lists_hex() {
        let set: FrameAddressSet = [0x10, 0x11].into_iter().collect();
        assert_eq!(set.to_string(), "0x10 0x11");
    }
}
