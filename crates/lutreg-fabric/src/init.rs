// SPDX-License-Identifier: AGPL-3.0-only

//! LUT INIT words.
//!
//! A 6-input LUT is configured by a 64-bit INIT word. In fractured mode the
//! low half drives the o5 output and the high half drives o6, each indexed by
//! the 5-bit input combination. A register index `k` therefore owns exactly
//! two bits of every participating word: `k` and `32 + k`. The other 62 bits
//! belong to other register indices and must never be disturbed.

use std::fmt;

use crate::lut::Lut;
use crate::register::RegisterIndex;

/// Offset of the o6 half inside an INIT word.
pub const O6_OFFSET: u32 = 32;

/// 64-bit LUT INIT value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LutInitWord(u64);

impl LutInitWord {
    /// Wrap a raw INIT value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw 64-bit value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// o5 output for input combination `index`.
    #[must_use]
    pub const fn o5(self, index: RegisterIndex) -> bool {
        self.0 & (1 << index.get()) != 0
    }

    /// o6 output for input combination `index`.
    #[must_use]
    pub const fn o6(self, index: RegisterIndex) -> bool {
        self.0 & (1 << (O6_OFFSET + index.get())) != 0
    }

    /// Mask of the two bits owned by `index`.
    #[must_use]
    pub const fn owned_mask(index: RegisterIndex) -> u64 {
        (1 << index.get()) | (1 << (O6_OFFSET + index.get()))
    }

    /// Copy of this word with the o5/o6 bits for `index` replaced.
    ///
    /// Only bits `index` and `32 + index` can differ from `self`.
    #[must_use]
    pub const fn with_outputs(self, index: RegisterIndex, o5: bool, o6: bool) -> Self {
        let o5_bit = 1u64 << index.get();
        let o6_bit = 1u64 << (O6_OFFSET + index.get());

        let mut raw = self.0 & !(o5_bit | o6_bit);
        if o5 {
            raw |= o5_bit;
        }
        if o6 {
            raw |= o6_bit;
        }
        Self(raw)
    }
}

impl From<u64> for LutInitWord {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for LutInitWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

impl fmt::LowerHex for LutInitWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// The four INIT words of one slice, in slot order A, B, C, D.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SliceInit([LutInitWord; 4]);

impl SliceInit {
    /// Build from words in slot order.
    #[must_use]
    pub const fn new(words: [LutInitWord; 4]) -> Self {
        Self(words)
    }

    /// Build from raw values in slot order.
    #[must_use]
    pub fn from_raw(raw: [u64; 4]) -> Self {
        Self(raw.map(LutInitWord::new))
    }

    /// Word for one LUT.
    #[must_use]
    pub const fn get(&self, lut: Lut) -> LutInitWord {
        self.0[lut.slot()]
    }

    /// Replace the word for one LUT.
    pub fn set(&mut self, lut: Lut, word: LutInitWord) {
        self.0[lut.slot()] = word;
    }

    /// `(lut, word)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Lut, LutInitWord)> + '_ {
        Lut::ALL.iter().map(move |&lut| (lut, self.get(lut)))
    }
}
