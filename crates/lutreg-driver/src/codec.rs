// SPDX-License-Identifier: AGPL-3.0-only

//! Register ⇄ LUT-bit codec
//!
//! Converts between a register value and the o5/o6 bits it occupies in the
//! INIT words of its locations. One codec instance lives for one pipeline
//! run: slice INIT words are fetched lazily, cached, and edits made by
//! [`RegisterCodec::encode`] are visible to later reads in the same run.
//!
//! ```text
//! descriptor [L0, L1, .. L(N-1)], index k
//!
//!   value bit i     ⇄ INIT(Li) bit k        (o5)
//!   value bit N + i ⇄ INIT(Li) bit 32 + k   (o6)
//! ```

use crate::error::Result;
use crate::lut_init::LutInitCodec;
use lutreg_fabric::{Lut, LutInitWord, RegisterDescriptor, RegisterIndex, SliceInit};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Slice INIT words fetched during one run
pub type SliceInitMap = HashMap<String, SliceInit>;

/// Pending INIT edits, grouped by slice then LUT
pub type PendingWrites = BTreeMap<String, BTreeMap<Lut, LutInitWord>>;

/// Result of an encode pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeSummary {
    /// INIT editor invocations (one per distinct slice)
    pub slices_flushed: usize,
    /// LUT words written
    pub words_written: usize,
    /// LUT words whose value actually changed
    pub words_changed: usize,
    /// Register value after truncation to the register width
    pub value: u32,
}

/// Encoder/decoder for LUT-backed registers over one bitstream artifact
#[derive(Debug)]
pub struct RegisterCodec<'a> {
    init: LutInitCodec<'a>,
    cache: SliceInitMap,
}

impl<'a> RegisterCodec<'a> {
    /// Codec with an empty per-run cache
    pub fn new(init: LutInitCodec<'a>) -> Self {
        Self {
            init,
            cache: SliceInitMap::new(),
        }
    }

    /// Slices fetched so far
    pub fn cached_slices(&self) -> usize {
        self.cache.len()
    }

    /// Read the register value at `index`
    ///
    /// Location `i` supplies bit `i` (o5) and bit `N + i` (o6).
    ///
    /// # Errors
    ///
    /// Returns error if a slice's INIT words cannot be read.
    pub fn decode(&mut self, descriptor: &RegisterDescriptor, index: RegisterIndex) -> Result<u32> {
        let mut value = 0;

        for (i, loc) in descriptor.locations().iter().enumerate() {
            let word = self.fetch(&loc.slice)?.get(loc.lut);
            let (o5, o6) = (word.o5(index), word.o6(index));
            debug!("{loc}[{index}]: o5={} o6={}", u8::from(o5), u8::from(o6));
            value = descriptor.place_outputs(value, i, o5, o6);
        }

        Ok(value)
    }

    /// Write `value` into the register at `index`
    ///
    /// Only bits `index` and `32 + index` of each participating INIT word are
    /// modified. Edits are batched and flushed with one INIT editor call per
    /// slice. Bits of `value` above the register width are dropped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns error if INIT words cannot be read or written.
    pub fn encode(
        &mut self,
        descriptor: &RegisterDescriptor,
        index: RegisterIndex,
        value: u32,
    ) -> Result<EncodeSummary> {
        let mask = descriptor.value_mask();
        if value & !mask != 0 {
            warn!(
                "Value {value:#010x} exceeds {}-bit register, truncating to {:#010x}",
                descriptor.width(),
                value & mask
            );
        }
        let value = value & mask;

        let mut pending = PendingWrites::new();
        let mut originals: HashMap<(&str, Lut), LutInitWord> = HashMap::new();
        let mut summary = EncodeSummary {
            value,
            ..EncodeSummary::default()
        };

        for (i, loc) in descriptor.locations().iter().enumerate() {
            let (o5, o6) = descriptor.outputs_for(i, value);

            let slice = self.fetch(&loc.slice)?;
            let before = slice.get(loc.lut);
            let after = before.with_outputs(index, o5, o6);
            slice.set(loc.lut, after);
            originals.entry((loc.slice.as_str(), loc.lut)).or_insert(before);

            debug!("{loc}[{index}]: {before} -> {after}");
            pending
                .entry(loc.slice.clone())
                .or_default()
                .insert(loc.lut, after);
        }

        for (slice, updates) in &pending {
            self.init.write_init(slice, updates)?;
            summary.slices_flushed += 1;
            summary.words_written += updates.len();
        }

        summary.words_changed = pending
            .iter()
            .flat_map(|(slice, updates)| {
                updates
                    .iter()
                    .map(move |(lut, word)| (slice.as_str(), *lut, *word))
            })
            .filter(|(slice, lut, word)| originals.get(&(*slice, *lut)) != Some(word))
            .count();

        debug!(
            "Encoded {value:#x}: {} slice(s) flushed, {} word(s) changed",
            summary.slices_flushed, summary.words_changed
        );
        Ok(summary)
    }

    /// Cached INIT words of `slice`, reading them on first use
    fn fetch(&mut self, slice: &str) -> Result<&mut SliceInit> {
        match self.cache.entry(slice.to_string()) {
            Entry::Occupied(entry) => {
                debug!("INIT cache hit for {slice}");
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let init = self.init.read_init(slice)?;
                Ok(entry.insert(init))
            }
        }
    }
}
