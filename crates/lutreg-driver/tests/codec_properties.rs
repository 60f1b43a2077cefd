// SPDX-License-Identifier: AGPL-3.0-only

//! Codec properties over random fabrics, register shapes and indices

use lutreg_driver::fabric::{Lut, RegisterDescriptor, RegisterIndex, RegisterLocation, SliceInit};
use lutreg_driver::{BitstreamTools, ConfigPort, LutInitCodec, RegisterCodec, SoftwareFabric};
use proptest::prelude::*;
use std::path::Path;

const SLICES: [&str; 3] = ["SLICE_X0Y0", "SLICE_X0Y1", "SLICE_X1Y0"];
const DUMP: &str = "devcfg.out";
const PARTIAL: &str = "devcfg.out.partial";

/// Fabric with random INIT words, staged up to the partial bitstream
fn staged(words: &[[u64; 4]; 3]) -> SoftwareFabric {
    let fabric = SLICES
        .iter()
        .zip(words)
        .zip(0u32..)
        .fold(SoftwareFabric::new(), |f, ((slice, init), frame)| {
            f.with_slice(slice, &[0x200 + frame], *init)
        });
    fabric
        .read_frames(0x200, SLICES.len(), Path::new(DUMP))
        .expect("read frames");
    fabric
        .assemble_partial(Path::new(DUMP), &[0x200, 0x201, 0x202], Path::new(PARTIAL))
        .expect("assemble");
    fabric
}

/// Between 1 and 12 distinct locations, in random order
fn descriptor() -> impl Strategy<Value = RegisterDescriptor> {
    let all: Vec<RegisterLocation> = SLICES
        .iter()
        .flat_map(|s| Lut::ALL.map(|lut| RegisterLocation::new(*s, lut)))
        .collect();
    Just(all)
        .prop_shuffle()
        .prop_flat_map(|locs| {
            (1..=locs.len()).prop_map(move |n| locs[..n].to_vec())
        })
        .prop_map(|locs| RegisterDescriptor::new(locs).expect("1..=12 locations"))
}

fn index() -> impl Strategy<Value = RegisterIndex> {
    (0u8..=31).prop_map(|i| RegisterIndex::new(i).expect("in range"))
}

fn words() -> impl Strategy<Value = [[u64; 4]; 3]> {
    any::<[[u64; 4]; 3]>()
}

proptest! {
    #[test]
    fn rewrite_of_current_value_is_noop(words in words(), desc in descriptor(), idx in index()) {
        let fabric = staged(&words);
        let partial = Path::new(PARTIAL);
        let mut codec = RegisterCodec::new(LutInitCodec::new(&fabric, partial));

        let current = codec.decode(&desc, idx).expect("decode");
        let summary = codec.encode(&desc, idx, current).expect("encode");
        prop_assert_eq!(summary.words_changed, 0);

        for (slice, init) in SLICES.iter().zip(&words) {
            let after = fabric.artifact_init(partial, slice).expect("slice in partial");
            prop_assert_eq!(after, SliceInit::from_raw(*init));
        }
    }

    #[test]
    fn written_value_reads_back(
        words in words(),
        desc in descriptor(),
        idx in index(),
        value in any::<u32>(),
    ) {
        let fabric = staged(&words);
        let partial = Path::new(PARTIAL);

        let mut codec = RegisterCodec::new(LutInitCodec::new(&fabric, partial));
        let summary = codec.encode(&desc, idx, value).expect("encode");
        prop_assert_eq!(summary.value, value & desc.value_mask());

        // a fresh codec reads from the patched artifact, not the cache
        let mut fresh = RegisterCodec::new(LutInitCodec::new(&fabric, partial));
        prop_assert_eq!(fresh.decode(&desc, idx).expect("decode"), summary.value);
    }

    #[test]
    fn write_only_touches_owned_bits(
        words in words(),
        desc in descriptor(),
        idx in index(),
        value in any::<u32>(),
    ) {
        let fabric = staged(&words);
        let partial = Path::new(PARTIAL);
        let owned = (1u64 << idx.get()) | (1u64 << (32 + idx.get()));

        let mut codec = RegisterCodec::new(LutInitCodec::new(&fabric, partial));
        codec.encode(&desc, idx, value).expect("encode");

        for (slice, init) in SLICES.iter().zip(&words) {
            let after = fabric.artifact_init(partial, slice).expect("slice in partial");
            for lut in Lut::ALL {
                let before = init[lut.slot()];
                let now = after.get(lut).raw();
                let in_register = desc
                    .locations()
                    .iter()
                    .any(|l| l.slice == *slice && l.lut == lut);
                let mask = if in_register { !owned } else { u64::MAX };
                prop_assert_eq!(now & mask, before & mask, "{}/{}", slice, lut);
            }
        }
    }
}
