// SPDX-License-Identifier: AGPL-3.0-only

//! LUT INIT access inside a partial bitstream
//!
//! Translates between a slice's four INIT words and the INIT editor's text
//! protocol: a listing for reads, one `--<x>6lut=0x..` flag per LUT plus
//! `--nocrc` for writes. CRC is left to the packager.

use crate::backend::{BitstreamTools, Tool};
use crate::error::{LutRegError, Result};
use lutreg_fabric::protocol::{
    parse_hex_u64, FLAG_NOCRC, LISTING_HEADER_LINES, LISTING_VALUE_LINES, LISTING_VALUE_TOKEN,
};
use lutreg_fabric::{Lut, LutInitWord, SliceInit};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Reads and writes slice INIT words of one bitstream artifact
#[derive(Debug, Clone, Copy)]
pub struct LutInitCodec<'a> {
    tools: &'a dyn BitstreamTools,
    bitstream: &'a Path,
}

impl<'a> LutInitCodec<'a> {
    /// Codec over `bitstream`, using `tools` for the INIT editor
    pub fn new(tools: &'a dyn BitstreamTools, bitstream: &'a Path) -> Self {
        Self { tools, bitstream }
    }

    /// Read the four INIT words of `slice` (A, B, C, D)
    ///
    /// # Errors
    ///
    /// Returns error if the INIT editor fails or its listing is malformed.
    pub fn read_init(&self, slice: &str) -> Result<SliceInit> {
        debug!("Reading INIT words of {slice} from {}", self.bitstream.display());
        let listing = self.tools.init_listing(self.bitstream, slice)?;
        parse_listing(&listing)
    }

    /// Write INIT words for the LUTs in `updates`; other LUTs are untouched
    ///
    /// An empty update set issues no tool call.
    ///
    /// # Errors
    ///
    /// Returns error if the INIT editor fails.
    pub fn write_init(&self, slice: &str, updates: &BTreeMap<Lut, LutInitWord>) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let flags = write_flags(updates);
        debug!("Patching {slice}: {}", flags.join(" "));
        self.tools.patch_init(self.bitstream, slice, &flags)
    }
}

/// Parse an INIT listing into slot-ordered words
///
/// The header line is skipped; each remaining non-blank line must carry a
/// hex value as its third token, and exactly four such lines are required.
///
/// # Errors
///
/// Returns `LutRegError::ToolOutput` for any malformed line or wrong line count.
pub fn parse_listing(listing: &str) -> Result<SliceInit> {
    let tool = Tool::InitEditor.to_string();
    let mut words = Vec::with_capacity(LISTING_VALUE_LINES);

    for (lineno, line) in listing
        .trim()
        .lines()
        .enumerate()
        .skip(LISTING_HEADER_LINES)
    {
        if line.trim().is_empty() {
            continue;
        }

        let token = line
            .split_whitespace()
            .nth(LISTING_VALUE_TOKEN)
            .ok_or_else(|| {
                LutRegError::tool_output(&tool, format!("line {}: no INIT value in {line:?}", lineno + 1))
            })?;

        let raw = parse_hex_u64(token).map_err(|e| {
            LutRegError::tool_output(&tool, format!("line {}: bad INIT value {token:?}: {e}", lineno + 1))
        })?;

        words.push(LutInitWord::new(raw));
    }

    let words: [LutInitWord; LISTING_VALUE_LINES] = words.try_into().map_err(|w: Vec<_>| {
        LutRegError::tool_output(
            &tool,
            format!("expected {LISTING_VALUE_LINES} INIT values, got {}", w.len()),
        )
    })?;

    Ok(SliceInit::new(words))
}

/// Write flags for a set of LUT updates, `--nocrc` first
pub fn write_flags(updates: &BTreeMap<Lut, LutInitWord>) -> Vec<String> {
    std::iter::once(FLAG_NOCRC.to_string())
        .chain(
            updates
                .iter()
                .map(|(lut, word)| format!("{}={word:#x}", lut.write_flag())),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
INIT values of SLICE_X10Y20
SLICE_X10Y20 A6LUT 0x0000000100000000
SLICE_X10Y20 B6LUT 0x0000000000000001
SLICE_X10Y20 C6LUT 0xffffffffffffffff
SLICE_X10Y20 D6LUT 0x0123456789abcdef
";

    #[test]
    fn parses_four_words_in_slot_order() {
        let init = parse_listing(LISTING).unwrap();
        assert_eq!(init.get(Lut::A).raw(), 0x0000_0001_0000_0000);
        assert_eq!(init.get(Lut::B).raw(), 1);
        assert_eq!(init.get(Lut::C).raw(), u64::MAX);
        assert_eq!(init.get(Lut::D).raw(), 0x0123_4567_89ab_cdef);
    }

    #[test]
    fn header_is_skipped_even_if_it_looks_like_data() {
        let listing = "x y 0xdead\na a 0x1\nb b 0x2\nc c 0x3\nd d 0x4\n";
        let init = parse_listing(listing).unwrap();
        assert_eq!(init.get(Lut::A).raw(), 1);
    }

    #[test]
    fn missing_token_rejected() {
        let listing = "header\na a 0x1\nb b\nc c 0x3\nd d 0x4\n";
        let err = parse_listing(listing).unwrap_err();
        assert!(matches!(err, LutRegError::ToolOutput { .. }), "{err}");
    }

    #[test]
    fn non_hex_rejected() {
        let listing = "header\na a 0x1\nb b 0xZZ\nc c 0x3\nd d 0x4\n";
        assert!(parse_listing(listing).is_err());
    }

    #[test]
    fn wrong_line_count_rejected() {
        assert!(parse_listing("header\na a 0x1\n").is_err());
        assert!(parse_listing("").is_err());
        let five = format!("{LISTING}extra line 0x5\n");
        assert!(parse_listing(&five).is_err());
    }

    #[test]
    fn flags_batch_all_luts_after_nocrc() {
        let mut updates = BTreeMap::new();
        updates.insert(Lut::C, LutInitWord::new(0xab));
        updates.insert(Lut::A, LutInitWord::new(0x1_0000_0000));

        assert_eq!(
            write_flags(&updates),
            vec!["--nocrc", "--a6lut=0x100000000", "--c6lut=0xab"]
        );
    }
}
