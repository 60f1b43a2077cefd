// SPDX-License-Identifier: AGPL-3.0-only

//! Wire constants shared with the external configuration and bitstream tools.
//!
//! ```text
//! devcfg.py read 0x<start> <count>      → devcfg.out            (frame dump)
//! gen_partial_bitstream.py devcfg.out 0x<addr>...
//!                                       → devcfg.out.partial    (partial bitstream)
//! bitmod_init.py <bit> <slice> -r       → listing on stdout
//! bitmod_init.py <bit> <slice> --nocrc --a6lut=0x.. ...
//! bit2bin.py devcfg.out.partial         → devcfg.out.partial.bin
//! devcfg.py write devcfg.out.partial.bin
//! ```
//!
//! INIT listing (`-r`): one header line, then one line per LUT in slot order
//! A..D whose third whitespace-separated token is the INIT value in hex:
//!
//! ```text
//! INIT values of SLICE_X10Y20
//! SLICE_X10Y20 A6LUT 0x0000000100000000
//! SLICE_X10Y20 B6LUT 0x0000000000000001
//! SLICE_X10Y20 C6LUT 0x0000000000000000
//! SLICE_X10Y20 D6LUT 0x0000000000000000
//! ```

use crate::FabricError;

// ── Artifacts ────────────────────────────────────────────────────────────────

/// File name the device interface writes the raw frame dump to.
pub const FRAME_DUMP_NAME: &str = "devcfg.out";

/// Suffix the partial-bitstream assembler appends to the dump path.
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Suffix the packager appends to the partial bitstream path.
pub const IMAGE_SUFFIX: &str = ".bin";

// ── Device configuration interface ───────────────────────────────────────────

/// Sub-command reading frames from the device.
pub const DEVCFG_READ: &str = "read";

/// Sub-command writing a binary image to the device.
pub const DEVCFG_WRITE: &str = "write";

// ── INIT editor ──────────────────────────────────────────────────────────────

/// Read mode flag: print the four INIT words of a slice.
pub const FLAG_READ: &str = "-r";

/// Skip CRC recomputation; the packager adds framing and CRC later.
pub const FLAG_NOCRC: &str = "--nocrc";

/// Write flag for A6LUT.
pub const FLAG_A6LUT: &str = "--a6lut";
/// Write flag for B6LUT.
pub const FLAG_B6LUT: &str = "--b6lut";
/// Write flag for C6LUT.
pub const FLAG_C6LUT: &str = "--c6lut";
/// Write flag for D6LUT.
pub const FLAG_D6LUT: &str = "--d6lut";

/// Header lines preceding the INIT values in a listing.
pub const LISTING_HEADER_LINES: usize = 1;

/// Whitespace-separated token holding the INIT value on a listing line.
pub const LISTING_VALUE_TOKEN: usize = 2;

/// Value lines in a complete listing, one per LUT.
pub const LISTING_VALUE_LINES: usize = 4;

/// Format an address argument the way the tools expect (`0x` + lowercase hex).
#[must_use]
pub fn hex_arg(value: u64) -> String {
    format!("{value:#x}")
}

/// Parse a hex token with optional `0x`/`0X` prefix.
///
/// Only hex digits may follow the prefix; `u64::from_str_radix` alone would
/// also take a leading `+`.
///
/// # Errors
///
/// Returns `FabricError::InvalidHex` for empty, signed or non-hex text and
/// for values wider than 64 bits.
pub fn parse_hex_u64(token: &str) -> Result<u64, FabricError> {
    let invalid = || FabricError::InvalidHex {
        token: token.to_string(),
    };
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    u64::from_str_radix(digits, 16).map_err(|_| invalid())
}
