//!  Reading and writing of Radiance HDR Images
//!
//! Radiance HDR is an image format using run-length encoding, with floating
//! point pixels in a shared-exponent representation. Each pixel is encoded
//! by three 8-bit unsigned color channel values (R, G, B) and one 8-bit
//! unsigned exponent value E. This module moves those RGBE bytes between a
//! stream and a caller supplied buffer; it never converts them to floats.
//!
//! A stream is a textual header followed by `height` scanlines. Every
//! scanline is stored independently in one of three ways:
//!
//! * uncompressed, `width` RGBE quadruplets,
//! * the old run-length scheme, where a quadruplet `(1, 1, 1, n)` repeats
//!   the previous pixel `n` times,
//! * the per-channel scheme, introduced by the quadruplet
//!   `(2, 2, width >> 8, width & 0xff)` and followed by four run-length
//!   packed channels, R, G, B and E.
//!
//! The encoder always writes the per-channel scheme when the width allows it
//! and uncompressed scanlines otherwise.
//!
//! # Related Links
//!
//! * <http://radsite.lbl.gov/radiance/refer/filefmts.pdf> -- Radiance .hdr
//!   format specification on page 28, under "Picture File Format"
//! * <http://www.graphics.cornell.edu/~bjw/rgbe/rgbe.c> -- an implementation
//!   from 1995 of both run-length schemes

pub mod decoder;
pub mod encoder;
pub mod header;
pub mod parallel;

pub use self::decoder::{read_rgbe, HdrDecoder};
pub use self::encoder::{write_rgbe, HdrEncoder};
pub use self::header::{HdrHeader, ProgramType};

/// Interleaved channels per pixel: R, G, B, E.
///
/// A scanline of `width` pixels is `width * CHANNELS` bytes. Channel `c` of
/// pixel `x` lives at byte `x * CHANNELS + c`, so walking one channel means
/// stepping through the scanline with a stride of `CHANNELS`.
pub const CHANNELS: usize = 4;

/// Bytes per RGBE pixel.
pub const BYTES_PER_PIXEL: usize = CHANNELS;

/// Largest width or height accepted when reading.
pub const MAX_DIMENSION: u32 = 16384;

/// Narrowest scanline that uses per-channel run-length encoding.
pub const MIN_RLE_WIDTH: usize = 8;

/// Widest scanline that uses per-channel run-length encoding.
pub const MAX_RLE_WIDTH: usize = 0x7fff;

/// Whether scanlines of this width are stored per-channel run-length encoded.
///
/// Narrower and wider scanlines cannot carry the `(2, 2, hi, lo)` marker
/// reliably and are stored uncompressed or in the old scheme.
#[inline]
pub fn uses_rle(width: usize) -> bool {
    (MIN_RLE_WIDTH..=MAX_RLE_WIDTH).contains(&width)
}
