//! Run-length encoding of RGBE scanlines.

use std::io::Write;
use std::ops::Range;

use super::header::HdrHeader;
use super::{parallel, uses_rle, BYTES_PER_PIXEL, CHANNELS};
use crate::error::{EncodeError, HdrResult, ParameterErrorKind};

/// Widest scanline [`rle_channel`] packs, `600 * 127 / 2` pixels.
///
/// Other Radiance writers size a fixed packing buffer for this; scanlines
/// stored per channel never get close since their width is at most 32767.
pub const MAX_PACKED_WIDTH: usize = 600 * 127 / 2;

// Repeats shorter than this are written as literals.
const MIN_RUN_LENGTH: usize = 3;
const MAX_LITERAL_PACKET: usize = 128;
const MAX_RUN_PACKET: usize = 127;

/// Radiance HDR encoder.
///
/// Scanlines are run-length encoded per channel on several workers; the
/// output does not depend on how many.
pub struct HdrEncoder<W: Write> {
    w: W,
    threads: Option<usize>,
}

impl<W: Write> HdrEncoder<W> {
    /// Creates encoder
    pub fn new(w: W) -> HdrEncoder<W> {
        HdrEncoder { w, threads: None }
    }

    /// Encodes on `threads` workers instead of one per available core.
    ///
    /// Zero is treated as one.
    pub fn with_threads(mut self, threads: usize) -> HdrEncoder<W> {
        self.threads = Some(threads.max(1));
        self
    }

    /// Writes the header and the RGBE scanlines in `buf`, which holds
    /// `width * height` pixels of 4 bytes each.
    ///
    /// Scanlines narrower than 8 or wider than 32767 pixels are written
    /// uncompressed. If an error is returned, whatever was already written
    /// is a truncated stream.
    pub fn encode(
        mut self,
        buf: &[u8],
        width: u32,
        height: u32,
        header: &HdrHeader,
    ) -> HdrResult<()> {
        if width == 0 || height == 0 {
            return Err(ParameterErrorKind::ZeroDimension.into());
        }
        let expected = u64::from(width) * u64::from(height) * BYTES_PER_PIXEL as u64;
        if u64::try_from(buf.len()).ok() != Some(expected) {
            return Err(ParameterErrorKind::DimensionMismatch {
                expected,
                actual: buf.len(),
            }
            .into());
        }

        header.write_to(&mut self.w, width, height)?;

        if uses_rle(width as usize) {
            let rows = parallel::encode_rows(buf, width as usize, self.threads)?;
            rows.write_to(&mut self.w)?;
        } else {
            self.w
                .write_all(buf)
                .map_err(EncodeError::StreamWriteFailure)?;
        }
        self.w.flush().map_err(EncodeError::StreamWriteFailure)?;
        Ok(())
    }
}

/// Writes a whole HDR stream using one worker per available core.
pub fn write_rgbe<W: Write>(
    w: W,
    buf: &[u8],
    width: u32,
    height: u32,
    header: &HdrHeader,
) -> HdrResult<()> {
    HdrEncoder::new(w).encode(buf, width, height, header)
}

/// Appends one per channel run-length encoded scanline to `out`.
///
/// The scanline starts with `(2, 2, width >> 8, width & 0xff)` followed by
/// the packed R, G, B and E channels.
pub fn crunch(scanline: &[u8], out: &mut Vec<u8>) -> HdrResult<()> {
    let width = scanline.len() / CHANNELS;
    if width > MAX_PACKED_WIDTH {
        return Err(EncodeError::ScanlineTooLong(width).into());
    }
    out.extend_from_slice(&[2, 2, (width >> 8) as u8, width as u8]);
    for channel in 0..CHANNELS {
        rle_channel(scanline, channel, out)?;
    }
    Ok(())
}

/// Appends the packets of one channel of `scanline` to `out`.
///
/// Runs of three or more equal values become run packets `(128 + n, value)`
/// with `n <= 127`; everything in between becomes literal packets
/// `(n, values...)` with `n <= 128`. Shorter repeats stay inside literals.
/// `channel` must be below 4.
pub fn rle_channel(scanline: &[u8], channel: usize, out: &mut Vec<u8>) -> HdrResult<()> {
    if channel >= CHANNELS {
        return Err(ParameterErrorKind::ChannelOutOfRange(channel).into());
    }
    let len = scanline.len() / CHANNELS;
    if len > MAX_PACKED_WIDTH {
        return Err(EncodeError::ScanlineTooLong(len).into());
    }
    if len == 0 {
        return Ok(());
    }
    let value = |x: usize| scanline[x * CHANNELS + channel];

    // [literal_start, run_start) are pending literals, [run_start, x) repeat `last`.
    let mut last = value(0);
    let mut run_start = 0;
    let mut literal_start = 0;
    for x in 1..len {
        let current = value(x);
        if current == last {
            continue;
        }
        if x - run_start < MIN_RUN_LENGTH {
            run_start = x;
            last = current;
            continue;
        }

        push_literals(scanline, channel, literal_start..run_start, out);
        push_run(last, x - run_start, out);
        last = current;
        run_start = x;
        literal_start = x;
    }

    if len - run_start < MIN_RUN_LENGTH {
        run_start = len;
    }
    push_literals(scanline, channel, literal_start..run_start, out);
    push_run(last, len - run_start, out);
    Ok(())
}

fn push_literals(scanline: &[u8], channel: usize, pixels: Range<usize>, out: &mut Vec<u8>) {
    let mut x = pixels.start;
    while x < pixels.end {
        let count = (pixels.end - x).min(MAX_LITERAL_PACKET);
        out.push(count as u8);
        out.extend(
            scanline[x * CHANNELS..(x + count) * CHANNELS]
                .chunks_exact(CHANNELS)
                .map(|pixel| pixel[channel]),
        );
        x += count;
    }
}

fn push_run(value: u8, mut len: usize, out: &mut Vec<u8>) {
    while len > 0 {
        let count = len.min(MAX_RUN_PACKET);
        out.extend_from_slice(&[128 + count as u8, value]);
        len -= count;
    }
}
