//! Decoding of RGBE scanlines and the read entry points.

use std::io::{self, Read};

use log::{debug, trace};

use super::header::HdrHeader;
use super::{uses_rle, BYTES_PER_PIXEL, CHANNELS};
use crate::error::{DecodeError, HdrError, HdrResult, HeaderError, ParameterErrorKind};
use crate::io::Limits;

/// A Radiance HDR decoder
///
/// Reads the header on construction and the RGBE scanlines into a caller
/// provided buffer of `width * height * 4` bytes. Reads are byte sized, wrap
/// unbuffered readers in a `BufReader`.
#[derive(Debug)]
pub struct HdrDecoder<R> {
    r: R,
    width: u32,
    height: u32,
    header: HdrHeader,
    limits: Limits,
}

impl<R: Read> HdrDecoder<R> {
    /// Reads Radiance HDR image header from stream `reader`,
    /// if the header is valid, creates `HdrDecoder`.
    pub fn new(mut reader: R) -> HdrResult<HdrDecoder<R>> {
        let (header, width, height) = HdrHeader::read_from(&mut reader)?;
        debug!(
            "HDR header: {:?}, {width}x{height}",
            header.program_type()
        );

        Ok(HdrDecoder {
            r: reader,
            width,
            height,
            header,
            limits: Limits::default(),
        })
    }

    /// Sets resource limits, failing right away if the image already exceeds them.
    pub fn set_limits(&mut self, limits: Limits) -> HdrResult<()> {
        limits.check_buffer(self.width, self.height)?;
        self.limits = limits;
        Ok(())
    }

    /// Returns `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the parsed header.
    pub fn header(&self) -> &HdrHeader {
        &self.header
    }

    /// Size in bytes of the RGBE buffer `read_image` fills.
    pub fn total_bytes(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * BYTES_PER_PIXEL as u64
    }

    /// Decodes all scanlines into `buf`, which must be exactly
    /// [`total_bytes`](Self::total_bytes) long.
    ///
    /// On error the contents of `buf` are unspecified.
    pub fn read_image(mut self, buf: &mut [u8]) -> HdrResult<()> {
        let expected = self.total_bytes();
        if u64::try_from(buf.len()).ok() != Some(expected) {
            return Err(ParameterErrorKind::DimensionMismatch {
                expected,
                actual: buf.len(),
            }
            .into());
        }

        let stride = self.width as usize * BYTES_PER_PIXEL;
        for (y, scanline) in buf.chunks_exact_mut(stride).enumerate() {
            decode_scanline(&mut self.r, scanline).map_err(|err| {
                debug!("HDR scanline {y} of {} failed: {err}", self.height);
                err
            })?;
        }
        Ok(())
    }

    /// Asks `provider` for the destination buffer, then decodes into it.
    ///
    /// The provider is called with `(width, height, header)` after the limits
    /// have been checked. Returning `None`, an empty slice, or a slice that is
    /// not `width * height * 4` bytes long fails with
    /// [`HeaderError::BufferAllocationFailed`].
    pub fn read_with_provider<'buf, F>(self, provider: F) -> HdrResult<HdrHeader>
    where
        F: FnOnce(u32, u32, &HdrHeader) -> Option<&'buf mut [u8]>,
    {
        self.limits.check_buffer(self.width, self.height)?;
        let header = self.header.clone();
        // Fits, it was checked against the format bounds.
        let expected = self.total_bytes() as usize;

        let buf = match provider(self.width, self.height, &header) {
            Some(buf) if buf.len() == expected => buf,
            other => {
                let actual = other.map_or(0, |buf| buf.len());
                return Err(HeaderError::BufferAllocationFailed { expected, actual }.into());
            }
        };

        self.read_image(buf)?;
        Ok(header)
    }
}

/// Reads a whole HDR stream into a buffer obtained from `provider`.
///
/// See [`HdrDecoder::read_with_provider`]. Returns the parsed header.
pub fn read_rgbe<'buf, R, F>(reader: R, provider: F) -> HdrResult<HdrHeader>
where
    R: Read,
    F: FnOnce(u32, u32, &HdrHeader) -> Option<&'buf mut [u8]>,
{
    HdrDecoder::new(reader)?.read_with_provider(provider)
}

/// Decodes one scanline of `scanline.len() / 4` pixels.
///
/// The first bytes decide the storage scheme. Scanlines narrower than 8 or
/// wider than 32767 pixels are always read with [`decode_legacy`]. Otherwise
/// a leading `(2, 2, hi, lo)` with `hi < 128` announces four run-length
/// packed channels; anything else is an old-style scanline.
pub fn decode_scanline<R: Read>(r: &mut R, scanline: &mut [u8]) -> HdrResult<()> {
    let width = scanline.len() / CHANNELS;
    if !uses_rle(width) {
        return decode_legacy(r, scanline, 0);
    }

    let first = read_byte(r)?;
    if first != 2 {
        let mut quad = [first, 0, 0, 0];
        read_exact(r, &mut quad[1..])?;
        if run_length_marker(quad).is_some() {
            return Err(DecodeError::RunWithoutPixel.into());
        }
        trace!("HDR scanline: old format");
        scanline[..CHANNELS].copy_from_slice(&quad);
        return decode_legacy(r, scanline, 1);
    }

    let mut quad = [2, 0, 0, 0];
    read_exact(r, &mut quad[1..])?;
    if quad[1] != 2 || quad[2] & 0x80 != 0 {
        // A denormalized pixel, not the per channel marker.
        trace!("HDR scanline: old format starting with {quad:?}");
        scanline[..CHANNELS].copy_from_slice(&quad);
        return decode_legacy(r, scanline, 1);
    }

    let encoded_width = (usize::from(quad[2]) << 8) | usize::from(quad[3]);
    if encoded_width != width {
        debug!("HDR scanline claims width {encoded_width}, decoding {width} pixels");
    }
    trace!("HDR scanline: per channel run-length");
    for channel in 0..CHANNELS {
        decode_channel(r, scanline, channel)?;
    }
    Ok(())
}

/// Decodes old-style pixels into `scanline`, starting at pixel `start`.
///
/// Each quadruplet is either a pixel or a run length marker `(1, 1, 1, n)`
/// which repeats the previous pixel. Consecutive markers carry increasingly
/// significant bytes of the count: the k-th marker in a row repeats
/// `n << (8 * k)` times. A marker without a previous pixel in the same
/// scanline is an error.
pub fn decode_legacy<R: Read>(r: &mut R, scanline: &mut [u8], start: usize) -> HdrResult<()> {
    let width = scanline.len() / CHANNELS;
    let mut x = start;
    let mut rshift = 0u32;
    while x < width {
        let mut quad = [0u8; CHANNELS];
        read_exact(r, &mut quad)?;

        let Some(count) = run_length_marker(quad) else {
            scanline[x * CHANNELS..][..CHANNELS].copy_from_slice(&quad);
            x += 1;
            rshift = 0;
            continue;
        };

        if x == 0 {
            return Err(DecodeError::RunWithoutPixel.into());
        }
        let end = u64::from(count)
            .checked_shl(rshift)
            .and_then(|run| run.checked_add(x as u64))
            .unwrap_or(u64::MAX);
        if end > width as u64 {
            return Err(DecodeError::ScanlineOverrun {
                position: usize::try_from(end).unwrap_or(usize::MAX),
                width,
            }
            .into());
        }
        let end = end as usize;

        let mut previous = [0u8; CHANNELS];
        previous.copy_from_slice(&scanline[(x - 1) * CHANNELS..x * CHANNELS]);
        for pixel in scanline[x * CHANNELS..end * CHANNELS].chunks_exact_mut(CHANNELS) {
            pixel.copy_from_slice(&previous);
        }
        x = end;
        rshift += 8;
    }
    Ok(())
}

// Fills every CHANNELS-th byte of the scanline, starting at `channel`.
//
// Each packet starts with a code byte: above 128 a run of `code - 128`
// copies of the next byte follows, otherwise `code` literal bytes.
fn decode_channel<R: Read>(r: &mut R, scanline: &mut [u8], channel: usize) -> HdrResult<()> {
    let width = scanline.len() / CHANNELS;
    let mut literals = [0u8; 128];
    let mut x = 0;
    while x < width {
        let code = read_byte(r)?;
        let count = if code > 128 {
            usize::from(code - 128)
        } else {
            usize::from(code)
        };
        if x + count > width {
            return Err(DecodeError::ScanlineOverrun {
                position: x + count,
                width,
            }
            .into());
        }

        let pixels = scanline[x * CHANNELS..(x + count) * CHANNELS].chunks_exact_mut(CHANNELS);
        if code > 128 {
            let value = read_byte(r)?;
            for pixel in pixels {
                pixel[channel] = value;
            }
        } else {
            let literals = &mut literals[..count];
            read_exact(r, literals)?;
            for (pixel, &value) in pixels.zip(literals.iter()) {
                pixel[channel] = value;
            }
        }
        x += count;
    }
    Ok(())
}

// Returns run length if pixel is a run length marker
#[inline]
fn run_length_marker(quad: [u8; CHANNELS]) -> Option<u8> {
    match quad {
        [1, 1, 1, count] => Some(count),
        _ => None,
    }
}

#[inline(always)]
fn read_byte<R: Read>(r: &mut R) -> HdrResult<u8> {
    let mut buf = [0u8];
    read_exact(r, &mut buf)?;
    Ok(buf[0])
}

fn read_exact<R: Read>(r: &mut R, buf: &mut [u8]) -> HdrResult<()> {
    r.read_exact(buf).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => DecodeError::UnexpectedEof.into(),
        _ => HdrError::IoError { source: err },
    })
}
