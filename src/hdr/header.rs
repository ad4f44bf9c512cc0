//! The textual preamble of a Radiance HDR stream.
//!
//! ```text
//! #?RADIANCE
//! # comment lines, variables like FORMAT=32-bit_rle_rgbe
//!
//! -Y <height> +X <width>
//! ```
//!
//! Only the signature and the resolution line are interpreted. Everything in
//! between is skipped up to the first empty line.

use std::io::{self, Read, Write};

use super::MAX_DIMENSION;
use crate::error::{EncodeError, HdrResult, HeaderError, HeaderSection};

/// Radiance HDR file signature
pub const SIGNATURE: &[u8] = b"#?RADIANCE";

/// Signature written by some older RGBE tools.
pub const RGBE_SIGNATURE: &[u8] = b"#?RGBE";

/// Value of the `FORMAT=` line for RGBE pixel data.
pub const DEFAULT_FORMAT: &str = "32-bit_rle_rgbe";

// Upper bounds of the line based sections, newline included.
const SIGNATURE_SECTION_LEN: usize = 16;
const RESOLUTION_SECTION_LEN: usize = 200;

/// The program that wrote a stream, as named by its signature line.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum ProgramType {
    /// `#?RGBE`
    Rgbe,
    /// `#?RADIANCE`
    Radiance,
}

impl ProgramType {
    /// The signature line for this program type, without the newline.
    pub fn signature(self) -> &'static [u8] {
        match self {
            ProgramType::Rgbe => RGBE_SIGNATURE,
            ProgramType::Radiance => SIGNATURE,
        }
    }
}

/// Header information of a HDR stream.
///
/// When reading, only the program type is filled in; `comment` and `format`
/// stay empty because header lines are skipped, not parsed. When writing, the
/// signature is always `#?RADIANCE` and `comment` and `format` are written
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HdrHeader {
    program_type: ProgramType,
    /// Text of the single comment line, written after `# `.
    pub comment: String,
    /// Text of the `FORMAT=` line.
    pub format: String,
}

impl Default for HdrHeader {
    fn default() -> Self {
        HdrHeader::new("", DEFAULT_FORMAT)
    }
}

impl HdrHeader {
    /// Creates a header for writing.
    pub fn new(comment: impl Into<String>, format: impl Into<String>) -> Self {
        HdrHeader {
            program_type: ProgramType::Radiance,
            comment: comment.into(),
            format: format.into(),
        }
    }

    /// The program type found in the signature line.
    pub fn program_type(&self) -> ProgramType {
        self.program_type
    }

    /// Parses a whole header and returns it together with `(width, height)`.
    ///
    /// The reader is left positioned at the first byte of pixel data.
    pub fn read_from<R: Read>(r: &mut R) -> HdrResult<(HdrHeader, u32, u32)> {
        let program_type = read_signature(r)?;
        skip_comment(r)?;
        let (width, height) = read_resolution(r)?;
        let header = HdrHeader {
            program_type,
            comment: String::new(),
            format: String::new(),
        };
        Ok((header, width, height))
    }

    /// Writes signature, comment, format, an empty line and the resolution line.
    pub fn write_to<W: Write>(&self, w: &mut W, width: u32, height: u32) -> HdrResult<()> {
        let text = format!(
            "#?RADIANCE\n# {}\nFORMAT={}\n\n-Y {height} +X {width}\n",
            self.comment, self.format
        );
        w.write_all(text.as_bytes())
            .map_err(EncodeError::StreamWriteFailure)?;
        Ok(())
    }
}

/// Reads the signature line, at most 16 bytes including the newline.
pub fn read_signature<R: Read>(r: &mut R) -> HdrResult<ProgramType> {
    let line = read_bounded_line(r, SIGNATURE_SECTION_LEN, HeaderSection::ProgramType)?;
    if line == RGBE_SIGNATURE {
        Ok(ProgramType::Rgbe)
    } else if line == SIGNATURE {
        Ok(ProgramType::Radiance)
    } else {
        Err(HeaderError::InvalidSignature.into())
    }
}

/// Skips header lines up to and including the first empty line.
///
/// Must be called right after [`read_signature`]: the newline ending the
/// signature counts, so an empty line directly after it ends the block.
pub fn skip_comment<R: Read>(r: &mut R) -> HdrResult<()> {
    // Readers that start without a previous newline need one more header line
    // here. Every stream written by `write_to` has one, so both agree on it.
    let mut previous = b'\n';
    loop {
        match next_byte(r)? {
            None => return Err(HeaderError::UnexpectedEof(HeaderSection::Comment).into()),
            Some(b'\n') if previous == b'\n' => return Ok(()),
            Some(c) => previous = c,
        }
    }
}

/// Reads the resolution line and returns `(width, height)`.
///
/// Only the standard orientation `-Y <height> +X <width>`, top to bottom and
/// left to right, is supported.
pub fn read_resolution<R: Read>(r: &mut R) -> HdrResult<(u32, u32)> {
    let line = read_bounded_line(r, RESOLUTION_SECTION_LEN, HeaderSection::Resolution)?;
    let line = String::from_utf8_lossy(&line);
    let (width, height) = parse_dimensions_line(&line)?;

    let range = 1..=u64::from(MAX_DIMENSION);
    if !range.contains(&width) || !range.contains(&height) {
        return Err(HeaderError::ResolutionOutOfRange { width, height }.into());
    }
    // Both fit, they are at most MAX_DIMENSION.
    Ok((width as u32, height as u32))
}

// Parses dimension line "-Y height +X width"
// returns (width, height) or error
fn parse_dimensions_line(line: &str) -> Result<(u64, u64), HeaderError> {
    let invalid = || HeaderError::InvalidResolution(limit_string_len(line, 40));

    let mut dim_parts = line.split_whitespace();
    let parts = [
        dim_parts.next(),
        dim_parts.next(),
        dim_parts.next(),
        dim_parts.next(),
    ];
    if dim_parts.next().is_some() {
        return Err(invalid());
    }
    match parts {
        [Some("-Y"), Some(height), Some("+X"), Some(width)] => {
            let height = height.parse::<u64>().map_err(|_| invalid())?;
            let width = width.parse::<u64>().map_err(|_| invalid())?;
            Ok((width, height))
        }
        // Any other orientation, or not a resolution line at all.
        _ => Err(invalid()),
    }
}

// Reads up to `max` bytes looking for b"\n".
// Returns the bytes read NOT including the newline.
fn read_bounded_line<R: Read>(
    r: &mut R,
    max: usize,
    section: HeaderSection,
) -> HdrResult<Vec<u8>> {
    let mut line = Vec::with_capacity(16);
    for _ in 0..max {
        match next_byte(r)? {
            None => return Err(HeaderError::UnexpectedEof(section).into()),
            Some(b'\n') => return Ok(line),
            Some(c) => line.push(c),
        }
    }
    Err(HeaderError::SectionTooLong(section).into())
}

// None at end of stream.
fn next_byte<R: Read>(r: &mut R) -> io::Result<Option<u8>> {
    let mut byte = [0];
    loop {
        match r.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

// Returns string with no more than len+3 characters
fn limit_string_len(s: &str, len: usize) -> String {
    let s_char_len = s.chars().count();
    if s_char_len > len {
        s.chars().take(len).chain("...".chars()).collect()
    } else {
        s.into()
    }
}
