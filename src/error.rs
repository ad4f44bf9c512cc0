//! Contains detailed error representation.
//!
//! See the main [`HdrError`] which contains a variant for each specialized error type. Header
//! problems, scanline decoding problems and encoding problems each get their own kind enum so a
//! caller can tell a bad file apart from a failed write without parsing messages.
//!
//! [`HdrError`]: enum.HdrError.html

use std::error::Error;
use std::{fmt, io};

use snafu::prelude::*;

/// The generic error type for reading and writing Radiance HDR streams.
///
/// This high level enum allows, by variant matching, a rough separation of concerns between
/// underlying IO, the caller, and the malformed parts of an input stream.
#[derive(Snafu, Debug)]
pub enum HdrError {
    /// The textual header could not be parsed, or no destination buffer could be obtained.
    #[snafu(context(false), display("Invalid HDR header: {source}"))]
    Header {
        /// What was wrong with the header.
        source: HeaderError,
    },

    /// The pixel payload did not decode into the expected number of pixels.
    #[snafu(context(false), display("Decompression failed: {source}"))]
    Decoding {
        /// What was wrong with the scanline.
        source: DecodeError,
    },

    /// A scanline could not be encoded or the encoded stream could not be written.
    #[snafu(context(false), display("Compression failed: {source}"))]
    Encoding {
        /// Why encoding stopped.
        source: EncodeError,
    },

    /// An error was encountered in input arguments.
    #[snafu(display("{kind}"))]
    Parameter {
        /// The malformed parameter.
        kind: ParameterErrorKind,
    },

    /// Completing the operation would have required more resources than allowed.
    ///
    /// Errors of this type are limits set by the user, *not* the bounds of the format itself.
    #[snafu(display("{kind}"))]
    Limits {
        /// The limit that was hit.
        kind: LimitErrorKind,
    },

    /// An error occurred while reading from the underlying stream.
    #[snafu(context(false), display("{source}"))]
    IoError {
        /// The error of the reader.
        source: io::Error,
    },
}

/// The part of the header that was being read when an error occurred.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum HeaderSection {
    /// The `#?RADIANCE` / `#?RGBE` signature line.
    ProgramType,
    /// The comment and variable lines up to the first empty line.
    Comment,
    /// The `-Y <height> +X <width>` line.
    Resolution,
}

/// Errors that can occur while parsing the header of a HDR stream.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HeaderError {
    /// The first line is neither `#?RGBE` nor `#?RADIANCE`.
    InvalidSignature,
    /// The section did not end with a newline within its size bound.
    SectionTooLong(HeaderSection),
    /// EOF before the section was complete.
    UnexpectedEof(HeaderSection),
    /// The resolution line is not of the form `-Y <height> +X <width>`.
    InvalidResolution(String),
    /// Width or height lies outside `1..=16384`.
    ResolutionOutOfRange {
        /// Parsed width.
        width: u64,
        /// Parsed height.
        height: u64,
    },
    /// The buffer provider returned no buffer, or one of the wrong size.
    BufferAllocationFailed {
        /// `width * height * 4`
        expected: usize,
        /// Length of the slice that was returned, zero if none was.
        actual: usize,
    },
}

/// Errors that can occur while decoding scanlines.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// The stream ended before the scanline was filled.
    UnexpectedEof,
    /// A run or literal block reaches past the end of the scanline.
    ScanlineOverrun {
        /// Pixel position the block would have ended at.
        position: usize,
        /// Pixels in the scanline.
        width: usize,
    },
    /// A run length marker appeared before any pixel of the scanline.
    RunWithoutPixel,
}

/// Errors that can occur while encoding scanlines.
#[derive(Debug)]
#[non_exhaustive]
pub enum EncodeError {
    /// The scanline has more pixels than the run-length packer accepts.
    ScanlineTooLong(usize),
    /// Writing the header or the pixel payload failed.
    StreamWriteFailure(io::Error),
    /// No worker recorded an encoded segment for this row.
    MissingRow(usize),
    /// The worker pool could not be created.
    WorkerPool(String),
}

/// Details how a parameter is malformed.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParameterErrorKind {
    /// The buffer length does not match `width * height * 4`.
    DimensionMismatch {
        /// Bytes required by the dimensions.
        expected: u64,
        /// Bytes provided.
        actual: usize,
    },
    /// Width or height is zero.
    ZeroDimension,
    /// A channel index of 4 or more was given for an RGBE pixel.
    ChannelOutOfRange(usize),
}

/// Indicates the limit that prevented an operation from completing.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
#[non_exhaustive]
#[allow(missing_copy_implementations)] // Might be non-Copy in the future.
pub enum LimitErrorKind {
    /// The image exceeds the configured width or height.
    DimensionError,
    /// The destination buffer would be larger than allowed.
    InsufficientMemory,
}

impl From<ParameterErrorKind> for HdrError {
    fn from(kind: ParameterErrorKind) -> HdrError {
        ParameterSnafu { kind }.build()
    }
}

impl From<LimitErrorKind> for HdrError {
    fn from(kind: LimitErrorKind) -> HdrError {
        LimitsSnafu { kind }.build()
    }
}

/// Result of a HDR decoding/encoding process
pub type HdrResult<T> = Result<T, HdrError>;

impl fmt::Display for HeaderSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HeaderSection::ProgramType => "program type",
            HeaderSection::Comment => "comment",
            HeaderSection::Resolution => "resolution",
        })
    }
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderError::InvalidSignature => f.write_str("Incorrect header signature"),
            HeaderError::SectionTooLong(section) => {
                write!(f, "The {section} section is too long")
            }
            HeaderError::UnexpectedEof(section) => {
                write!(f, "EOF reached while reading {section}")
            }
            HeaderError::InvalidResolution(line) => {
                write!(f, "Failed to parse resolution line {line:?}")
            }
            HeaderError::ResolutionOutOfRange { width, height } => {
                write!(f, "Invalid resolution {width}x{height}")
            }
            HeaderError::BufferAllocationFailed { expected, actual } => write!(
                f,
                "Failed to get image buffer: need {expected} bytes, got {actual}"
            ),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnexpectedEof => f.write_str("Unexpected EOF in scanline"),
            DecodeError::ScanlineOverrun { position, width } => write!(
                f,
                "Wrong length of decoded scanline: got {position}, expected {width}"
            ),
            DecodeError::RunWithoutPixel => {
                f.write_str("First pixel of a scanline shouldn't be run length marker")
            }
        }
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::ScanlineTooLong(len) => {
                write!(f, "Scanline of {len} pixels is too long to encode")
            }
            EncodeError::StreamWriteFailure(err) => write!(f, "Failed to write stream: {err}"),
            EncodeError::MissingRow(row) => write!(f, "Row {row} was not encoded"),
            EncodeError::WorkerPool(msg) => write!(f, "Failed to start encoder workers: {msg}"),
        }
    }
}

impl fmt::Display for ParameterErrorKind {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterErrorKind::DimensionMismatch { expected, actual } => write!(
                fmt,
                "The buffer has {actual} bytes but the dimensions require {expected}"
            ),
            ParameterErrorKind::ZeroDimension => fmt.write_str("Width and height must be non-zero"),
            ParameterErrorKind::ChannelOutOfRange(channel) => {
                write!(fmt, "Channel {channel} does not exist, RGBE has 4")
            }
        }
    }
}

impl fmt::Display for LimitErrorKind {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitErrorKind::DimensionError => fmt.write_str("Image is too large"),
            LimitErrorKind::InsufficientMemory => fmt.write_str("Memory limit exceeded"),
        }
    }
}

impl Error for HeaderError {}

impl Error for DecodeError {}

impl Error for EncodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EncodeError::StreamWriteFailure(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    #[allow(dead_code)]
    // This will fail to compile if the size of this type is large.
    const ASSERT_SMALLISH: usize = [0][(mem::size_of::<HdrError>() >= 200) as usize];

    #[test]
    fn test_send_sync_stability() {
        fn assert_send_sync<T: Send + Sync>() {}

        assert_send_sync::<HdrError>();
    }

    #[test]
    fn messages_name_the_section() {
        let err = HdrError::from(HeaderError::UnexpectedEof(HeaderSection::Comment));
        assert_eq!(
            err.to_string(),
            "Invalid HDR header: EOF reached while reading comment"
        );
    }

    #[test]
    fn kinds_convert_without_a_source() {
        let err = HdrError::from(ParameterErrorKind::ChannelOutOfRange(7));
        assert!(matches!(
            err,
            HdrError::Parameter {
                kind: ParameterErrorKind::ChannelOutOfRange(7)
            }
        ));
        assert_eq!(err.to_string(), "Channel 7 does not exist, RGBE has 4");
        assert!(err.source().is_none());

        let err = HdrError::from(LimitErrorKind::InsufficientMemory);
        assert_eq!(err.to_string(), "Memory limit exceeded");
        assert!(err.source().is_none());

        let err = HdrError::from(io::Error::new(io::ErrorKind::Other, "gone"));
        assert_eq!(err.to_string(), "gone");
        assert_eq!(err.source().unwrap().to_string(), "gone");
    }

    #[test]
    fn write_failure_exposes_io_source() {
        let io = io::Error::new(io::ErrorKind::WriteZero, "disk full");
        let err = HdrError::from(EncodeError::StreamWriteFailure(io));
        let source = err.source().and_then(|e| e.source()).unwrap();
        assert_eq!(source.to_string(), "disk full");
    }
}
