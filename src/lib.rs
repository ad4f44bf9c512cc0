//! # Overview
//!
//! This crate reads and writes Radiance HDR images, the `.hdr` / `.pic`
//! container for RGBE pixels. It moves the raw RGBE bytes between a stream
//! and a buffer of `width * height * 4` bytes, without any conversion to
//! floating point, tone mapping or color management.
//!
//! Reading understands both run-length schemes found in the wild. Writing
//! uses the per channel scheme and spreads the scanlines over several
//! threads; the bytes written do not depend on the number of threads.
//!
//! ```
//! use std::io::Cursor;
//! use radiance_rgbe::{read_rgbe, write_rgbe, HdrHeader};
//!
//! let (width, height) = (16, 2);
//! let pixels: Vec<u8> = (0..width * height * 4).map(|i| (i / 8) as u8).collect();
//!
//! let mut file = Vec::new();
//! write_rgbe(&mut file, &pixels, width, height, &HdrHeader::default())?;
//!
//! let mut decoded = Vec::new();
//! read_rgbe(Cursor::new(file), |w, h, _header| {
//!     decoded.resize((w * h * 4) as usize, 0);
//!     Some(&mut decoded[..])
//! })?;
//! assert_eq!(decoded, pixels);
//! # Ok::<(), radiance_rgbe::error::HdrError>(())
//! ```
//!
//! Only the standard orientation, top to bottom and left to right, is
//! supported.
#![warn(missing_docs)]
#![warn(unused_qualifications)]
#![deny(unreachable_pub)]

pub mod error;
pub mod hdr;
pub mod io;

pub use crate::error::{HdrError, HdrResult};
pub use crate::hdr::{read_rgbe, write_rgbe, HdrDecoder, HdrEncoder, HdrHeader, ProgramType};
pub use crate::io::Limits;
