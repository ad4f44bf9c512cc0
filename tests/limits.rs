//! Test enforcement of size and memory limits when decoding.
//!
//! The limits are checked before the buffer provider is called, so an image
//! that is too large never causes an allocation.

use std::io::Cursor;

use radiance_rgbe::error::{HdrError, LimitErrorKind};
use radiance_rgbe::{write_rgbe, HdrDecoder, HdrHeader, Limits};

const WIDTH: u32 = 256;
const HEIGHT: u32 = 64;

fn test_image() -> Vec<u8> {
    let pixels = vec![7; (WIDTH * HEIGHT * 4) as usize];
    let mut bytes = Vec::new();
    write_rgbe(&mut bytes, &pixels, WIDTH, HEIGHT, &HdrHeader::default()).unwrap();
    bytes
}

/// Returns `Limits` with width/height smaller than the test image
fn width_height_limits() -> Limits {
    let mut limits = Limits::no_limits();
    limits.max_image_width = Some(WIDTH / 2);
    limits.max_image_height = Some(HEIGHT / 2);
    limits
}

/// Returns `Limits` with allocation limit smaller than the test image
fn allocation_limits() -> Limits {
    let mut limits = Limits::no_limits();
    limits.max_alloc = Some(u64::from(WIDTH * HEIGHT * 4 - 1));
    limits
}

/// Returns `Limits` that allow decoding this image without issues
fn permissive_limits() -> Limits {
    let mut limits = Limits::no_limits();
    limits.max_image_width = Some(WIDTH);
    limits.max_image_height = Some(HEIGHT);
    limits.max_alloc = Some(u64::from(WIDTH * HEIGHT * 4));
    limits
}

fn decode_with(limits: Limits) -> Result<(), HdrError> {
    let image = test_image();
    let mut decoder = HdrDecoder::new(Cursor::new(image))?;
    decoder.set_limits(limits)?;
    let mut called = false;
    let mut buf = Vec::new();
    decoder.read_with_provider(|w, h, _| {
        called = true;
        buf.resize((w * h * 4) as usize, 0);
        Some(&mut buf[..])
    })?;
    assert!(called);
    assert!(buf.iter().all(|&b| b == 7));
    Ok(())
}

#[test]
fn dimension_limits() {
    assert!(matches!(
        decode_with(width_height_limits()),
        Err(HdrError::Limits { kind: LimitErrorKind::DimensionError })
    ));
}

#[test]
fn allocation_limit() {
    assert!(matches!(
        decode_with(allocation_limits()),
        Err(HdrError::Limits { kind: LimitErrorKind::InsufficientMemory })
    ));
}

#[test]
fn permissive() {
    decode_with(permissive_limits()).unwrap();
}
