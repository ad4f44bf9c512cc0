//! Ensure truncated streams are rejected without panics.

use std::io::Cursor;

use radiance_rgbe::error::{DecodeError, HdrError, HeaderError};
use radiance_rgbe::{read_rgbe, write_rgbe, HdrHeader};

fn try_decode(bytes: &[u8]) -> Result<Vec<u8>, HdrError> {
    let mut pixels = Vec::new();
    read_rgbe(Cursor::new(bytes), |width, height, _| {
        pixels.resize((width * height * 4) as usize, 0);
        Some(&mut pixels[..])
    })?;
    Ok(pixels)
}

fn truncate_stream(bytes: &[u8]) {
    let header_len = bytes
        .windows(3)
        .position(|w| w == b"\n-Y")
        .and_then(|p| bytes[p + 1..].iter().position(|&b| b == b'\n').map(|e| p + 2 + e))
        .expect("stream has a resolution line");

    for len in 0..bytes.len() {
        match try_decode(&bytes[..len]) {
            Err(HdrError::Header {
                source: HeaderError::UnexpectedEof(_),
            }) if len < header_len => {}
            Err(HdrError::Decoding {
                source: DecodeError::UnexpectedEof,
            }) if len >= header_len => {}
            other => panic!("prefix of {len} bytes: {other:?}"),
        }
    }
    assert!(try_decode(bytes).is_ok());
}

#[test]
fn truncate_rle() {
    let (width, height) = (20u32, 4u32);
    let pixels: Vec<u8> = (0..width * height * 4).map(|i| (i / 12) as u8).collect();
    let mut bytes = Vec::new();
    write_rgbe(&mut bytes, &pixels, width, height, &HdrHeader::default()).unwrap();
    truncate_stream(&bytes);
}

#[test]
fn truncate_raw() {
    let (width, height) = (5u32, 3u32);
    let pixels: Vec<u8> = (0..width * height * 4).map(|i| i as u8).collect();
    let mut bytes = Vec::new();
    write_rgbe(&mut bytes, &pixels, width, height, &HdrHeader::default()).unwrap();
    truncate_stream(&bytes);
}

#[test]
fn truncate_old_format() {
    let mut bytes = b"#?RGBE\n\n-Y 2 +X 10\n".to_vec();
    bytes.extend_from_slice(&[5, 6, 7, 8, 1, 1, 1, 8, 9, 9, 9, 9]);
    bytes.extend_from_slice(&[4, 4, 4, 4, 1, 1, 1, 9]);
    truncate_stream(&bytes);
}
