//! Encode RGBE buffers, decode them again and compare.

use std::io::Cursor;

use quickcheck::quickcheck;
use radiance_rgbe::error::{HdrError, HeaderError};
use radiance_rgbe::{read_rgbe, HdrEncoder, HdrHeader};

fn encode(pixels: &[u8], width: u32, height: u32, threads: Option<usize>) -> Vec<u8> {
    let mut bytes = Vec::new();
    let encoder = HdrEncoder::new(&mut bytes);
    let encoder = match threads {
        Some(threads) => encoder.with_threads(threads),
        None => encoder,
    };
    encoder
        .encode(pixels, width, height, &HdrHeader::new("roundtrip", "32-bit_rle_rgbe"))
        .expect("could not encode image");
    bytes
}

fn decode(bytes: &[u8]) -> Result<(u32, u32, Vec<u8>), HdrError> {
    let mut dimensions = (0, 0);
    let mut pixels = Vec::new();
    read_rgbe(Cursor::new(bytes), |width, height, _| {
        dimensions = (width, height);
        pixels.resize((width * height * 4) as usize, 0);
        Some(&mut pixels[..])
    })?;
    Ok((dimensions.0, dimensions.1, pixels))
}

// Smooth gradients with flat areas, roughly what rendered images look like.
fn gradient(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let flat = x < width / 3;
            pixels.extend_from_slice(&[
                if flat { 10 } else { (x * 255 / width) as u8 },
                (y * 255 / height) as u8,
                ((x + y) % 7) as u8,
                128 + (y % 3) as u8,
            ]);
        }
    }
    pixels
}

fn round_trip(width: u32, height: u32) {
    let pixels = gradient(width, height);
    let bytes = encode(&pixels, width, height, None);
    let (w, h, decoded) = decode(&bytes).expect("roundtrip re-decoding failed");
    assert_eq!((w, h), (width, height));
    assert_eq!(decoded, pixels, "{width}x{height}");
}

#[test]
fn roundtrip_rle_widths() {
    for (width, height) in [(8, 1), (9, 3), (64, 64), (300, 5), (1000, 2), (16384, 1)] {
        round_trip(width, height);
    }
}

#[test]
fn roundtrip_raw_widths() {
    for (width, height) in [(1, 1), (3, 5), (7, 2)] {
        round_trip(width, height);
    }
}

#[test]
fn wide_images_encode_raw_but_do_not_decode() {
    let (width, height) = (40000, 1);
    let pixels = vec![3; width * height * 4];
    let bytes = encode(&pixels, width as u32, height as u32, Some(2));
    assert_eq!(&bytes[bytes.len() - pixels.len()..], &pixels[..]);

    match decode(&bytes) {
        Err(HdrError::Header {
            source: HeaderError::ResolutionOutOfRange {
                width: 40000,
                height: 1,
            },
        }) => {}
        other => panic!("expected out of range resolution, got {other:?}"),
    }
}

#[test]
fn worker_count_does_not_change_stream() {
    let (width, height) = (123, 77);
    let pixels = gradient(width, height);
    let reference = encode(&pixels, width, height, Some(1));
    for threads in [2, 3, 8, 32] {
        assert_eq!(encode(&pixels, width, height, Some(threads)), reference);
    }
    assert_eq!(encode(&pixels, width, height, None), reference);
}

#[test]
fn reencoding_a_decoded_stream_is_stable() {
    let (width, height) = (50, 20);
    let bytes = encode(&gradient(width, height), width, height, None);
    let (_, _, decoded) = decode(&bytes).unwrap();
    assert_eq!(encode(&decoded, width, height, Some(3)), bytes);
}

quickcheck! {
    fn arbitrary_content_round_trips(content: Vec<u8>, width: u16, height: u8, runs: bool) -> bool {
        let width = u32::from(width % 200) + 8;
        let height = u32::from(height % 6) + 1;
        let len = (width * height * 4) as usize;
        let mut pixels: Vec<u8> = content.into_iter().cycle().take(len).collect();
        if runs {
            pixels.iter_mut().for_each(|v| *v %= 3);
        }
        pixels.resize(len, 0);

        let bytes = encode(&pixels, width, height, Some(3));
        decode(&bytes).map(|(_, _, decoded)| decoded == pixels).unwrap_or(false)
    }
}
