#![no_main]
#[macro_use] extern crate libfuzzer_sys;

use std::io::Cursor;

use radiance_rgbe::{read_rgbe, HdrEncoder, HdrHeader};

fuzz_target!(|data: &[u8]| {
    let Some((&shape, pixels)) = data.split_first() else {
        return;
    };
    // Narrower scanlines are stored raw and may contain run length markers.
    let width = u32::from(shape & 0x3f) + 8;
    let threads = usize::from(shape >> 6) + 1;
    let height = (pixels.len() / (width as usize * 4)) as u32;
    if height == 0 || height > 16384 {
        return;
    }
    let pixels = &pixels[..(width * height * 4) as usize];

    let mut encoded = Vec::new();
    HdrEncoder::new(&mut encoded)
        .with_threads(threads)
        .encode(pixels, width, height, &HdrHeader::default())
        .expect("encoding a valid buffer failed");

    let mut decoded = vec![0; pixels.len()];
    read_rgbe(Cursor::new(&encoded), |_, _, _| Some(&mut decoded[..]))
        .expect("decoding an encoded buffer failed");
    assert_eq!(decoded, pixels);
});
