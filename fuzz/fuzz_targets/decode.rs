#![no_main]
#[macro_use] extern crate libfuzzer_sys;

use std::io::Cursor;

use radiance_rgbe::{HdrDecoder, Limits};

#[inline(always)]
fn hdr_decode(data: &[u8]) -> Result<Vec<u8>, ()> {
    let mut decoder = HdrDecoder::new(Cursor::new(data)).map_err(|_| ())?;
    let mut limits = Limits::no_limits();
    limits.max_alloc = Some(5_000_000);
    decoder.set_limits(limits).map_err(|_| ())?;

    let mut img_data = Vec::new();
    decoder
        .read_with_provider(|width, height, _| {
            img_data.resize((width * height * 4) as usize, 0);
            Some(&mut img_data[..])
        })
        .map_err(|_| ())?;
    Ok(img_data)
}

fuzz_target!(|data: &[u8]| {
    let _ = hdr_decode(data);
});
