#![no_main]
use assetpack::block;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // First two bytes pick the declared output size.
    let raw_size = usize::from(u16::from_le_bytes([data[0], data[1]]));
    let stream = &data[2..];

    // The decoder must never panic or write out of bounds; only return errors.
    let mut out = vec![0u8; raw_size];
    let _ = block::decompress_into(stream, &mut out);
});
