#![no_main]
use assetpack::block::{self, Compression};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // Use first byte as strategy selector.
    let compression = match data[0] % 11 {
        0 => Compression::Store,
        10 => Compression::Fast,
        level => Compression::Level(u32::from(level)),
    };
    let payload = &data[1..];

    let packed = block::compress(payload, compression).unwrap();
    let unpacked = block::decompress(&packed, payload.len()).unwrap();
    assert_eq!(unpacked, payload);
});
