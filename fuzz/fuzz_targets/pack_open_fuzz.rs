#![no_main]
use assetpack::pack::Pack;
use libfuzzer_sys::fuzz_target;
use std::io::Write;

fuzz_target!(|data: &[u8]| {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();

    // Opening and reading every item must only ever fail with an error.
    let Ok(mut pack) = Pack::open(file.path()) else {
        return;
    };
    for index in 0..pack.len() {
        if let Ok(item) = pack.get_index(index) {
            assert_eq!(item.len() as u64, u64::from(pack.record(index).unwrap().raw_size));
            pack.release(item);
        }
    }
    assert_eq!(pack.close(), 0);
});
