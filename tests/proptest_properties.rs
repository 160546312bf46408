use assetpack::block::{self, Compression, DecodeError};
use assetpack::pack::{BuildOptions, Pack, PackBuilder, compare_paths};
use proptest::prelude::*;

fn strategy() -> impl Strategy<Value = Compression> {
    prop_oneof![
        Just(Compression::Store),
        Just(Compression::Fast),
        (1u32..=9u32).prop_map(Compression::Level),
    ]
}

/// Random bytes with long repeats mixed in, so the matcher has work to do.
fn compressible() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(
        (proptest::collection::vec(any::<u8>(), 1..16), 1usize..40),
        0..64,
    )
    .prop_map(|chunks| {
        chunks
            .into_iter()
            .flat_map(|(chunk, times)| chunk.repeat(times))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_block_roundtrip(
        data in proptest::collection::vec(any::<u8>(), 0..8192),
        compression in strategy()
    ) {
        let packed = block::compress(&data, compression).unwrap();
        let unpacked = block::decompress(&packed, data.len()).unwrap();
        prop_assert_eq!(unpacked, data);
    }

    #[test]
    fn prop_block_roundtrip_repetitive(data in compressible(), compression in strategy()) {
        let packed = block::compress(&data, compression).unwrap();
        let unpacked = block::decompress(&packed, data.len()).unwrap();
        prop_assert_eq!(unpacked, data);
    }

    #[test]
    fn prop_decoder_never_panics(
        stream in proptest::collection::vec(any::<u8>(), 0..512),
        raw_size in 0usize..2048
    ) {
        let mut out = vec![0u8; raw_size];
        let _: Result<(), DecodeError> = block::decompress_into(&stream, &mut out);
    }

    #[test]
    fn prop_directory_order_matches_lookup(
        names in proptest::collection::btree_set("[a-z/._]{1,24}", 1..40)
    ) {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("p.pak");
        let mut builder = PackBuilder::new(BuildOptions::default());
        for name in &names {
            builder.add_bytes(name.clone(), name.as_bytes().to_vec()).unwrap();
        }
        builder.write(&archive).unwrap();

        let pack = Pack::open(&archive).unwrap();
        let paths: Vec<&str> = pack.records().map(|r| r.path.as_str()).collect();
        prop_assert_eq!(paths.len(), names.len());
        for pair in paths.windows(2) {
            prop_assert_eq!(compare_paths(pair[0], pair[1]), std::cmp::Ordering::Less);
        }
        for (index, path) in paths.iter().enumerate() {
            prop_assert_eq!(pack.find(path), Some(index));
        }
    }

    #[test]
    fn prop_archive_never_expands_payloads(
        items in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 1..2048), 1..8),
        compression in strategy()
    ) {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("p.pak");
        let mut builder = PackBuilder::new(BuildOptions { compression, build_number: 1 });
        for (i, data) in items.iter().enumerate() {
            builder.add_bytes(format!("item{i}"), data.clone()).unwrap();
        }
        let stats = builder.write(&archive).unwrap();
        prop_assert!(stats.stored_bytes <= stats.raw_bytes);

        let mut pack = Pack::open(&archive).unwrap();
        for record in pack.records() {
            prop_assert!(record.stored_size() <= u64::from(record.raw_size));
            if record.is_compressed() {
                prop_assert!(record.compressed_size < record.raw_size);
            }
        }
        for (i, data) in items.iter().enumerate() {
            let item = pack.get(&format!("item{i}")).unwrap();
            prop_assert_eq!(item.as_bytes(), data.as_slice());
            pack.release(item);
        }
        prop_assert_eq!(pack.close(), 0);
    }

    #[test]
    fn prop_reference_accounting(ops in proptest::collection::vec(any::<bool>(), 0..40)) {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("p.pak");
        let mut builder = PackBuilder::new(BuildOptions::default());
        builder.add_bytes("only", vec![9u8; 300]).unwrap();
        builder.write(&archive).unwrap();

        let mut pack = Pack::open(&archive).unwrap();
        let mut held = Vec::new();
        for get in ops {
            if get {
                held.push(pack.get("only").unwrap());
            } else if let Some(item) = held.pop() {
                pack.release(item);
            }
            prop_assert_eq!(pack.outstanding(), held.len());
        }
        let expected = held.len();
        prop_assert_eq!(pack.close(), expected);
    }
}
