use assetpack::block::{DecodeError, decompress};
use assetpack::block::varint::VarIntError;

#[derive(Debug)]
struct Vector {
    name: &'static str,
    stream: &'static str,
    raw_size: usize,
    expected: Result<Vec<u8>, DecodeError>,
}

fn hex_to_bytes(s: &str) -> Vec<u8> {
    let s: String = s.split_whitespace().collect();
    assert!(
        s.len().is_multiple_of(2),
        "hex string must have even length"
    );
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

fn vectors() -> Vec<Vector> {
    vec![
        Vector {
            name: "literals_only",
            stream: "60 616263",
            raw_size: 3,
            expected: Ok(b"abc".to_vec()),
        },
        Vector {
            name: "empty",
            stream: "",
            raw_size: 0,
            expected: Ok(Vec::new()),
        },
        Vector {
            name: "overlapping_pair",
            stream: "44 6162 0200",
            raw_size: 10,
            expected: Ok(b"ababababab".to_vec()),
        },
        Vector {
            name: "run_of_one_byte_with_length_varint",
            stream: "2f 7a 64 0100",
            raw_size: 120,
            expected: Ok(vec![b'z'; 120]),
        },
        Vector {
            name: "literal_run_varint",
            stream: "e0 03 30313233343536373839",
            raw_size: 10,
            expected: Ok(b"0123456789".to_vec()),
        },
        Vector {
            name: "literal_run_varint_two_groups",
            stream: &LONG_RUN_STREAM,
            raw_size: 135,
            expected: Ok(vec![b'q'; 135]),
        },
        Vector {
            name: "non_overlapping_copy_then_tail",
            stream: "80 61626364 0400 40 7879",
            raw_size: 10,
            expected: Ok(b"abcdabcdxy".to_vec()),
        },
        Vector {
            name: "match_only_token",
            stream: "20 61 0100 03 0200",
            raw_size: 12,
            expected: Ok(b"aaaaaaaaaaaa".to_vec()),
        },
        Vector {
            name: "no_header_byte",
            stream: "",
            raw_size: 1,
            expected: Err(DecodeError::Truncated { offset: 0 }),
        },
        Vector {
            name: "trailing_byte",
            stream: "60 616263 ff",
            raw_size: 3,
            expected: Err(DecodeError::TrailingBytes { remaining: 1 }),
        },
        Vector {
            name: "literal_overrun",
            stream: "60 616263",
            raw_size: 2,
            expected: Err(DecodeError::LiteralOverrun { offset: 0, run: 3 }),
        },
        Vector {
            name: "literals_missing",
            stream: "60 6162",
            raw_size: 3,
            expected: Err(DecodeError::Truncated { offset: 3 }),
        },
        Vector {
            name: "match_overrun",
            stream: "21 61 0100",
            raw_size: 3,
            expected: Err(DecodeError::MatchOverrun {
                offset: 1,
                length: 5,
            }),
        },
        Vector {
            name: "distance_truncated",
            stream: "20 61 01",
            raw_size: 5,
            expected: Err(DecodeError::Truncated { offset: 2 }),
        },
        Vector {
            name: "distance_zero",
            stream: "20 61 0000",
            raw_size: 5,
            expected: Err(DecodeError::BadDistance {
                offset: 1,
                distance: 0,
            }),
        },
        Vector {
            name: "distance_high_bit",
            stream: "30 61 0000",
            raw_size: 5,
            expected: Err(DecodeError::BadDistance {
                offset: 1,
                distance: 1 << 16,
            }),
        },
        Vector {
            name: "run_varint_truncated",
            stream: "e0 80",
            raw_size: 20,
            expected: Err(DecodeError::VarInt {
                offset: 1,
                source: VarIntError::Underflow,
            }),
        },
        Vector {
            name: "length_varint_five_groups",
            stream: "2f 61 80808080 01 0100",
            raw_size: 64,
            expected: Err(DecodeError::VarInt {
                offset: 2,
                source: VarIntError::Overflow,
            }),
        },
    ]
}

// Run of 135 = 7 + 128: varint 128 is `80 01`.
static LONG_RUN_STREAM: std::sync::LazyLock<String> = std::sync::LazyLock::new(|| {
    let mut s = String::from("e0 8001 ");
    s.push_str(&"71".repeat(135));
    s
});

#[test]
fn decoder_regression_vectors() {
    for v in vectors() {
        let stream = hex_to_bytes(v.stream);
        let got = decompress(&stream, v.raw_size);
        assert_eq!(got, v.expected, "vector {}", v.name);
    }
}

#[test]
fn decoder_never_writes_past_output() {
    // Two literals and an 8-byte match: every output shorter than 10 overruns.
    let stream = hex_to_bytes("44 6162 0200");
    for raw_size in 3..10 {
        assert!(
            matches!(
                decompress(&stream, raw_size),
                Err(DecodeError::MatchOverrun { offset: 2, .. })
            ),
            "raw_size {raw_size}"
        );
    }
}
