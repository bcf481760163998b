use packwire::{
    decode, encode, DecodeLimits, DecodeOptions, Decoder, EncodeOptions, LengthKind,
    MsgPackError, TypeTag, Value,
};

fn limited(limits: DecodeLimits) -> DecodeOptions {
    DecodeOptions::default().with_limits(limits)
}

#[test]
fn guard_length_ceiling_matrix() {
    let three = encode(
        &Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
        &EncodeOptions::default(),
    )
    .unwrap();
    let options = limited(DecodeLimits {
        max_array_length: 1,
        ..DecodeLimits::default()
    });
    assert_eq!(
        decode(&three, &options),
        Err(MsgPackError::MaxLengthExceeded {
            kind: LengthKind::Array,
            length: 3,
            max: 1
        })
    );

    let cases: &[(&[u8], LengthKind)] = &[
        (&[0xa3, b'a', b'b', b'c'], LengthKind::Str),
        (&[0xc4, 0x03, 1, 2, 3], LengthKind::Bin),
        (&[0x83, 1, 1, 2, 2, 3, 3], LengthKind::Map),
        (&[0xc7, 0x03, 0x01, 1, 2, 3], LengthKind::Ext),
    ];
    let tight = limited(DecodeLimits {
        max_str_length: 2,
        max_bin_length: 2,
        max_array_length: 2,
        max_map_length: 2,
        max_ext_length: 2,
    });
    for (input, kind) in cases {
        match decode(input, &tight) {
            Err(MsgPackError::MaxLengthExceeded { kind: got, .. }) => assert_eq!(got, *kind),
            other => panic!("expected {kind} ceiling, got {other:?}"),
        }
    }

    // ceilings apply inside nested containers too
    let nested = [0x91, 0xa3, b'a', b'b', b'c'];
    assert!(matches!(
        decode(&nested, &tight),
        Err(MsgPackError::MaxLengthExceeded {
            kind: LengthKind::Str,
            ..
        })
    ));
}

#[test]
fn guard_truncation_matrix() {
    assert!(matches!(
        decode(&[0xa3, b'a', b'b'], &DecodeOptions::default()),
        Err(MsgPackError::InsufficientData { .. })
    ));

    let full = encode(
        &Value::map([
            ("list", Value::Array(vec![Value::Int(300), Value::F64(0.5)])),
            ("bin", Value::Bin(vec![9; 20])),
        ]),
        &EncodeOptions::default(),
    )
    .unwrap();
    for cut in 0..full.len() {
        assert!(
            matches!(
                decode(&full[..cut], &DecodeOptions::default()),
                Err(MsgPackError::InsufficientData { .. })
            ),
            "prefix of {cut} bytes"
        );
    }
}

#[test]
fn guard_unknown_tag() {
    assert_eq!(
        decode(&[0xc1], &DecodeOptions::default()),
        Err(MsgPackError::UnrecognizedType {
            tag: TypeTag::Byte(0xc1),
            offset: 0
        })
    );
}

#[test]
fn guard_trailing_bytes() {
    let mut decoder = Decoder::new();
    assert_eq!(
        decoder.decode_single(&[0x90, 0xc0, 0xc0]),
        Err(MsgPackError::TrailingBytes {
            offset: 1,
            remaining: 2
        })
    );
    assert_eq!(decoder.decode_single(&[0x90]), Ok(Value::Array(vec![])));
}

#[test]
fn guard_deep_nesting_decodes_without_recursion() {
    const DEPTH: usize = 100_000;
    let mut input = vec![0x91; DEPTH];
    input.push(0xc0);

    let value = decode(&input, &DecodeOptions::default()).unwrap();
    let mut current = &value;
    let mut depth = 0;
    while let Value::Array(items) = current {
        assert_eq!(items.len(), 1);
        current = &items[0];
        depth += 1;
    }
    assert_eq!(depth, DEPTH);
    assert_eq!(current, &Value::Nil);
}

#[test]
fn guard_deep_nesting_drops_without_recursion() {
    const DEPTH: usize = 1_000_000;
    let mut arrays = vec![0x91; DEPTH];
    arrays.push(0xc0);
    drop(decode(&arrays, &DecodeOptions::default()).unwrap());

    // {"": {"": ... nil}}
    let mut maps = [0x81, 0xa0].repeat(DEPTH);
    maps.push(0xc0);
    drop(decode(&maps, &DecodeOptions::default()).unwrap());

    // a truncated document drops its partial frames
    assert!(matches!(
        decode(&arrays[..DEPTH], &DecodeOptions::default()),
        Err(MsgPackError::InsufficientData { .. })
    ));
}

#[test]
fn guard_encoder_depth_limit() {
    let mut nested = Value::Int(1);
    for _ in 0..101 {
        nested = Value::Array(vec![nested]);
    }
    assert_eq!(
        encode(&nested, &EncodeOptions::default()),
        Err(MsgPackError::DepthExceeded(100))
    );

    let relaxed = EncodeOptions::default().with_max_depth(200);
    let bytes = encode(&nested, &relaxed).unwrap();
    assert_eq!(bytes.len(), 102);
}

#[test]
fn guard_invalid_utf8_and_timestamp() {
    assert_eq!(
        decode(&[0xa2, 0xff, 0xfe], &DecodeOptions::default()),
        Err(MsgPackError::InvalidUtf8)
    );
    // timestamp payload of 3 bytes
    assert_eq!(
        decode(&[0xc7, 0x03, 0xff, 0, 0, 0], &DecodeOptions::default()),
        Err(MsgPackError::InvalidTimestamp)
    );
    // 96-bit layout carrying nanoseconds >= 1e9
    let mut bad_nanos = vec![0xc7, 0x0c, 0xff];
    bad_nanos.extend_from_slice(&1_000_000_000u32.to_be_bytes());
    bad_nanos.extend_from_slice(&0i64.to_be_bytes());
    assert_eq!(
        decode(&bad_nanos, &DecodeOptions::default()),
        Err(MsgPackError::InvalidTimestamp)
    );
}
