use malachite::Integer;
use packwire::{
    decode, encode, DecodeOptions, Decoder, EncodeOptions, Encoder, Extension, MsgPackError,
    Timestamp, Value,
};
use proptest::prelude::*;

fn enc(value: &Value) -> Vec<u8> {
    encode(value, &EncodeOptions::default()).unwrap()
}

fn roundtrip(value: &Value) -> Value {
    decode(&enc(value), &DecodeOptions::default()).unwrap()
}

#[test]
fn msgpack_literal_matrix() {
    assert_eq!(enc(&Value::Nil), vec![0xc0]);
    assert_eq!(enc(&Value::Int(0)), vec![0x00]);
    assert_eq!(enc(&Value::Int(-1)), vec![0xff]);
    assert_eq!(enc(&Value::Array(vec![])), vec![0x90]);
    assert_eq!(enc(&Value::Map(vec![])), vec![0x80]);
    assert_eq!(enc(&Value::Int(128)), vec![0xcc, 0x80]);
    assert_eq!(enc(&Value::Bool(false)), vec![0xc2]);
    assert_eq!(enc(&Value::Str("foo".into())), vec![0xa3, b'f', b'o', b'o']);

    let arr_15 = Value::Array((1..=15).map(Value::Int).collect());
    let encoded_15 = enc(&arr_15);
    assert_eq!(encoded_15[0], 0x9f);
    assert_eq!(encoded_15.len(), 16);

    let arr_16 = Value::Array((1..=16).map(Value::Int).collect());
    let encoded_16 = enc(&arr_16);
    assert_eq!(&encoded_16[..3], &[0xdc, 0x00, 0x10]);
    assert_eq!(encoded_16.len(), 19);

    let map_16 = Value::map((0..16).map(|i| (i.to_string(), Value::Int(i))));
    assert_eq!(&enc(&map_16)[..3], &[0xde, 0x00, 0x10]);

    let arr_65536 = Value::Array(vec![Value::Nil; 65536]);
    assert_eq!(&enc(&arr_65536)[..5], &[0xdd, 0x00, 0x01, 0x00, 0x00]);
}

#[test]
fn msgpack_integer_boundary_matrix() {
    let cases: &[(i64, &[u8])] = &[
        (-33, &[0xd0, 0xdf]),
        (-32, &[0xe0]),
        (-1, &[0xff]),
        (0, &[0x00]),
        (127, &[0x7f]),
        (128, &[0xcc, 0x80]),
        (255, &[0xcc, 0xff]),
        (256, &[0xcd, 0x01, 0x00]),
        (65535, &[0xcd, 0xff, 0xff]),
        (65536, &[0xce, 0x00, 0x01, 0x00, 0x00]),
        (4_294_967_295, &[0xce, 0xff, 0xff, 0xff, 0xff]),
        (4_294_967_296, &[0xcf, 0, 0, 0, 1, 0, 0, 0, 0]),
        (-32768, &[0xd1, 0x80, 0x00]),
        (-32769, &[0xd2, 0xff, 0xff, 0x7f, 0xff]),
    ];
    for (int, wire) in cases {
        let value = Value::Int(*int);
        assert_eq!(enc(&value), *wire, "encoding {int}");
        assert_eq!(roundtrip(&value), value, "round trip {int}");
    }

    assert_eq!(roundtrip(&Value::Int(i64::MIN)), Value::Int(i64::MIN));
    assert_eq!(roundtrip(&Value::Int(i64::MAX)), Value::Int(i64::MAX));
    assert_eq!(roundtrip(&Value::UInt(u64::MAX)), Value::UInt(u64::MAX));
    // UInt within the signed range comes back as Int
    assert_eq!(roundtrip(&Value::UInt(7)), Value::Int(7));
}

#[test]
fn msgpack_big_int_matrix() {
    let above_i64 = Integer::from(i64::MAX) + Integer::from(1);
    let bytes = enc(&Value::BigInt(above_i64.clone()));
    assert_eq!(bytes, vec![0xcf, 0x80, 0, 0, 0, 0, 0, 0, 0]);

    assert_eq!(
        decode(&bytes, &DecodeOptions::default()),
        Ok(Value::UInt(1 << 63))
    );
    let fallback = DecodeOptions::default().with_big_int_fallback(true);
    assert_eq!(decode(&bytes, &fallback), Ok(Value::BigInt(above_i64)));

    // native-range BigInt takes the plain integer path
    assert_eq!(enc(&Value::BigInt(Integer::from(-33))), vec![0xd0, 0xdf]);

    let below_i64 = Integer::from(i64::MIN) - Integer::from(1);
    assert_eq!(
        encode(&Value::BigInt(below_i64), &EncodeOptions::default()),
        Err(MsgPackError::IntegerOverflow)
    );
}

#[test]
fn msgpack_float_and_binary_matrix() {
    for f in [0.0, -0.0, 1.5, -1e300, f64::INFINITY, f64::MIN_POSITIVE] {
        assert_eq!(roundtrip(&Value::F64(f)), Value::F64(f));
    }
    assert_eq!(roundtrip(&Value::F32(0.25)), Value::F32(0.25));
    let Value::F64(nan) = roundtrip(&Value::F64(f64::NAN)) else {
        panic!("expected float64");
    };
    assert!(nan.is_nan());

    for len in [0usize, 1, 255, 256, 65535, 65536] {
        let bin = Value::Bin((0..len).map(|i| i as u8).collect());
        assert_eq!(roundtrip(&bin), bin, "bin of {len}");
    }
    for len in [31usize, 32, 255, 256, 65536] {
        let s = Value::Str("x".repeat(len));
        assert_eq!(roundtrip(&s), s, "str of {len}");
    }
}

#[test]
fn msgpack_timestamp_matrix() {
    let keep = DecodeOptions::default();
    for (seconds, nanoseconds, len) in [
        (0i64, 0u32, 6usize),
        (u32::MAX as i64, 0, 6),
        (1_700_000_000, 5, 10),
        ((1 << 34) - 1, 999_999_999, 10),
        (-1, 0, 15),
        (1 << 34, 1, 15),
    ] {
        let value = Value::Timestamp(Timestamp::new(seconds, nanoseconds).unwrap());
        let bytes = enc(&value);
        assert_eq!(bytes.len(), len, "timestamp {seconds}.{nanoseconds}");
        assert_eq!(decode(&bytes, &keep), Ok(value));
    }
}

#[test]
fn msgpack_extension_passthrough() {
    let ext = Value::Ext(Extension::new(42, vec![1, 2, 3]));
    let bytes = enc(&ext);
    assert_eq!(bytes, vec![0xc7, 0x03, 42, 1, 2, 3]);
    let keep = DecodeOptions::default().with_keep_unknown_extensions(true);
    assert_eq!(decode(&bytes, &keep), Ok(ext));
}

#[test]
fn msgpack_encoder_and_decoder_are_reusable() {
    let mut encoder = Encoder::new();
    let mut decoder = Decoder::new();
    let values = [
        Value::map([("a", Value::Int(1))]),
        Value::Array(vec![Value::Str("b".into()), Value::Nil]),
        Value::F64(2.5),
    ];
    for value in &values {
        let bytes = encoder.encode(value).unwrap();
        assert_eq!(&decoder.decode(&bytes).unwrap(), value);
    }
}

#[test]
fn msgpack_json_interop() {
    let json = serde_json::json!({"name": "packwire", "sizes": [1, 128, -40000], "ok": true});
    let value = Value::from(json.clone());
    let bytes = enc(&value);
    let back = decode(&bytes, &DecodeOptions::default()).unwrap();
    assert_eq!(serde_json::Value::try_from(back).unwrap(), json);
}

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Nil),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        ((1u64 << 63)..=u64::MAX).prop_map(Value::UInt),
        any::<f64>()
            .prop_filter("NaN never compares equal", |f| !f.is_nan())
            .prop_map(Value::F64),
        ".{0,40}".prop_map(Value::Str),
        prop::collection::vec(any::<u8>(), 0..64).prop_map(Value::Bin),
    ];
    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{0,8}", inner), 0..8)
                .prop_map(|entries| Value::map(entries)),
        ]
    })
}

proptest! {
    #[test]
    fn msgpack_roundtrip_preserves_values(value in arb_value()) {
        prop_assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn msgpack_decoder_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = Decoder::new().decode(&bytes);
    }
}
