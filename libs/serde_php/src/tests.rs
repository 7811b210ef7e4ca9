// scenario tests that run whole values through the public entry points.
// helpers have their own inline tests.
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer as _};

use crate::de::Deserializer;
use crate::naming::{Identity, from_fn};
use crate::{
    Codec, Error, FormatError, Key, Position, Value, from_reader, from_slice, from_str, to_string,
    to_vec,
};

const DISCOUNT_WIRE: &str = concat!(
    r#"a:7:{s:11:"bulk_length";s:1:"8";s:11:"minimum_qty";s:1:"1";"#,
    r#"s:20:"minimum_qty_restrict";i:1;s:17:"max_uses_per_user";s:1:"1";"#,
    r#"s:8:"apply_to";s:8:"subtotal";s:8:"products";"#,
    r#"a:4:{i:419;s:3:"419";i:420;s:3:"420";i:421;s:3:"421";i:1255;s:4:"1255";}"#,
    r#"s:9:"wholesale";s:2:"12";}"#,
);

const DISCOUNT_ENCODED: &str = concat!(
    r#"a:7:{s:11:"bulk_length";s:1:"8";s:11:"minimum_qty";s:1:"1";"#,
    r#"s:20:"minimum_qty_restrict";i:1;s:8:"apply_to";s:8:"subtotal";s:8:"products";"#,
    r#"a:4:{i:419;s:3:"419";i:420;s:3:"420";i:421;s:3:"421";i:1255;s:4:"1255";}"#,
    r#"s:9:"wholesale";s:2:"12";s:5:"dummy";s:5:"Dummy";}"#,
);

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Discount {
    bulk_length: String,
    minimum_qty: String,
    minimum_qty_restrict: i64,
    apply_to: String,
    products: BTreeMap<i64, String>,
    wholesale: String,
    dummy: String,
}

impl Default for Discount {
    fn default() -> Self {
        Self {
            bulk_length: String::new(),
            minimum_qty: String::new(),
            minimum_qty_restrict: 0,
            apply_to: String::new(),
            products: BTreeMap::new(),
            wholesale: String::new(),
            dummy: "Dummy".to_owned(),
        }
    }
}

fn expected_discount() -> Discount {
    Discount {
        bulk_length: "8".to_owned(),
        minimum_qty: "1".to_owned(),
        minimum_qty_restrict: 1,
        apply_to: "subtotal".to_owned(),
        products: [419, 420, 421, 1255]
            .into_iter()
            .map(|id| (id, id.to_string()))
            .collect(),
        wholesale: "12".to_owned(),
        dummy: "Dummy".to_owned(),
    }
}

fn round_trip<T>(value: &T) -> String
where
    T: PartialEq + fmt::Debug + Serialize + serde::de::DeserializeOwned,
{
    let text = to_string(value).expect("serializing must work");
    let rev: T = from_str(&text).expect("deserializing must work");
    assert_eq!(*value, rev, "serialization messed up data");
    text
}

fn nested(depth: usize) -> String {
    let mut text = "a:1:{i:0;".repeat(depth);
    text.push_str("i:1;");
    text.push_str(&"}".repeat(depth));
    text
}

#[test]
fn decode_discount() {
    let discount: Discount = from_str(DISCOUNT_WIRE).expect("discount must decode");
    assert_eq!(discount, expected_discount(), "unmatched key must be skipped");
}

#[test]
fn encode_discount() {
    let text = to_string(&expected_discount()).expect("discount must encode");
    assert_eq!(text, DISCOUNT_ENCODED, "field segments must match");

    let rev: Discount = from_str(&text).expect("encoded discount must decode");
    assert_eq!(rev, expected_discount(), "round trip must be lossless");
}

#[test]
fn decode_from_reader() {
    let discount: Discount = from_reader(DISCOUNT_WIRE.as_bytes()).expect("discount must decode");
    assert_eq!(discount, expected_discount(), "reader must match slice");
}

#[test]
fn reader_stops_after_value() {
    let mut de = Deserializer::from_reader(&b"i:1;i:-2;"[..]);
    assert_eq!(i64::deserialize(&mut de).expect("first value"), 1, "first value");
    assert_eq!(i64::deserialize(&mut de).expect("second value"), -2, "second value");
    de.end().expect("input must be consumed");
}

#[test]
fn slice_remainder() {
    let mut de = Deserializer::from_slice(b"s:2:\"ab\";rest");
    let value = <&str>::deserialize(&mut de).expect("borrowed str");
    assert_eq!(value, "ab", "payload must be borrowed");
    assert_eq!(de.remainder(), b"rest", "remainder must follow the value");
}

#[test]
fn byte_exact_strings() {
    for text in ["he said \"hi\"; a:1:{", "héllo wörld", "", "\";", "line\nbreak"] {
        let wire = round_trip(&text.to_owned());
        assert!(
            wire.starts_with(&format!("s:{}:\"", text.len())),
            "length must count bytes: {wire}"
        );
    }

    assert_eq!(to_string("héllo").expect("str"), "s:6:\"héllo\";", "multibyte length");
}

#[test]
fn binary_strings() {
    let wire = b"s:4:\"\xff\";x\";";
    let value: Value = from_slice(wire).expect("binary payload");
    assert_eq!(value, Value::Str(b"\xff\";x".to_vec()), "payload must be raw");
    assert_eq!(to_vec(&value).expect("binary encode"), wire, "must re-encode as is");

    let err = from_slice::<String>(b"s:1:\"\xff\";").expect_err("not utf-8");
    assert!(
        matches!(err, Error::InvalidUtf8 { position: Position { line: 1, column: 6 } }),
        "expected invalid utf-8: {err:?}"
    );
}

#[test]
fn binary_strings_need_vec() {
    let value = Value::Str(vec![0xff]);
    let err = to_string(&value).expect_err("not utf-8");
    assert!(matches!(err, Error::InvalidUtf8Output), "expected invalid output: {err:?}");

    let err = Codec::new().to_string(&value).expect_err("not utf-8");
    assert!(matches!(err, Error::InvalidUtf8Output), "expected invalid output: {err:?}");

    assert_eq!(to_vec(&value).expect("bytes"), b"s:1:\"\xff\";", "vec must keep bytes");
}

#[test]
fn large_strings() {
    // longer than the reader's stack buffer
    let payload = "x;\"}".repeat(1250);
    let text = format!(
        r#"a:2:{{s:9:"wholesale";s:{len}:"{payload}";s:5:"extra";s:{len}:"{payload}";}}"#,
        len = payload.len(),
    );

    let from_io: Discount = from_reader(text.as_bytes()).expect("reader must decode");
    let from_buf: Discount = from_str(&text).expect("slice must decode");
    assert_eq!(from_io.wholesale, payload, "known field must be read in full");
    assert_eq!(from_io, from_buf, "reader must match slice");

    let from_io: Value = from_reader(text.as_bytes()).expect("reader must decode");
    let from_buf: Value = from_str(&text).expect("slice must decode");
    assert_eq!(from_io.get("extra").and_then(Value::as_str), Some(payload.as_str()), "value");
    assert_eq!(from_io, from_buf, "reader must match slice");
}

#[test]
fn large_arrays() {
    let count = 50_000usize;
    let mut text = format!("a:{count}:{{");
    text.extend((0..count).map(|i| format!("i:{i};s:5:\"hello\";")));
    text.push('}');

    let from_buf: Value = from_str(&text).expect("slice must decode");
    assert_eq!(from_buf.as_array().map(<[_]>::len), Some(count), "entry count");
    let from_io: Value = from_reader(text.as_bytes()).expect("reader must decode");
    assert_eq!(from_io, from_buf, "reader must match slice");

    text.push('x');
    let err = from_str::<Value>(&text).expect_err("trailing");
    assert_eq!(
        err.position(),
        Some(Position { line: 1, column: text.len() }),
        "position must stay exact"
    );
}

#[test]
fn round_trip_map() {
    let map = IndexMap::<String, i64>::from_iter([
        ("b".to_owned(), 1),
        ("a".to_owned(), 2),
        ("c".to_owned(), 3),
    ]);

    let text = round_trip(&map);
    assert_eq!(text, r#"a:3:{s:1:"b";i:1;s:1:"a";i:2;s:1:"c";i:3;}"#, "entry order");

    let rev: IndexMap<String, i64> = from_str(&text).expect("map must decode");
    assert!(rev.keys().eq(map.keys()), "order must be preserved");

    let mut by_id = BTreeMap::new();
    by_id.insert(-5i64, 0.5f64);
    by_id.insert(7, -1.25);
    round_trip(&by_id);
}

#[test]
fn numeric_keys_as_strings() {
    let map: HashMap<String, String> =
        from_str(r#"a:2:{i:4;s:1:"x";s:1:"k";s:1:"y";}"#).expect("mixed keys");
    assert_eq!(map["4"], "x", "integer key must read as text");
    assert_eq!(map["k"], "y", "string key must stay");
}

#[test]
fn value_preserves_order() {
    let text = r#"a:3:{s:1:"z";i:1;i:3;s:1:"x";s:1:"a";a:0:{}}"#;
    let value: Value = from_str(text).expect("value must decode");
    assert_eq!(
        value,
        Value::Array(vec![
            (Key::from("z"), Value::Int(1)),
            (Key::Int(3), Value::from("x")),
            (Key::from("a"), Value::Array(Vec::new())),
        ]),
        "entries must keep wire order"
    );

    assert_eq!(to_string(&value).expect("value must encode"), text, "must re-encode as is");
}

#[test]
fn numeric_string_keys() {
    let text = r#"a:2:{s:2:"12";i:1;i:12;i:2;}"#;
    let value: Value = from_str(text).expect("keys must decode");
    assert_eq!(
        value,
        Value::Array(vec![
            (Key::Str(b"12".to_vec()), Value::Int(1)),
            (Key::Int(12), Value::Int(2)),
        ]),
        "wire key types must be kept"
    );
    assert_eq!(to_string(&value).expect("value must encode"), text, "must re-encode as is");

    let built = Value::Array(vec![(Key::Str(b"12".to_vec()), Value::from("x"))]);
    let encoded = to_vec(&built).expect("value must encode");
    assert_eq!(encoded, br#"a:1:{s:2:"12";s:1:"x";}"#, "string key must be written as is");
    assert_eq!(from_slice::<Value>(&encoded).expect("value must decode"), built, "round trip");
}

#[test]
fn value_list() {
    let text = r#"a:2:{i:0;s:1:"a";i:1;d:0.5;}"#;
    let value: Value = from_str(text).expect("list must decode");
    assert_eq!(to_string(&value).expect("list must encode"), text, "list keys");
}

#[test]
fn lists() {
    let text = round_trip(&vec!["a".to_owned(), "b".to_owned()]);
    assert_eq!(text, r#"a:2:{i:0;s:1:"a";i:1;s:1:"b";}"#, "list keys must be indices");

    round_trip(&(1i32, "two".to_owned(), 3.5f64));

    // the keys of a list are not checked
    let rev: Vec<i64> = from_str("a:2:{i:5;i:1;s:1:\"x\";i:2;}").expect("keyed list");
    assert_eq!(rev, [1, 2], "values must be read in order");
}

#[test]
fn count_mismatch() {
    let err = from_str::<Value>("a:2:{i:0;i:1;}").expect_err("missing entry");
    assert!(
        matches!(
            err,
            Error::Format {
                kind: FormatError::MissingEntries { declared: 2, found: 1 },
                ..
            }
        ),
        "expected missing entries: {err:?}"
    );

    let err = from_str::<Value>("a:1:{i:0;i:1;i:1;i:2;}").expect_err("extra entry");
    assert!(
        matches!(
            err,
            Error::Format {
                kind: FormatError::ExtraEntries { declared: 1 },
                ..
            }
        ),
        "expected extra entries: {err:?}"
    );

    let err = from_str::<(i64,)>("a:2:{i:0;i:1;i:1;i:2;}").expect_err("unread entry");
    assert!(
        matches!(
            err,
            Error::Format {
                kind: FormatError::UnreadEntries { remaining: 1 },
                ..
            }
        ),
        "expected unread entries: {err:?}"
    );
}

#[test]
fn struct_integer_key() {
    let err = from_str::<Discount>(r#"a:1:{i:0;s:1:"x";}"#).expect_err("integer key");
    assert!(
        matches!(
            err,
            Error::TypeMismatch {
                expected: "string",
                found: "integer",
                ..
            }
        ),
        "expected type mismatch: {err:?}"
    );
}

#[test]
fn skips_nested_unknown_field() {
    let text = concat!(
        r#"a:3:{s:9:"wholesale";s:1:"5";"#,
        r#"s:5:"extra";a:2:{i:0;s:2:"x;";s:1:"k";a:1:{i:0;d:-INF;}}"#,
        r#"s:8:"apply_to";s:3:"all";}"#,
    );

    let discount: Discount = from_str(text).expect("unknown field must be skipped");
    assert_eq!(discount.wholesale, "5", "field before the skipped one");
    assert_eq!(discount.apply_to, "all", "field after the skipped one");
    assert_eq!(discount.dummy, "Dummy", "absent field keeps its default");
}

#[test]
fn unsupported_tags() {
    for text in ["b:1;", "N;", r#"O:8:"stdClass":0:{}"#, "r:1;"] {
        let err = from_str::<Value>(text).expect_err("unsupported tag");
        assert!(
            matches!(err, Error::UnsupportedTag { position: Position::START, .. }),
            "expected unsupported tag for {text:?}: {err:?}"
        );
    }

    let err = from_str::<Value>("a:1:{i:0;b:0;}").expect_err("nested bool");
    assert!(
        matches!(
            err,
            Error::UnsupportedTag {
                tag: 'b',
                position: Position { line: 1, column: 10 }
            }
        ),
        "expected nested unsupported tag: {err:?}"
    );

    let err = from_str::<Value>("a:1:{b:1;i:0;}").expect_err("bool key");
    assert!(matches!(err, Error::Parse { .. }), "expected bad key: {err:?}");
}

#[test]
fn malformed_tokens() {
    let err = from_str::<String>("s:3:abc;").expect_err("unquoted string");
    assert!(
        matches!(
            err,
            Error::Format {
                kind: FormatError::UnquotedString,
                position: Position { line: 1, column: 5 }
            }
        ),
        "expected unquoted string: {err:?}"
    );

    let err = from_str::<i64>("i:12x;").expect_err("bad integer");
    match err {
        Error::Parse {
            expected, found, position,
        } => {
            assert_eq!(expected, "an integer", "expected description");
            assert_eq!(found, "12x", "offending token");
            assert_eq!(position, Position { line: 1, column: 3 }, "token position");
        },
        _ => panic!("expected parse error: {err:?}"),
    }

    let err = from_str::<Value>("a:2:{i:0;s:3:\"a\nb\";i:1;b:1;}").expect_err("bool on line 2");
    assert_eq!(err.position(), Some(Position { line: 2, column: 8 }), "line tracking");

    let err = from_str::<Value>("a:2:{i:0;i:1;").expect_err("truncated");
    assert!(matches!(err, Error::Eof { .. }), "expected eof: {err:?}");

    let err = from_str::<i64>("i:1;x").expect_err("trailing");
    assert!(
        matches!(err, Error::TrailingBytes { position: Position { line: 1, column: 5 } }),
        "expected trailing bytes: {err:?}"
    );
}

#[test]
fn visitor_errors_are_located() {
    let err = from_str::<u8>("i:300;").expect_err("out of range");
    assert!(matches!(err, Error::Located { .. }), "expected located error: {err:?}");
    assert_eq!(err.position(), Some(Position { line: 1, column: 7 }), "after the token");

    let err = from_str::<Value>("i:9223372036854775808;").expect_err("too large for value");
    assert!(matches!(err, Error::Located { .. }), "expected located error: {err:?}");

    let large: u64 = from_str("i:9223372036854775808;").expect("fits u64");
    assert_eq!(large, 1 << 63, "unsigned range must be readable");
}

#[test]
fn floats() {
    let inf: f64 = from_str("d:INF;").expect("inf");
    assert_eq!(inf, f64::INFINITY, "positive infinity");
    let neg_inf: f64 = from_str("d:-INF;").expect("-inf");
    assert_eq!(neg_inf, f64::NEG_INFINITY, "negative infinity");
    let nan: f64 = from_str("d:NAN;").expect("nan");
    assert!(nan.is_nan(), "not a number");
    let exp: f64 = from_str("d:1.5E+25;").expect("exponent");
    assert_eq!(exp, 1.5e25, "exponent notation");
    let int: f64 = from_str("i:3;").expect("integer as float");
    assert_eq!(int, 3.0, "integer token as float");

    assert_eq!(to_string(&f64::INFINITY).expect("inf"), "d:INF;", "encode inf");
    assert_eq!(to_string(&f64::NEG_INFINITY).expect("-inf"), "d:-INF;", "encode -inf");
    assert_eq!(to_string(&f64::NAN).expect("nan"), "d:NAN;", "encode nan");
    assert_eq!(to_string(&0.1f32).expect("f32"), "d:0.1;", "f32 precision");

    for v in [0.1f64, 1.0, -2.5, 1e300, 5e-324, 123_456_789.123] {
        round_trip(&v);
    }

    let err = from_str::<f64>("d:1..2x;").expect_err("bad float");
    assert!(matches!(err, Error::Parse { expected: "a float", .. }), "expected bad float: {err:?}");
}

#[test]
fn options() {
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Limits {
        max_uses: Option<i64>,
        label: Option<String>,
    }

    let limits: Limits = from_str(r#"a:1:{s:8:"max_uses";i:4;}"#).expect("limits");
    assert_eq!(
        limits,
        Limits {
            max_uses: Some(4),
            label: None
        },
        "present field is some, absent field is none"
    );

    let err = to_string(&limits).expect_err("none cannot be encoded");
    assert!(matches!(err, Error::UnsupportedType("none")), "expected unsupported: {err:?}");
}

#[test]
fn unit_enums() {
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum Scope {
        Subtotal,
        Total,
    }

    #[derive(Debug, Serialize)]
    enum Shape {
        Circle(u32),
    }

    assert_eq!(round_trip(&Scope::Subtotal), r#"s:8:"subtotal";"#, "variant name");
    round_trip(&vec![Scope::Total, Scope::Subtotal]);

    let err = to_string(&Shape::Circle(1)).expect_err("data variant");
    assert!(
        matches!(err, Error::UnsupportedType("newtype variant")),
        "expected unsupported: {err:?}"
    );
}

#[test]
fn unsupported_encodings() {
    struct Unsized;

    impl Serialize for Unsized {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_seq((0..3).filter(|i| i % 2 == 0))
        }
    }

    let err = to_string(&true).expect_err("bool");
    assert!(matches!(err, Error::UnsupportedType("bool")), "expected unsupported: {err:?}");

    let err = to_string(&()).expect_err("unit");
    assert!(matches!(err, Error::UnsupportedType("unit")), "expected unsupported: {err:?}");

    let err = to_string(&HashMap::from([(true, 1)])).expect_err("bool key");
    assert!(matches!(err, Error::KeyMustBeIntOrString), "expected bad key: {err:?}");

    let err = to_string(&Unsized).expect_err("no length");
    assert!(matches!(err, Error::LengthRequired), "expected length required: {err:?}");
}

#[test]
fn struct_length_checked() {
    struct Liar;

    impl Serialize for Liar {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            use serde::ser::SerializeStruct as _;

            let mut s = serializer.serialize_struct("Liar", 2)?;
            s.serialize_field("Only", &1)?;
            s.end()
        }
    }

    let err = to_string(&Liar).expect_err("announced two fields");
    assert!(
        matches!(err, Error::LengthIncorrect { expected: 2, actual: 1 }),
        "expected incorrect length: {err:?}"
    );
}

#[test]
fn recursion_limit() {
    let ok: Value = from_str(&nested(128)).expect("default depth");
    assert!(ok.as_array().is_some(), "outermost must be an array");

    let err = from_str::<Value>(&nested(129)).expect_err("too deep");
    assert!(matches!(err, Error::RecursionLimitExceeded { .. }), "expected limit: {err:?}");

    let codec = Codec::new().max_depth(Some(2));
    codec.from_str::<Value>(&nested(2)).expect("within custom limit");
    let err = codec.from_str::<Value>(&nested(3)).expect_err("past custom limit");
    assert!(matches!(err, Error::RecursionLimitExceeded { .. }), "expected limit: {err:?}");

    // skipped values count towards the limit too
    let text = format!(r#"a:1:{{s:5:"extra";{}}}"#, nested(3));
    let err = codec.from_str::<Discount>(&text).expect_err("skipped too deep");
    assert!(matches!(err, Error::RecursionLimitExceeded { .. }), "expected limit: {err:?}");

    Codec::new()
        .max_depth(None)
        .from_str::<Value>(&nested(140))
        .expect("no limit");
}

#[test]
fn codec_converters() {
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Item {
        item_name: String,
        unit_price: f64,
    }

    let item = Item {
        item_name: "cup".to_owned(),
        unit_price: 2.5,
    };

    let codec = Codec::with_converters(Identity, Identity);
    let text = codec.to_string(&item).expect("identity encode");
    assert_eq!(
        text,
        r#"a:2:{s:9:"item_name";s:3:"cup";s:10:"unit_price";d:2.5;}"#,
        "names must be kept"
    );
    assert_eq!(codec.from_str::<Item>(&text).expect("identity decode"), item, "identity decode");

    let upper = Codec::with_converters(
        from_fn(|name: &str| name.to_ascii_lowercase()),
        from_fn(|name: &str| name.to_ascii_uppercase()),
    );
    let text = upper.to_vec(&item).expect("custom encode");
    assert!(text.starts_with(br#"a:2:{s:9:"ITEM_NAME";"#), "encode converter must apply");
    let rev: Item = upper.from_reader(&text[..]).expect("custom decode");
    assert_eq!(rev, item, "decode converter must apply");

    let mut out = Vec::new();
    Codec::new().to_writer(&mut out, &expected_discount()).expect("default encode");
    assert_eq!(out, DISCOUNT_ENCODED.as_bytes(), "default codec must match free functions");
}

#[test]
fn string_to_existing_serializer() {
    let mut ser = crate::ser::Serializer::from_writer(Vec::new());
    ser.serialize_str("a\"b").expect("str");
    ser.as_writer().push(b'!');
    assert_eq!(ser.into_writer(), b"s:3:\"a\"b\";!", "writer must receive output");
}
