//! Integration tests for the binary codec: round-trip laws and
//! malformed-stream rejection.

mod common;

use classref::{decode, encode, CancelToken, DecodeError, IndexValue, SymbolKey, FORMAT_VERSION};
use common::*;

fn extracted_sample() -> IndexValue {
    let mut builder = ClassFileBuilder::new("net/minecraft/Foo", "java/lang/Object");
    let baz = builder.method_ref("com/mojang/Bar", "baz", "()V");
    let state = builder.field_ref("com/mojang/State", "flag", "Z");
    let target = builder.class("net/minecraft/Target");

    let mut code = Vec::new();
    code.extend(invokestatic(baz));
    code.extend(invokestatic(baz));
    code.extend(getstatic(state));
    code.push(POP);
    code.extend(new_instance(target));
    code.push(POP);
    code.push(RETURN);
    builder.add_method("run", "()V", &code);

    classref::extract(&builder.build(), &CancelToken::new()).unwrap()
}

/// Round-trip law: extract → encode → decode equals the extraction
/// output directly.
#[test]
fn test_extraction_output_roundtrips() {
    let cancel = CancelToken::new();
    let value = extracted_sample();
    assert!(!value.is_empty());

    let decoded = decode(&encode(&value), &cancel).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn test_handcrafted_value_roundtrips() {
    let cancel = CancelToken::new();
    let mut value = IndexValue::new();
    value.record_n(SymbolKey::class_ref("a/A"), "x/X", 1);
    value.record_n(SymbolKey::class_ref("a/A"), "y/Y", 7);
    value.record_n(SymbolKey::field_ref("a/A", "f", "[[I"), "x/X", 1000);
    value.record_n(
        SymbolKey::method_ref("b/B", "<init>", "(Ljava/lang/String;)V"),
        "z/Z",
        1,
    );

    let decoded = decode(&encode(&value), &cancel).unwrap();
    assert_eq!(decoded, value);
}

/// Strings must reconstruct byte-identically, including non-ASCII
/// member names.
#[test]
fn test_unicode_strings_roundtrip() {
    let cancel = CancelToken::new();
    let mut value = IndexValue::new();
    value.record_n(
        SymbolKey::method_ref("com/example/Überklasse", "メソッド", "()V"),
        "com/example/呼び出し元",
        2,
    );

    let decoded = decode(&encode(&value), &cancel).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn test_every_truncation_is_a_decode_error() {
    let cancel = CancelToken::new();
    let bytes = encode(&extracted_sample());
    for cut in 0..bytes.len() {
        assert!(
            decode(&bytes[..cut], &cancel).is_err(),
            "prefix of {} bytes must not decode",
            cut
        );
    }
}

#[test]
fn test_trailing_garbage_is_a_decode_error() {
    let cancel = CancelToken::new();
    let mut bytes = encode(&extracted_sample());
    bytes.extend_from_slice(&[1, 2, 3]);
    assert!(matches!(
        decode(&bytes, &cancel),
        Err(DecodeError::TrailingBytes(3))
    ));
}

#[test]
fn test_format_version_is_stable() {
    // The host persists this next to the data; changing the layout
    // without bumping it would silently corrupt queries.
    assert_eq!(FORMAT_VERSION, 1);
}
