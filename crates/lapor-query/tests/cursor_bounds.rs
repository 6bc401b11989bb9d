use lapor_query::{decode_cursor, encode_cursor, CursorErrorCode, CursorPayload};
use serde_json::json;

fn payload() -> CursorPayload {
    CursorPayload {
        cursor_version: "v1".to_string(),
        time_field: "createdAt".to_string(),
        last_time: json!("2024-03-05T09:30:00Z"),
        last_id: "laporan-041".to_string(),
    }
}

#[test]
fn cursor_round_trips() {
    let token = encode_cursor(&payload(), b"secret").expect("encode");
    let decoded = decode_cursor(&token, b"secret").expect("decode");
    assert_eq!(decoded, payload());
}

#[test]
fn cursor_rejects_oversized_token() {
    let token = "a".repeat(2048);
    let err = decode_cursor(&token, b"s").expect_err("oversized");
    assert_eq!(err.code, CursorErrorCode::InvalidFormat);
}

#[test]
fn cursor_rejects_tampering_at_same_length() {
    let token = encode_cursor(&payload(), b"secret").expect("encode");
    let mut tampered = token.clone().into_bytes();
    let idx = tampered.len() / 2;
    tampered[idx] = if tampered[idx] == b'a' { b'b' } else { b'a' };
    let tampered = String::from_utf8(tampered).expect("utf8");
    assert_eq!(tampered.len(), token.len());
    let err = decode_cursor(&tampered, b"secret").expect_err("tamper");
    assert!(matches!(
        err.code,
        CursorErrorCode::InvalidSignature | CursorErrorCode::InvalidFormat
    ));
}

#[test]
fn cursor_rejects_wrong_secret() {
    let token = encode_cursor(&payload(), b"secret").expect("encode");
    let err = decode_cursor(&token, b"other").expect_err("wrong secret");
    assert_eq!(err.code, CursorErrorCode::InvalidSignature);
}

#[test]
fn cursor_rejects_unsupported_version() {
    let mut old = payload();
    old.cursor_version = "v0".to_string();
    let token = encode_cursor(&old, b"secret").expect("encode");
    let err = decode_cursor(&token, b"secret").expect_err("version");
    assert_eq!(err.code, CursorErrorCode::UnsupportedVersion);
}

#[test]
fn cursor_rejects_unknown_ordering_field() {
    let mut foreign = payload();
    foreign.time_field = "updatedAt".to_string();
    let token = encode_cursor(&foreign, b"secret").expect("encode");
    let err = decode_cursor(&token, b"secret").expect_err("ordering");
    assert_eq!(err.code, CursorErrorCode::OrderMismatch);
}
