//! Control-channel payload encoding.
//!
//! Messages are encoded as deterministic CBOR:
//! - Request: `[kind: uint, [field: text, ...]]`
//! - Response: `[status: uint, message: text]`
//!
//! Integers use their smallest encoding and all lengths are definite, so
//! the same message always produces the same bytes regardless of platform.
//! Framing (the length prefix) belongs to the transport layer; this module
//! does no I/O.

use ciborium::value::{Integer, Value};

use crate::error::CodecError;
use crate::messages::{Request, RequestKind, Response, Status};

/// Encode a request payload.
pub fn encode_request(request: &Request) -> Vec<u8> {
    let fields = request
        .fields
        .iter()
        .map(|f| Value::Text(f.clone()))
        .collect();
    let value = Value::Array(vec![
        Value::Integer(request.kind.to_u8().into()),
        Value::Array(fields),
    ]);
    encode_value(&value)
}

/// Encode a response payload.
pub fn encode_response(response: &Response) -> Vec<u8> {
    let value = Value::Array(vec![
        Value::Integer(response.status.to_u8().into()),
        Value::Text(response.message.clone()),
    ]);
    encode_value(&value)
}

/// Decode a request payload.
///
/// A well-formed payload with an unknown kind yields
/// [`CodecError::UnknownKind`] so the caller can answer it instead of
/// dropping the connection.
pub fn decode_request(bytes: &[u8]) -> Result<Request, CodecError> {
    let items = decode_pair(bytes)?;
    let (tag, body) = (&items[0], &items[1]);

    let tag = expect_uint(tag, "request kind")?;
    let fields = match body {
        Value::Array(values) => values
            .iter()
            .map(|v| match v {
                Value::Text(s) => Ok(s.clone()),
                _ => Err(CodecError::Malformed("request field is not text".into())),
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(CodecError::Malformed("request fields are not an array".into())),
    };

    let kind = u8::try_from(tag)
        .ok()
        .and_then(RequestKind::from_u8)
        .ok_or(CodecError::UnknownKind(tag))?;

    Ok(Request { kind, fields })
}

/// Decode a response payload.
pub fn decode_response(bytes: &[u8]) -> Result<Response, CodecError> {
    let items = decode_pair(bytes)?;
    let (tag, body) = (&items[0], &items[1]);

    let tag = expect_uint(tag, "status")?;
    let message = match body {
        Value::Text(s) => s.clone(),
        _ => return Err(CodecError::Malformed("response message is not text".into())),
    };
    let status = u8::try_from(tag)
        .ok()
        .and_then(Status::from_u8)
        .ok_or(CodecError::UnknownStatus(tag))?;

    Ok(Response { status, message })
}

/// Parse a payload that must be exactly one two-element CBOR array.
fn decode_pair(bytes: &[u8]) -> Result<Vec<Value>, CodecError> {
    let mut reader = bytes;
    let value: Value = ciborium::from_reader(&mut reader)
        .map_err(|e| CodecError::Malformed(e.to_string()))?;
    if !reader.is_empty() {
        return Err(CodecError::Malformed(format!(
            "{} trailing bytes after message",
            reader.len()
        )));
    }

    match value {
        Value::Array(items) if items.len() == 2 => Ok(items),
        Value::Array(items) => Err(CodecError::Malformed(format!(
            "expected 2 elements, got {}",
            items.len()
        ))),
        _ => Err(CodecError::Malformed("expected array".into())),
    }
}

fn expect_uint(value: &Value, what: &str) -> Result<u64, CodecError> {
    match value {
        Value::Integer(i) => {
            let n = i128::from(*i);
            u64::try_from(n).map_err(|_| CodecError::Malformed(format!("negative {}", what)))
        }
        _ => Err(CodecError::Malformed(format!("{} is not an integer", what))),
    }
}

/// Encode a CBOR value with smallest-integer, definite-length rules.
///
/// Only the value types the protocol uses are accepted.
fn encode_value(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value);
    buf
}

fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Text(s) => {
            encode_uint(buf, 3, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Array(items) => {
            encode_uint(buf, 4, items.len() as u64);
            for item in items {
                encode_value_to(buf, item);
            }
        }
        // Messages are built only from the variants above.
        _ => unreachable!("unsupported CBOR value in protocol message"),
    }
}

fn encode_integer(buf: &mut Vec<u8>, i: Integer) {
    let n = i128::from(i);
    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, 1, (-1 - n) as u64);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ping_bytes_are_stable() {
        // [2, []]
        assert_eq!(encode_request(&Request::ping()), vec![0x82, 0x02, 0x80]);
    }

    #[test]
    fn test_success_bytes_are_stable() {
        // [0, ""]
        assert_eq!(encode_response(&Response::success()), vec![0x82, 0x00, 0x60]);
    }

    #[test]
    fn test_request_roundtrip_with_empty_strings() {
        let request = Request::authorize("", "");
        let decoded = decode_request(&encode_request(&request)).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_request_roundtrip_empty_update() {
        let request = Request::get_update(Vec::<(String, String)>::new());
        let decoded = decode_request(&encode_request(&request)).unwrap();
        assert_eq!(decoded, request);
        assert!(decoded.fields.is_empty());
    }

    #[test]
    fn test_unknown_kind_is_distinguished() {
        // [9, []]
        let err = decode_request(&[0x82, 0x09, 0x80]).unwrap_err();
        assert!(matches!(err, CodecError::UnknownKind(9)));

        // [300, []]
        let err = decode_request(&[0x82, 0x19, 0x01, 0x2c, 0x80]).unwrap_err();
        assert!(matches!(err, CodecError::UnknownKind(300)));
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(matches!(decode_request(&[]), Err(CodecError::Malformed(_))));
        // [2]
        assert!(matches!(decode_request(&[0x81, 0x02]), Err(CodecError::Malformed(_))));
        // [2, [1]]: field is not text
        assert!(matches!(
            decode_request(&[0x82, 0x02, 0x81, 0x01]),
            Err(CodecError::Malformed(_))
        ));
        // trailing byte
        assert!(matches!(
            decode_request(&[0x82, 0x02, 0x80, 0x00]),
            Err(CodecError::Malformed(_))
        ));
        // [-1, ""]
        assert!(matches!(
            decode_response(&[0x82, 0x20, 0x60]),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn test_unknown_status() {
        // [7, ""]
        assert!(matches!(
            decode_response(&[0x82, 0x07, 0x60]),
            Err(CodecError::UnknownStatus(7))
        ));
    }

    #[test]
    fn test_integer_encoding() {
        let mut buf = Vec::new();
        encode_uint(&mut buf, 0, 23);
        assert_eq!(buf, vec![0x17]);

        buf.clear();
        encode_uint(&mut buf, 0, 24);
        assert_eq!(buf, vec![0x18, 24]);

        buf.clear();
        encode_uint(&mut buf, 3, 256);
        assert_eq!(buf, vec![0x79, 0x01, 0x00]);
    }

    fn any_kind() -> impl Strategy<Value = RequestKind> {
        (0u8..5).prop_map(|v| RequestKind::from_u8(v).unwrap())
    }

    fn any_status() -> impl Strategy<Value = Status> {
        (0u8..6).prop_map(|v| Status::from_u8(v).unwrap())
    }

    proptest! {
        #[test]
        fn request_roundtrip(kind in any_kind(), fields in prop::collection::vec(".{0,40}", 0..8)) {
            let request = Request::new(kind, fields);
            prop_assert_eq!(decode_request(&encode_request(&request)).unwrap(), request);
        }

        #[test]
        fn response_roundtrip(status in any_status(), message in ".{0,80}") {
            let response = Response::new(status, message);
            prop_assert_eq!(decode_response(&encode_response(&response)).unwrap(), response);
        }
    }
}
