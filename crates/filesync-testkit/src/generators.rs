//! Proptest generators for property-based testing.

use proptest::prelude::*;

use filesync_core::{Request, RequestKind, Response, Status};

/// Generate a request kind.
pub fn request_kind() -> impl Strategy<Value = RequestKind> {
    prop_oneof![
        Just(RequestKind::Authorize),
        Just(RequestKind::Register),
        Just(RequestKind::Ping),
        Just(RequestKind::CheckAggregateHash),
        Just(RequestKind::GetUpdate),
    ]
}

/// Generate a response status.
pub fn status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Success),
        Just(Status::IncorrectInput),
        Just(Status::HashMiss),
        Just(Status::NotAuthorized),
        Just(Status::AlreadyAuthorized),
        Just(Status::Fail),
    ]
}

/// Generate a login that passes format validation.
pub fn login() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_]{1,25}".prop_map(String::from)
}

/// Generate a transferable file name.
pub fn file_name() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9._-]{0,23}"
        .prop_filter("reserved name", |name| {
            filesync_core::validate_file_name(name).is_ok()
        })
        .prop_map(String::from)
}

/// Generate arbitrary text, including multi-byte characters.
pub fn text(max_len: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(any::<char>(), 0..=max_len).prop_map(|chars| chars.into_iter().collect())
}

/// Generate a request with any kind and any number of fields.
///
/// Field counts are not checked against the kind; use this for the
/// codec, not for session behavior.
pub fn request() -> impl Strategy<Value = Request> {
    (request_kind(), prop::collection::vec(text(40), 0..8))
        .prop_map(|(kind, fields)| Request::new(kind, fields))
}

/// Generate a response.
pub fn response() -> impl Strategy<Value = Response> {
    (status(), text(120)).prop_map(|(status, message)| Response::new(status, message))
}

/// Generate a directory listing as `(name, content)` pairs with unique names.
pub fn directory(max_files: usize, max_len: usize) -> impl Strategy<Value = Vec<(String, Vec<u8>)>> {
    prop::collection::btree_map(
        file_name(),
        prop::collection::vec(any::<u8>(), 0..=max_len),
        0..=max_files,
    )
    .prop_map(|files| files.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use filesync_core::{
        decode_request, decode_response, encode_request, encode_response, validate_login,
        FileInventory, FileRecord, Sha512Digest,
    };
    use std::path::PathBuf;

    proptest! {
        #[test]
        fn test_request_codec_is_lossless(req in request()) {
            let bytes = encode_request(&req);
            prop_assert_eq!(decode_request(&bytes).unwrap(), req);
        }

        #[test]
        fn test_response_codec_is_lossless(resp in response()) {
            let bytes = encode_response(&resp);
            prop_assert_eq!(decode_response(&bytes).unwrap(), resp);
        }

        #[test]
        fn test_request_encoding_is_deterministic(req in request()) {
            prop_assert_eq!(encode_request(&req), encode_request(&req.clone()));
        }

        #[test]
        fn test_generated_logins_are_valid(name in login()) {
            prop_assert!(validate_login(&name).is_ok());
        }

        #[test]
        fn test_aggregate_ignores_listing_order(files in directory(8, 64)) {
            let records: Vec<FileRecord> = files
                .iter()
                .map(|(name, content)| FileRecord {
                    name: name.clone(),
                    path: PathBuf::from(name),
                    digest: Sha512Digest::hash(content).to_base64(),
                })
                .collect();
            let forward = FileInventory::from_records(records.clone());
            let backward = FileInventory::from_records(records.into_iter().rev());
            prop_assert_eq!(forward.aggregate_digest(), backward.aggregate_digest());
        }
    }
}
