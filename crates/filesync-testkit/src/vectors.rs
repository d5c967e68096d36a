//! Known-answer vectors.
//!
//! Fixed inputs with their expected digests and wire bytes. Any
//! implementation that talks to filesync peers must reproduce these
//! exactly.

use filesync_core::{
    aggregate_digest, encode_request, encode_response, PasswordDigest, Request, Response,
    Sha512Digest, Status,
};

/// What a vector computes from its input.
#[derive(Debug, Clone)]
pub enum Subject {
    /// Base64 SHA-512 of the content.
    Content(&'static [u8]),
    /// Aggregate over the contents, listed in name order.
    Aggregate(&'static [&'static str]),
    /// Base64 password digest.
    Password(&'static str),
    /// Length-prefixed request frame, hex.
    RequestFrame(Request),
    /// Length-prefixed response frame, hex.
    ResponseFrame(Response),
}

/// A known-answer vector.
#[derive(Debug, Clone)]
pub struct KnownAnswer {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub subject: Subject,
    pub expected: &'static str,
}

impl KnownAnswer {
    /// Compute the vector's output.
    pub fn compute(&self) -> String {
        match &self.subject {
            Subject::Content(content) => Sha512Digest::hash(content).to_base64(),
            Subject::Aggregate(contents) => {
                let digests: Vec<String> = contents
                    .iter()
                    .map(|c| Sha512Digest::hash(c.as_bytes()).to_base64())
                    .collect();
                aggregate_digest(digests.iter().map(String::as_str))
            }
            Subject::Password(password) => PasswordDigest::derive(password).to_base64(),
            Subject::RequestFrame(request) => hex::encode(frame(&encode_request(request))),
            Subject::ResponseFrame(response) => hex::encode(frame(&encode_response(response))),
        }
    }
}

/// Prefix a payload with its little-endian u32 length.
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + payload.len());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Get all known-answer vectors.
pub fn all_vectors() -> Vec<KnownAnswer> {
    vec![
        KnownAnswer {
            name: "content digest of hello world",
            subject: Subject::Content(b"hello world"),
            expected: "MJ7MSJwS1utMxA9QyQLytNDtd+5RGnx6m808qG1M2G+YndNbxf9JlnDaNCVbRbDP2DDoH2Bdz33FVC6TrpzXbw==",
        },
        KnownAnswer {
            name: "content digest of alpha",
            subject: Subject::Content(b"alpha"),
            expected: "ujzlhmfKmxKzwM3MTaV/mWKuynBlxDp9nAJzMv258LvPaQBChogP49jz/Y8D3f/XSF/ZTJ06OGGOoQaR2Nan+g==",
        },
        KnownAnswer {
            name: "content digest of beta",
            subject: Subject::Content(b"beta"),
            expected: "Vgxy3nLApSItkoI39rEFKW2gWYU1NLjQH8I1J8HV2KS4PVsd0/IhBkK9BxzFAFmNTr0pOXPZ9K64rnM2rzqVnQ==",
        },
        KnownAnswer {
            name: "aggregate of an empty directory",
            subject: Subject::Aggregate(&[]),
            expected: "z4PhNX7vuL3xVChQ1m2AB9Yg5AULVxXcg/SpIdNs6c5H0NE8XYXysP+DGNKHfuwvY7kxvUdBeoGlODJ6+SfaPg==",
        },
        KnownAnswer {
            name: "aggregate of a single hello world file",
            subject: Subject::Aggregate(&["hello world"]),
            expected: "lnJ2NklEQdoS4xT4iA1AlmZCIrK6tWtikjTxluoI9DuYYFPQn/bvi3JMIY73/gLIAHqFt93H4Z0QuTYNdm2tLQ==",
        },
        KnownAnswer {
            name: "aggregate of alpha then beta",
            subject: Subject::Aggregate(&["alpha", "beta"]),
            expected: "wZGV8bYu6JC5GrV5rhn1v68AHgMJV/R2VKOpwEjMNINNmMKH4DAJI68LoL+uFPosctqeOo7zFraTrJjw96RK7w==",
        },
        KnownAnswer {
            name: "password digest of Secret_1",
            subject: Subject::Password("Secret_1"),
            expected: "U07h72k1XzQ6EFAq9CTtDwQCu2RPjYBQTcUTJ9XCYUP7dghdTLjmIjf93zpbq2jvVcMRb6uDaCq9JxCAekobcQ==",
        },
        KnownAnswer {
            name: "password digest of the empty string",
            subject: Subject::Password(""),
            expected: "z4bnPor+ytIJb0Zx+pSqNAZTGj5Hllchyz/3cifDQyunMzelyfRkJXf+llMLBXa880zHVuPgHCZN4+Arrd6U+w==",
        },
        KnownAnswer {
            name: "ping request frame",
            subject: Subject::RequestFrame(Request::ping()),
            expected: "03000000820280",
        },
        KnownAnswer {
            name: "authorize request frame",
            subject: Subject::RequestFrame(Request::authorize("alice", "Secret_1")),
            expected: "1200000082008265616c696365685365637265745f31",
        },
        KnownAnswer {
            name: "update request frame",
            subject: Subject::RequestFrame(Request::get_update([("a.txt", "x")])),
            expected: "0b00000082048265612e7478746178",
        },
        KnownAnswer {
            name: "ping response frame",
            subject: Subject::ResponseFrame(Response::new(Status::Success, "Server response")),
            expected: "1200000082006f53657276657220726573706f6e7365",
        },
        KnownAnswer {
            name: "hash miss response frame",
            subject: Subject::ResponseFrame(Response::new(Status::HashMiss, "")),
            expected: "03000000820260",
        },
    ]
}

/// Check every vector, returning `(name, matches, actual)` for each.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let actual = v.compute();
            (v.name.to_string(), actual == v.expected, actual)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_match() {
        for (name, ok, actual) in verify_all_vectors() {
            assert!(ok, "vector '{}' produced {}", name, actual);
        }
    }

    #[test]
    fn test_vector_names_are_unique() {
        let vectors = all_vectors();
        let mut names: Vec<_> = vectors.iter().map(|v| v.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), vectors.len());
    }

    #[test]
    fn test_frame_prefix() {
        assert_eq!(frame(b"abc"), vec![3, 0, 0, 0, b'a', b'b', b'c']);
    }
}
