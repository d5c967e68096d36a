//! File inventory types.
//!
//! A [`FileInventory`] is an immutable value: a name-ordered map of
//! [`FileRecord`]s plus the aggregate digest derived from them. It is
//! built in one go and never edited afterwards; a rescan produces a new
//! value.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::digest::aggregate_digest;

/// One file in the managed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// File name, used verbatim on the wire.
    pub name: String,
    /// Where the content lives.
    pub path: PathBuf,
    /// Base64 SHA-512 of the content.
    pub digest: String,
}

/// The authoritative set of files and their digests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInventory {
    files: BTreeMap<String, FileRecord>,
    aggregate: String,
}

impl FileInventory {
    /// Build an inventory from records. Later duplicates of a name win.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = FileRecord>,
    {
        let files: BTreeMap<String, FileRecord> = records
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect();
        let aggregate = aggregate_digest(files.values().map(|r| r.digest.as_str()));
        Self { files, aggregate }
    }

    /// An inventory with no files.
    pub fn empty() -> Self {
        Self::from_records(std::iter::empty())
    }

    /// Aggregate digest over every file digest, in name order.
    pub fn aggregate_digest(&self) -> &str {
        &self.aggregate
    }

    /// Whether the given aggregate digest matches this inventory.
    pub fn matches_aggregate(&self, digest: &str) -> bool {
        self.aggregate == digest
    }

    pub fn get(&self, name: &str) -> Option<&FileRecord> {
        self.files.get(name)
    }

    /// Records in ascending name order.
    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.values()
    }

    /// `(name, digest)` pairs in ascending name order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files
            .values()
            .map(|r| (r.name.as_str(), r.digest.as_str()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl Default for FileInventory {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Sha512Digest;

    fn record(name: &str, content: &[u8]) -> FileRecord {
        FileRecord {
            name: name.into(),
            path: PathBuf::from(name),
            digest: Sha512Digest::hash(content).to_base64(),
        }
    }

    #[test]
    fn test_aggregate_ignores_insertion_order() {
        let a = FileInventory::from_records([record("a", b"alpha"), record("b", b"beta")]);
        let b = FileInventory::from_records([record("b", b"beta"), record("a", b"alpha")]);
        assert_eq!(a.aggregate_digest(), b.aggregate_digest());
        assert_eq!(
            a.aggregate_digest(),
            "wZGV8bYu6JC5GrV5rhn1v68AHgMJV/R2VKOpwEjMNINNmMKH4DAJI68LoL+uFPosctqeOo7zFraTrJjw96RK7w=="
        );
    }

    #[test]
    fn test_aggregate_changes_with_content() {
        let before = FileInventory::from_records([record("a", b"alpha")]);
        let after = FileInventory::from_records([record("a", b"alpha2")]);
        assert_ne!(before.aggregate_digest(), after.aggregate_digest());
        assert!(before.matches_aggregate(before.aggregate_digest()));
        assert!(!before.matches_aggregate(after.aggregate_digest()));
    }

    #[test]
    fn test_pairs_in_name_order() {
        let inv = FileInventory::from_records([record("z", b"1"), record("m", b"2"), record("a", b"3")]);
        let names: Vec<&str> = inv.pairs().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "m", "z"]);
    }
}
