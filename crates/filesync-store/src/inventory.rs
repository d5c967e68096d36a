//! The managed directory and its published inventory.
//!
//! [`Inventory`] owns the directory path and the current
//! [`FileInventory`]. Readers take a cheap [`Arc`] snapshot; a rescan
//! builds a complete new value off to the side and swaps it in, so a
//! reader sees either the old inventory or the new one.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use filesync_core::{
    limits, validate_file_name, ContentHasher, FileInventory, FileRecord, Sha512Digest,
};

use crate::error::Result;

/// Directory scanner and inventory publisher.
#[derive(Debug)]
pub struct Inventory {
    dir: PathBuf,
    current: RwLock<Arc<FileInventory>>,
    /// Held from scan start to publish so rescans publish in order.
    scan: Mutex<()>,
}

impl Inventory {
    /// Open a managed directory, creating it if missing, and scan it.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let initial = scan_directory(&dir)?;
        tracing::info!(
            "indexed {} files in {} (aggregate {})",
            initial.len(),
            dir.display(),
            initial.aggregate_digest()
        );
        Ok(Self {
            dir,
            current: RwLock::new(Arc::new(initial)),
            scan: Mutex::new(()),
        })
    }

    /// The managed directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The currently published inventory.
    pub fn snapshot(&self) -> Arc<FileInventory> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Rebuild the inventory from disk and publish it.
    ///
    /// Concurrent rescans run one at a time, so the last one to finish
    /// saw the directory no earlier than any other.
    /// On error the previously published inventory stays in place.
    /// Blocking; call it from `spawn_blocking` in async code.
    pub fn rescan(&self) -> Result<Arc<FileInventory>> {
        let _scan = self.scan.lock().unwrap_or_else(|e| e.into_inner());
        let fresh = Arc::new(scan_directory(&self.dir)?);
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = fresh.clone();
        tracing::info!(
            "rescanned {}: {} files, aggregate {}",
            self.dir.display(),
            fresh.len(),
            fresh.aggregate_digest()
        );
        Ok(fresh)
    }
}

/// Build an inventory of the regular files directly inside `dir`.
pub fn scan_directory(dir: &Path) -> io::Result<FileInventory> {
    let mut records = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let name = match entry.file_name().into_string() {
            Ok(name) => match validate_file_name(&name) {
                Ok(()) => name,
                Err(e) => {
                    tracing::warn!("skipping entry: {}", e);
                    continue;
                }
            },
            Err(raw) => {
                tracing::warn!("skipping {:?}: name is not valid UTF-8", raw);
                continue;
            }
        };

        let path = entry.path();
        let digest = hash_file(&path)?.to_base64();
        records.push(FileRecord { name, path, digest });
    }

    Ok(FileInventory::from_records(records))
}

/// SHA-512 of a file's content, read in bounded blocks.
pub fn hash_file(path: &Path) -> io::Result<Sha512Digest> {
    let mut file = File::open(path)?;
    let mut hasher = ContentHasher::new();
    let mut block = vec![0u8; limits::MAX_CHUNK_LEN];

    loop {
        let n = file.read(&mut block)?;
        if n == 0 {
            break;
        }
        hasher.update(&block[..n]);
    }

    Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_AGGREGATE: &str =
        "z4PhNX7vuL3xVChQ1m2AB9Yg5AULVxXcg/SpIdNs6c5H0NE8XYXysP+DGNKHfuwvY7kxvUdBeoGlODJ6+SfaPg==";

    #[test]
    fn test_open_creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("managed");

        let inventory = Inventory::open(&dir).unwrap();

        assert!(dir.is_dir());
        assert!(inventory.snapshot().is_empty());
        assert_eq!(inventory.snapshot().aggregate_digest(), EMPTY_AGGREGATE);
    }

    #[test]
    fn test_single_file_aggregate() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.txt"), b"hello world").unwrap();

        let inventory = Inventory::open(tmp.path()).unwrap();
        let snapshot = inventory.snapshot();

        assert_eq!(
            snapshot.get("a.txt").unwrap().digest,
            "MJ7MSJwS1utMxA9QyQLytNDtd+5RGnx6m808qG1M2G+YndNbxf9JlnDaNCVbRbDP2DDoH2Bdz33FVC6TrpzXbw=="
        );
        assert_eq!(
            snapshot.aggregate_digest(),
            "lnJ2NklEQdoS4xT4iA1AlmZCIrK6tWtikjTxluoI9DuYYFPQn/bvi3JMIY73/gLIAHqFt93H4Z0QuTYNdm2tLQ=="
        );
    }

    #[test]
    fn test_rescan_is_stable() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a"), b"alpha").unwrap();
        fs::write(tmp.path().join("b"), b"beta").unwrap();

        let inventory = Inventory::open(tmp.path()).unwrap();
        let first = inventory.snapshot();
        let second = inventory.rescan().unwrap();

        assert_eq!(first.aggregate_digest(), second.aggregate_digest());
        assert_eq!(*first, *second);
    }

    #[test]
    fn test_rescan_picks_up_changes() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a"), b"alpha").unwrap();
        let inventory = Inventory::open(tmp.path()).unwrap();
        let before = inventory.snapshot();

        fs::write(tmp.path().join("b"), b"beta").unwrap();
        inventory.rescan().unwrap();

        let after = inventory.snapshot();
        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 2);
        assert_ne!(before.aggregate_digest(), after.aggregate_digest());
    }

    #[test]
    fn test_subdirectories_are_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();
        fs::write(tmp.path().join("nested").join("inner"), b"x").unwrap();
        fs::write(tmp.path().join("top"), b"y").unwrap();

        let inventory = Inventory::open(tmp.path()).unwrap();
        let names: Vec<String> = inventory
            .snapshot()
            .records()
            .map(|r| r.name.clone())
            .collect();
        assert_eq!(names, vec!["top".to_string()]);
    }

    #[test]
    fn test_untransferable_names_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("stop"), b"x").unwrap();
        fs::write(tmp.path().join("back\\slash"), b"y").unwrap();
        fs::write(tmp.path().join("ok"), b"z").unwrap();

        let inventory = Inventory::open(tmp.path()).unwrap();
        assert_eq!(inventory.snapshot().len(), 1);
        assert!(inventory.snapshot().get("ok").is_some());
    }

    #[test]
    fn test_failed_rescan_keeps_previous_inventory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("managed");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("a"), b"alpha").unwrap();
        let inventory = Inventory::open(&dir).unwrap();
        let before = inventory.snapshot();

        fs::remove_dir_all(&dir).unwrap();
        assert!(inventory.rescan().is_err());

        assert_eq!(*inventory.snapshot(), *before);
    }

    #[test]
    fn test_hash_file_spans_blocks() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("big");
        let content = vec![7u8; limits::MAX_CHUNK_LEN * 2 + 17];
        fs::write(&path, &content).unwrap();

        assert_eq!(hash_file(&path).unwrap(), Sha512Digest::hash(&content));
    }

    #[test]
    fn test_overlapping_rescans_publish_latest() {
        let tmp = tempfile::tempdir().unwrap();
        let inventory = Inventory::open(tmp.path()).unwrap();

        std::thread::scope(|scope| {
            for i in 0..8 {
                let inventory = &inventory;
                let dir = tmp.path();
                scope.spawn(move || {
                    fs::write(dir.join(format!("f{}", i)), vec![i as u8; 4096]).unwrap();
                    inventory.rescan().unwrap();
                });
            }
        });

        // Every writer rescanned after its own write, so the last scan
        // to publish saw all eight files.
        assert_eq!(inventory.snapshot().len(), 8);
        assert_eq!(*inventory.snapshot(), scan_directory(tmp.path()).unwrap());
    }
}
