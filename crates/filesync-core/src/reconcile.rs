//! Inventory reconciliation.
//!
//! Both sides are reduced to `(name, digest)` pairs sorted by name, then
//! digest. The files to send are the server pairs that do not occur on
//! the client side: a missing file or a changed digest yields a pair the
//! client lacks. The result keeps the sorted order, so identical inputs
//! always transfer in the same order.

use std::cmp::Ordering;

use crate::inventory::{FileInventory, FileRecord};

/// Compute which server records the client needs.
pub fn files_to_send<'a>(
    server: &'a FileInventory,
    client: &[(String, String)],
) -> Vec<&'a FileRecord> {
    let mut theirs: Vec<(&str, &str)> = client
        .iter()
        .map(|(name, digest)| (name.as_str(), digest.as_str()))
        .collect();
    theirs.sort_unstable();

    // Inventory records are already ordered by unique name, hence by pair.
    let ours = server.records();

    let mut needed = Vec::new();
    let mut theirs = theirs.into_iter().peekable();
    for record in ours {
        let pair = (record.name.as_str(), record.digest.as_str());
        let mut matched = false;
        while let Some(&other) = theirs.peek() {
            match other.cmp(&pair) {
                Ordering::Less => {
                    theirs.next();
                }
                Ordering::Equal => {
                    theirs.next();
                    matched = true;
                    break;
                }
                Ordering::Greater => break,
            }
        }
        if !matched {
            needed.push(record);
        }
    }
    needed
}
