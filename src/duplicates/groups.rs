//! Sort-and-scan grouping of fingerprinted files.
//!
//! # Overview
//!
//! [`group`] stable-sorts fingerprinted entries by fingerprint (ties broken by
//! path so the result is deterministic), then walks the sorted sequence once:
//! the first entry starts a group, and every later entry starts a group iff
//! its fingerprint differs from the entry just before it. Sorting is what
//! turns "same fingerprint" into "adjacent", so each group is exactly one
//! contiguous run.
//!
//! The resulting [`GroupedSequence`] exposes the derived views without
//! sorting again:
//!
//! - [`GroupedSequence::representatives`]: first entry of every group
//! - [`GroupedSequence::duplicates`]: every entry of groups with 2+ members
//!
//! # Example
//!
//! ```
//! use uniquify::duplicates::{group, FingerprintedEntry};
//! use uniquify::scanner::FileEntry;
//!
//! let entries = vec![
//!     FingerprintedEntry::new(FileEntry::new("/b.jpg"), [1u8; 32]),
//!     FingerprintedEntry::new(FileEntry::new("/a.jpg"), [1u8; 32]),
//!     FingerprintedEntry::new(FileEntry::new("/c.jpg"), [2u8; 32]),
//! ];
//!
//! let grouped = group(entries);
//! assert_eq!(grouped.group_count(), 2);
//! assert_eq!(grouped.representatives().len(), 2);
//! assert_eq!(grouped.representatives()[0].entry.path.to_str(), Some("/a.jpg"));
//! assert_eq!(grouped.duplicates().len(), 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::scanner::{hash_to_hex, FileEntry, Fingerprint};

/// A candidate paired with its content fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintedEntry {
    /// The fingerprinted file
    pub entry: FileEntry,
    /// Content fingerprint
    pub fingerprint: Fingerprint,
}

impl FingerprintedEntry {
    /// Pair an entry with its fingerprint.
    #[must_use]
    pub fn new(entry: FileEntry, fingerprint: Fingerprint) -> Self {
        Self { entry, fingerprint }
    }

    /// Fingerprint as hexadecimal string.
    #[must_use]
    pub fn fingerprint_hex(&self) -> String {
        hash_to_hex(&self.fingerprint)
    }
}

/// A fingerprinted entry tagged with whether it opens a new group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedEntry {
    /// The fingerprinted file
    pub entry: FingerprintedEntry,
    /// True for the first entry of each group
    pub starts_group: bool,
}

/// Entries sorted by fingerprint, each tagged with its group-start flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedSequence {
    entries: Vec<TaggedEntry>,
}

/// Sort by fingerprint (path as tie-break) and tag group boundaries.
#[must_use]
pub fn group(mut fingerprinted: Vec<FingerprintedEntry>) -> GroupedSequence {
    fingerprinted.sort_by(|a, b| {
        a.fingerprint
            .cmp(&b.fingerprint)
            .then_with(|| a.entry.path.as_os_str().cmp(b.entry.path.as_os_str()))
    });

    let mut previous: Option<Fingerprint> = None;
    let entries = fingerprinted
        .into_iter()
        .map(|entry| {
            let starts_group = previous != Some(entry.fingerprint);
            previous = Some(entry.fingerprint);
            TaggedEntry {
                entry,
                starts_group,
            }
        })
        .collect();

    GroupedSequence { entries }
}

impl GroupedSequence {
    /// All tagged entries in sorted order.
    #[must_use]
    pub fn entries(&self) -> &[TaggedEntry] {
        &self.entries
    }

    /// Number of fingerprinted entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over groups as contiguous slices.
    pub fn groups(&self) -> impl Iterator<Item = &[TaggedEntry]> + '_ {
        let mut rest = self.entries.as_slice();
        std::iter::from_fn(move || {
            if rest.is_empty() {
                return None;
            }
            let end = rest[1..]
                .iter()
                .position(|e| e.starts_group)
                .map_or(rest.len(), |p| p + 1);
            let (head, tail) = rest.split_at(end);
            rest = tail;
            Some(head)
        })
    }

    /// Number of groups (= number of representatives).
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.entries.iter().filter(|e| e.starts_group).count()
    }

    /// Number of groups with two or more members.
    #[must_use]
    pub fn duplicate_group_count(&self) -> usize {
        self.groups().filter(|g| g.len() > 1).count()
    }

    /// Entries that would be dropped by placement (all copies minus one per group).
    #[must_use]
    pub fn redundant_count(&self) -> usize {
        self.len() - self.group_count()
    }

    /// The first entry of every group, in sorted order.
    #[must_use]
    pub fn representatives(&self) -> Vec<&FingerprintedEntry> {
        self.entries
            .iter()
            .filter(|e| e.starts_group)
            .map(|e| &e.entry)
            .collect()
    }

    /// Every entry of every group with two or more members, still tagged.
    #[must_use]
    pub fn duplicates(&self) -> Vec<&TaggedEntry> {
        self.groups()
            .filter(|g| g.len() > 1)
            .flat_map(|g| g.iter())
            .collect()
    }

    /// Owned copy of the representatives, ready to be grouped again.
    #[must_use]
    pub fn into_representatives(self) -> Vec<FingerprintedEntry> {
        self.entries
            .into_iter()
            .filter(|e| e.starts_group)
            .map(|e| e.entry)
            .collect()
    }
}
