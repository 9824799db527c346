//! Remote file metadata
//!
//! `RemoteFile` is the value object every listing and stat operation
//! produces. It is a snapshot, not a handle: it owns no remote resources
//! and stays valid after the entry it describes changes or disappears.

use jiff::Timestamp;
use serde::Serialize;

/// Metadata snapshot of one remote directory entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteFile {
    size: u64,
    last_modified: Option<Timestamp>,
    name: String,
}

impl RemoteFile {
    /// Create a new RemoteFile
    pub fn new(size: u64, last_modified: Option<Timestamp>, name: impl Into<String>) -> Self {
        Self {
            size,
            last_modified,
            name: name.into(),
        }
    }

    /// Size in bytes
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Last modification time, when the server reported one
    pub const fn last_modified(&self) -> Option<Timestamp> {
        self.last_modified
    }

    /// Entry name.
    ///
    /// A single path segment for flat listings and stat results; a path
    /// relative to the walk root for recursive walks.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let modified = Timestamp::from_second(1_700_000_000).unwrap();
        let file = RemoteFile::new(4096, Some(modified), "sub/b.txt");

        assert_eq!(file.size(), 4096);
        assert_eq!(file.last_modified(), Some(modified));
        assert_eq!(file.name(), "sub/b.txt");
    }

    #[test]
    fn test_missing_mtime() {
        let file = RemoteFile::new(0, None, "a.txt");
        assert!(file.last_modified().is_none());
    }
}
