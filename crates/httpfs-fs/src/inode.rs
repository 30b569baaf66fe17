//! Inode-number bookkeeping.
//!
//! The façade addresses everything by path while the kernel bridge
//! speaks inode numbers; this table owns the mapping. Numbers are
//! allocated on first sight and are stable for the session only, since
//! the remote side has no inode concept to anchor them to.

use std::collections::HashMap;

/// Root inode number (FUSE convention).
pub const ROOT_INO: u64 = 1;

/// Bidirectional inode ↔ path map.
pub struct PathTable {
    paths: HashMap<u64, String>,
    inos: HashMap<String, u64>,
    next_ino: u64,
}

impl PathTable {
    /// Creates a table holding only the root.
    pub fn new() -> Self {
        let mut table = Self {
            paths: HashMap::new(),
            inos: HashMap::new(),
            next_ino: ROOT_INO + 1,
        };
        table.paths.insert(ROOT_INO, "/".to_string());
        table.inos.insert("/".to_string(), ROOT_INO);
        table
    }

    /// Returns the path mapped to `ino`.
    pub fn path(&self, ino: u64) -> Option<&str> {
        self.paths.get(&ino).map(String::as_str)
    }

    /// Returns the inode number for `path`, allocating one if unseen.
    pub fn assign(&mut self, path: &str) -> u64 {
        if let Some(&ino) = self.inos.get(path) {
            return ino;
        }
        let ino = self.next_ino;
        self.next_ino += 1;
        self.paths.insert(ino, path.to_string());
        self.inos.insert(path.to_string(), ino);
        ino
    }

    /// Joins a directory path and a basename.
    pub fn join(dir: &str, name: &str) -> String {
        if dir.ends_with('/') {
            format!("{}{}", dir, name)
        } else {
            format!("{}/{}", dir, name)
        }
    }
}

impl Default for PathTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_preassigned() {
        let table = PathTable::new();
        assert_eq!(table.path(ROOT_INO), Some("/"));
    }

    #[test]
    fn test_assign_is_stable() {
        let mut table = PathTable::new();
        let a = table.assign("/a");
        let b = table.assign("/b");
        assert_ne!(a, b);
        assert_eq!(table.assign("/a"), a);
        assert_eq!(table.path(a), Some("/a"));
    }

    #[test]
    fn test_join() {
        assert_eq!(PathTable::join("/", "a"), "/a");
        assert_eq!(PathTable::join("/a", "b"), "/a/b");
        assert_eq!(PathTable::join("/a/", "b"), "/a/b");
    }
}
