//! Autoindex response parsing.
//!
//! Directory listings arrive as a JSON array of `{name, type, mtime,
//! size}` objects. Parsing turns one response into a [`DirEntry`]
//! snapshot keyed by basename.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::meta::FileMeta;
use crate::time::{epoch_secs, parse_http_date};

/// Errors produced while parsing an autoindex document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document is not a well-formed JSON listing
    #[error("Malformed autoindex response: {0}")]
    Json(#[from] serde_json::Error),
}

/// A snapshot of one directory as served by the remote autoindex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entries keyed by basename, byte-wise ordered
    pub entries: BTreeMap<String, FileMeta>,
    /// Wall-clock second the fetch completed
    pub fetch_time: i64,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    mtime: String,
    #[serde(default)]
    size: u64,
}

/// Parses an autoindex JSON document into a directory snapshot.
///
/// `type == "directory"` marks a directory; any other value is a regular
/// file. Duplicate names keep the last occurrence, unknown fields are
/// ignored, and an unparseable `mtime` degrades to the epoch. Names that
/// cannot be basenames (`.`, `..`, anything containing a slash) are
/// dropped.
pub fn parse_autoindex(body: &[u8]) -> Result<DirEntry, ParseError> {
    let listing: Vec<RawEntry> = serde_json::from_slice(body)?;

    let mut entries = BTreeMap::new();
    for item in listing {
        if item.name == "." || item.name == ".." || item.name.contains('/') {
            continue;
        }
        let mtime = parse_http_date(&item.mtime).unwrap_or(0);
        let meta = if item.kind == "directory" {
            FileMeta::directory(mtime)
        } else {
            FileMeta::file(item.size, mtime)
        };
        entries.insert(item.name, meta);
    }

    Ok(DirEntry {
        entries,
        fetch_time: epoch_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"[
        {"name":"a","type":"directory","mtime":"Mon, 01 Jan 2024 00:00:00 UTC"},
        {"name":"b.txt","type":"file","size":11,"mtime":"Mon, 01 Jan 2024 00:00:00 UTC"}
    ]"#;

    #[test]
    fn test_parse_listing() {
        let entry = parse_autoindex(LISTING.as_bytes()).unwrap();
        assert_eq!(entry.entries.len(), 2);

        let dir = &entry.entries["a"];
        assert!(dir.is_dir());
        assert_eq!(dir.size, 0);

        let file = &entry.entries["b.txt"];
        assert!(file.is_file());
        assert_eq!(file.size, 11);
        assert_eq!(file.mtime, file.atime);
        assert_eq!(file.mtime, file.ctime);
    }

    #[test]
    fn test_fetch_time_is_now() {
        let before = epoch_secs();
        let entry = parse_autoindex(b"[]").unwrap();
        assert!(entry.fetch_time >= before);
        assert!(entry.fetch_time <= epoch_secs());
    }

    #[test]
    fn test_malformed_json_fails() {
        assert!(parse_autoindex(b"not json").is_err());
        assert!(parse_autoindex(b"{\"name\":\"x\"}").is_err());
        assert!(parse_autoindex(b"<html>404</html>").is_err());
    }

    #[test]
    fn test_duplicate_names_last_wins() {
        let body = r#"[
            {"name":"x","type":"file","size":1,"mtime":"Mon, 01 Jan 2024 00:00:00 UTC"},
            {"name":"x","type":"file","size":2,"mtime":"Mon, 01 Jan 2024 00:00:00 UTC"}
        ]"#;
        let entry = parse_autoindex(body.as_bytes()).unwrap();
        assert_eq!(entry.entries.len(), 1);
        assert_eq!(entry.entries["x"].size, 2);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let body = r#"[{"name":"f","type":"file","size":3,"mtime":"","owner":"root"}]"#;
        let entry = parse_autoindex(body.as_bytes()).unwrap();
        assert_eq!(entry.entries["f"].size, 3);
        assert_eq!(entry.entries["f"].mtime, 0);
    }

    #[test]
    fn test_dot_entries_dropped() {
        let body = r#"[
            {"name":".","type":"directory","mtime":""},
            {"name":"..","type":"directory","mtime":""},
            {"name":"sub/evil","type":"file","size":1,"mtime":""},
            {"name":"ok","type":"file","size":1,"mtime":""}
        ]"#;
        let entry = parse_autoindex(body.as_bytes()).unwrap();
        assert_eq!(entry.entries.len(), 1);
        assert!(entry.entries.contains_key("ok"));
    }

    #[test]
    fn test_directory_size_ignored() {
        let body = r#"[{"name":"d","type":"directory","size":999,"mtime":""}]"#;
        let entry = parse_autoindex(body.as_bytes()).unwrap();
        assert_eq!(entry.entries["d"].size, 0);
    }
}
