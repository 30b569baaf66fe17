//! httpfs Core - Data model and parsing for the HTTP-backed filesystem.
//!
//! This crate provides:
//! - Path decomposition and percent-encoding of request targets
//! - POSIX stat-shaped file metadata (`FileMeta`)
//! - Autoindex JSON parsing into directory snapshots (`DirEntry`)
//! - HTTP date handling

#![warn(missing_docs, rust_2018_idioms)]

pub mod autoindex;
pub mod encode;
pub mod meta;
pub mod path;
pub mod time;

pub use autoindex::{parse_autoindex, DirEntry, ParseError};
pub use encode::percent_encode;
pub use meta::FileMeta;
pub use path::split_path;
pub use time::{epoch_secs, parse_http_date};
