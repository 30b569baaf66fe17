//! httpfs Filesystem - the read-only FUSE view of a remote directory
//! tree.
//!
//! - `server`: the HTTP-backed metadata and data façade
//! - `vfs`: the FUSE request adapter
//! - `inode`: inode-number bookkeeping for the path-addressed façade
//! - `mount`: the mount helper

#![warn(missing_docs, rust_2018_idioms)]

pub mod inode;
pub mod mount;
pub mod server;
pub mod vfs;

pub use mount::{mount, MountConfig};
pub use server::{FsConfig, HttpFs};
pub use vfs::HttpFsDriver;

use thiserror::Error;

/// Filesystem façade errors.
#[derive(Debug, Error)]
pub enum FsError {
    /// The HTTP transfer failed
    #[error("Transfer failed: {0}")]
    Transfer(#[from] httpfs_client::ClientError),

    /// The autoindex response could not be parsed
    #[error("Bad directory listing: {0}")]
    BadListing(#[from] httpfs_core::ParseError),

    /// The server returned more data than the requested range
    #[error("Server returned {got} bytes for a {want}-byte range")]
    OversizeResponse {
        /// Bytes actually received
        got: usize,
        /// Bytes the range asked for
        want: u64,
    },

    /// Mounting failed
    #[error("Mount failed: {0}")]
    Mount(String),
}
