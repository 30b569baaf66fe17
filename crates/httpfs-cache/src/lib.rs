//! httpfs Cache - bounded maps with least-recently-used eviction.
//!
//! A cache is sized by a `max_size`/`elasticity` pair: it may grow to
//! `max_size + elasticity` entries, and the insert that crosses that hard
//! limit prunes the least recently touched entries until `max_size`
//! remain. Two variants are provided:
//! - [`LruCache`]: unsynchronized, for single-thread use
//! - [`SharedLruCache`]: mutex-guarded, safe to share across threads

#![warn(missing_docs, rust_2018_idioms)]

pub mod lru;
pub mod shared;

pub use lru::{EvictionCallback, LruCache};
pub use shared::SharedLruCache;
