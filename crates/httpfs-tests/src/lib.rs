//! Test harness for httpfs integration testing.

#![warn(rust_2018_idioms)]

pub mod server;

pub use server::{RecordedRequest, Response, TestServer};
