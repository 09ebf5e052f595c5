//! Engine Integration Tests
//!
//! End-to-end runs of the public API against an in-memory store:
//! - Tree building over a multi-level device hierarchy
//! - Chunked reads across many series
//! - Configuration loaded from `exoquery.toml`

mod common;

mod config_file;
mod device_tree;
mod series_reads;
