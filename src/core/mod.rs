//! Core modules for Memoir's versioned memory-block store.

pub mod apply;
pub mod audit;
pub mod blocks;
pub mod db;
pub mod diffs;
pub mod error;
pub mod frontmatter;
pub mod schema;
pub mod schemas;
pub mod store;
pub mod time;
