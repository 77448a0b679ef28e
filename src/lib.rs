//! Memoir: a versioned memory-block store for tutoring agents.
//!
//! Memoir keeps one store per user: a set of named markdown documents
//! ("memory blocks") with a frontmatter header, full commit-backed version
//! history, and a propose/approve workflow for edits coming from autonomous
//! agents.
//!
//! # Architecture
//!
//! - **Blocks** ([`core::blocks`]): working copies at
//!   `{base}/{user}/memory-blocks/{label}.md`, append-only commit log in the
//!   user's `memory.db`. Every write is exactly one new version.
//! - **Pending diffs** ([`core::diffs`], [`core::apply`]): agents call
//!   [`core::apply::propose_edit`]; a reviewer calls
//!   [`core::apply::approve_diff`] or [`core::apply::reject_diff`]. At most
//!   one diff per block is pending; newer proposals supersede older ones.
//! - **Frontmatter** ([`core::frontmatter`]): total parse of the
//!   `---`-delimited metadata header; malformed headers degrade to an empty
//!   map with the whole document as body.
//! - **Schemas** ([`core::schema`]): declarative field schemas drive the
//!   compact `[FIELD_NAME] value` structured-record codec.
//!
//! # Concurrency
//!
//! Every operation is synchronous, blocking filesystem and SQLite work.
//! Memoir takes no locks: the caller must serialize writers per user (reads
//! are side-effect-free). Embedders on an async runtime should offload calls
//! to a blocking worker.
//!
//! # Example
//!
//! ```no_run
//! use memoir::core::{apply, blocks, diffs::DiffOperation, store::UserStore};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), memoir::core::error::MemoirError> {
//! let store = UserStore::new(Path::new("/var/lib/memoir"), "alice")?;
//! blocks::init(&store)?;
//!
//! blocks::write_block(&store, "journey", "status: onboarding", "initial", "system", None)?;
//!
//! let diff = apply::propose_edit(
//!     &store,
//!     "journey",
//!     "tutor",
//!     DiffOperation::FullReplace,
//!     "status: module-1",
//!     "Student completed onboarding",
//!     None,
//! )?;
//! apply::approve_diff(&store, &diff.id)?;
//!
//! assert_eq!(
//!     blocks::read_block_body(&store, "journey")?.as_deref(),
//!     Some("status: module-1"),
//! );
//! # Ok(())
//! # }
//! ```

pub mod core;
