//! Article storage abstraction for the lectern content server.
//!
//! This crate provides a [`Storage`] trait that decouples the page renderer from
//! the place article files live. Content is organised in **groups**: each group is
//! a flat collection of HTML article files plus an optional `res/` directory of
//! images.
//!
//! - [`Storage`] trait with `groups()`, `read()`, `list()` and `resource_dir()`
//! - [`FsStorage`] reads groups from the sub-directories of a pages directory
//! - [`MockStorage`] for testing (behind `mock` feature flag), with read counters
//!
//! A missing article is reported as [`StorageErrorKind::NotFound`], distinct from
//! every other failure, so callers can cache "not found" without caching I/O errors.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use lectern_storage::{FsStorage, Storage};
//!
//! let storage = FsStorage::new(PathBuf::from("pages"));
//! for group in storage.groups()? {
//!     let articles = storage.list(&group)?;
//!     tracing::info!(group = %group, count = articles.len(), "found group");
//! }
//! # Ok::<(), lectern_storage::StorageError>(())
//! ```

mod fs;
#[cfg(feature = "mock")]
mod mock;
mod storage;

pub use fs::FsStorage;
#[cfg(feature = "mock")]
pub use mock::MockStorage;
pub use storage::{Storage, StorageError, StorageErrorKind, validate_file_name};
