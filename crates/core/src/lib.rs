//! Core vocabulary for the quarry document store.
//!
//! This crate holds the types shared across the workspace:
//! - [`StoreError`] / [`ErrorCode`] / [`Result`]: the unified error model
//! - [`Path`]: logical document paths (and partition patterns via [`WILDCARD`])
//! - value plumbing: JSON round-trip coercion, pointer navigation, and
//!   patch application over `serde_json::Value`
//!
//! The storage engine, transactions, and the store itself live in
//! `quarry-store`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod path;
pub mod value;

pub use error::{ErrorCode, Result, StoreError};
pub use path::{Path, WILDCARD};
pub use value::{apply_patch, insert_at, roundtrip, value_at, PatchOp};

/// JSON value type used throughout the store.
pub use serde_json::Value;
