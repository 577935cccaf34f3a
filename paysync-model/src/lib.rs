//! Document and sync-rule model for paysync.
//!
//! Defines the types every other crate agrees on:
//! - [`Document`]: a local record with flat JSON data, an optional remote id
//!   and a sync status
//! - [`SyncRule`] / [`FieldMapping`]: the declared contract between one local
//!   collection and one remote resource type
//! - [`FieldName`]: a validated flat property name; nested paths cannot be
//!   represented
//! - [`to_remote`] / [`to_local`]: the pure field mapper
//!
//! Nothing in this crate performs I/O.

mod document;
mod mapping;
mod rule;

pub use document::{Document, DocumentData, DocumentPatch, NewDocument, SyncStatus};
pub use mapping::{to_local, to_remote};
pub use rule::{FieldMapping, FieldName, RuleError, SyncRule};
