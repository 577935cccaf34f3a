//! Local document store boundary for paysync.
//!
//! The sync engine never talks to a database directly. It goes through the
//! [`DocumentStore`] trait, which only offers single-document operations:
//! fetch by id, create, patch by id, and lookup by linked remote id.
//!
//! [`MemoryStore`] is the in-process implementation used by the webhook
//! server and the test suites.

mod error;
mod memory;

use async_trait::async_trait;
use paysync_model::{Document, DocumentPatch, NewDocument};
use paysync_types::{DocumentId, RemoteId};

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;

/// CRUD access to the local collections.
///
/// Every method is a single bounded operation; implementations must apply an
/// `update` atomically so concurrent patches never interleave field by field.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches a document by id.
    async fn get(&self, collection: &str, id: DocumentId) -> StorageResult<Option<Document>>;

    /// Creates a document and returns it with its assigned id.
    async fn create(&self, collection: &str, doc: NewDocument) -> StorageResult<Document>;

    /// Applies a patch to an existing document and returns the result.
    async fn update(
        &self,
        collection: &str,
        id: DocumentId,
        patch: DocumentPatch,
    ) -> StorageResult<Document>;

    /// Finds the document linked to a remote resource.
    async fn find_by_remote_id(
        &self,
        collection: &str,
        remote_id: &RemoteId,
    ) -> StorageResult<Option<Document>>;
}
