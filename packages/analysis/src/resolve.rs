//! Stored-content resolution.
//!
//! The engine can be handed content directly or asked to process content by
//! id. Resolution is the seam where a backing store plugs in; lookups are
//! always scoped to an owner so one caller can never process another's
//! content.

use async_trait::async_trait;
use thiserror::Error;

use crate::content::ContentReference;

/// Failure to resolve a stored content id.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No content with this id exists for this owner. Deliberately does not
    /// distinguish "wrong id" from "wrong owner".
    #[error("content not found")]
    NotFound,
}

/// Looks up stored content by id, scoped to an owner.
#[async_trait]
pub trait ContentResolver: Send + Sync {
    async fn resolve(
        &self,
        content_id: &str,
        owner_id: &str,
    ) -> Result<ContentReference, ResolveError>;
}
