//! Backend-as-a-service abstraction (document store + object storage).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use housebazaar_core::{Listing, ListingId, UserId};
use housebazaar_retry::AttemptError;

/// Position in the newest-first offer ordering.
///
/// Points at the last listing of a page; the next page starts after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingCursor {
    pub timestamp: DateTime<Utc>,
    pub id: ListingId,
}

impl ListingCursor {
    pub fn of(listing: &Listing) -> Self {
        Self {
            timestamp: listing.timestamp,
            id: listing.id,
        }
    }
}

/// One page of listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingPage {
    pub listings: Vec<Listing>,
    /// Cursor of the last listing, when more listings follow.
    pub next: Option<ListingCursor>,
}

/// An image file picked in the edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Backend error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("{0}")]
    Unavailable(String),
    #[error("listing not found: {0}")]
    NotFound(ListingId),
    #[error("upload failed: {0}")]
    Upload(String),
}

/// Every backend failure is an environment problem and is retried.
impl From<BackendError> for AttemptError {
    fn from(err: BackendError) -> Self {
        AttemptError::transient(err.to_string())
    }
}

/// Remote listing storage.
///
/// Implementations talk to the hosted document database and object storage.
/// Calls may fail transiently; callers wrap them in a retry executor.
#[async_trait::async_trait]
pub trait ListingBackend: Send + Sync + 'static {
    /// Get a listing by ID.
    async fn get_listing(&self, id: ListingId) -> Result<Option<Listing>, BackendError>;

    /// Replace a stored listing.
    async fn update_listing(&self, listing: Listing) -> Result<(), BackendError>;

    /// Store a new listing.
    async fn create_listing(&self, listing: Listing) -> Result<(), BackendError>;

    /// Delete a listing.
    async fn delete_listing(&self, id: ListingId) -> Result<(), BackendError>;

    /// Listings owned by `user`, newest first.
    async fn listings_by_user(&self, user: UserId) -> Result<Vec<Listing>, BackendError>;

    /// The `limit` newest listings of any kind.
    async fn recent_listings(&self, limit: usize) -> Result<Vec<Listing>, BackendError>;

    /// Offer listings, newest first, starting after `after`.
    async fn offers_page(
        &self,
        after: Option<ListingCursor>,
        limit: usize,
    ) -> Result<ListingPage, BackendError>;

    /// Store an image under `file_name`; returns its download URL.
    async fn upload_image(&self, file_name: String, bytes: Vec<u8>) -> Result<String, BackendError>;
}
