//! In-memory listing backend for tests/dev.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::RwLock;

use housebazaar_core::{Listing, ListingId, UserId};

use crate::backend::{BackendError, ListingBackend, ListingCursor, ListingPage};

/// In-memory backend with optional injected latency and transient faults.
#[derive(Debug, Default)]
pub struct InMemoryListingBackend {
    listings: RwLock<HashMap<ListingId, Listing>>,
    images: RwLock<HashMap<String, Vec<u8>>>,
    latency: Mutex<Duration>,
    pending_faults: AtomicU32,
    fault_message: Mutex<String>,
    calls: AtomicU64,
}

impl InMemoryListingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Delay every call by `latency` before it touches the data.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(latency);
        self
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = latency;
    }

    /// Make the next `count` calls fail with `BackendError::Unavailable(message)`.
    pub fn fail_next(&self, count: u32, message: impl Into<String>) {
        *self
            .fault_message
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = message.into();
        self.pending_faults.store(count, Ordering::SeqCst);
    }

    /// Number of backend calls made so far (including failed ones).
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Seed a listing without going through the call accounting.
    pub async fn insert(&self, listing: Listing) {
        self.listings.write().await.insert(listing.id, listing);
    }

    pub async fn image(&self, url: &str) -> Option<Vec<u8>> {
        let key = url.strip_prefix(IMAGE_URL_PREFIX)?;
        self.images.read().await.get(key).cloned()
    }

    async fn enter(&self) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let faulted = self
            .pending_faults
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if faulted {
            let message = self
                .fault_message
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            return Err(BackendError::Unavailable(message));
        }
        Ok(())
    }
}

const IMAGE_URL_PREFIX: &str = "memory://images/";

/// Newest first; ties broken by id so paging is stable.
fn newest_first(listing: &Listing) -> Reverse<(chrono::DateTime<chrono::Utc>, ListingId)> {
    Reverse((listing.timestamp, listing.id))
}

#[async_trait::async_trait]
impl ListingBackend for InMemoryListingBackend {
    async fn get_listing(&self, id: ListingId) -> Result<Option<Listing>, BackendError> {
        self.enter().await?;
        Ok(self.listings.read().await.get(&id).cloned())
    }

    async fn update_listing(&self, listing: Listing) -> Result<(), BackendError> {
        self.enter().await?;
        let mut listings = self.listings.write().await;
        if !listings.contains_key(&listing.id) {
            return Err(BackendError::NotFound(listing.id));
        }
        listings.insert(listing.id, listing);
        Ok(())
    }

    async fn create_listing(&self, listing: Listing) -> Result<(), BackendError> {
        self.enter().await?;
        self.listings.write().await.insert(listing.id, listing);
        Ok(())
    }

    async fn delete_listing(&self, id: ListingId) -> Result<(), BackendError> {
        self.enter().await?;
        match self.listings.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(BackendError::NotFound(id)),
        }
    }

    async fn listings_by_user(&self, user: UserId) -> Result<Vec<Listing>, BackendError> {
        self.enter().await?;
        let mut owned: Vec<Listing> = self
            .listings
            .read()
            .await
            .values()
            .filter(|l| l.user_ref == user)
            .cloned()
            .collect();
        owned.sort_by_key(newest_first);
        Ok(owned)
    }

    async fn recent_listings(&self, limit: usize) -> Result<Vec<Listing>, BackendError> {
        self.enter().await?;
        let mut all: Vec<Listing> = self.listings.read().await.values().cloned().collect();
        all.sort_by_key(newest_first);
        all.truncate(limit);
        Ok(all)
    }

    async fn offers_page(
        &self,
        after: Option<ListingCursor>,
        limit: usize,
    ) -> Result<ListingPage, BackendError> {
        self.enter().await?;
        let mut offers: Vec<Listing> = self
            .listings
            .read()
            .await
            .values()
            .filter(|l| l.offer)
            .cloned()
            .collect();
        offers.sort_by_key(newest_first);

        let start = match after {
            Some(cursor) => {
                let key = Reverse((cursor.timestamp, cursor.id));
                offers.partition_point(|l| newest_first(l) <= key)
            }
            None => 0,
        };
        let end = start.saturating_add(limit).min(offers.len());
        let listings = offers[start..end].to_vec();
        let next = if end < offers.len() {
            listings.last().map(ListingCursor::of)
        } else {
            None
        };

        Ok(ListingPage { listings, next })
    }

    async fn upload_image(&self, file_name: String, bytes: Vec<u8>) -> Result<String, BackendError> {
        self.enter().await?;
        if bytes.is_empty() {
            return Err(BackendError::Upload(format!("{file_name} is empty")));
        }
        let url = format!("{IMAGE_URL_PREFIX}{file_name}");
        self.images.write().await.insert(file_name, bytes);
        Ok(url)
    }
}
