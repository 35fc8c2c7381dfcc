//! Listing operations wrapped in bounded retries.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use housebazaar_core::{DomainError, Listing, ListingDraft, ListingId, UserId, UserIdentity};
use housebazaar_retry::{
    AttemptError, FALLBACK_MESSAGE, NotificationSink, RetryExecutor, TracingSink,
};

use crate::backend::{ImageUpload, ListingBackend, ListingCursor, ListingPage};
use crate::feed::{OFFERS_PAGE_SIZE, OfferFeed};

/// Number of listings shown in the "Recommended" slider.
pub const SLIDER_SIZE: usize = 5;

/// Listing service error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The request was rejected before any network call.
    #[error("{0}")]
    Invalid(#[from] DomainError),
    #[error("You can not edit that listing")]
    NotOwner(ListingId),
    #[error("Images not uploaded: {0}")]
    ImagesNotUploaded(String),
    /// Every attempt failed; carries the last error message.
    #[error("{0}")]
    Exhausted(String),
}

/// Listing calls of the client, each run through a [`RetryExecutor`].
///
/// Input validation and ownership checks happen outside the retried
/// operations, so a rejected form is reported at once instead of after
/// every attempt.
pub struct ListingService<B, N = TracingSink> {
    backend: Arc<B>,
    executor: RetryExecutor<N>,
}

impl<B: ListingBackend> ListingService<B, TracingSink> {
    /// Service with the default retry policy, notifying through tracing.
    pub fn with_defaults(backend: Arc<B>) -> Self {
        Self::new(backend, RetryExecutor::default())
    }
}

impl<B, N> ListingService<B, N>
where
    B: ListingBackend,
    N: NotificationSink,
{
    pub fn new(backend: Arc<B>, executor: RetryExecutor<N>) -> Self {
        Self { backend, executor }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn executor(&self) -> &RetryExecutor<N> {
        &self.executor
    }

    /// Fetch one listing.
    ///
    /// A missing listing fails the attempt with "Listing not found" and is
    /// retried like any other failure.
    #[instrument(skip(self), fields(listing_id = %id))]
    pub async fn fetch_listing(&self, id: ListingId) -> Result<Listing, ServiceError> {
        let backend = self.backend.clone();
        self.run(move || {
            let backend = backend.clone();
            async move {
                let found = backend.get_listing(id).await.map_err(AttemptError::from)?;
                found.ok_or_else(|| AttemptError::from(DomainError::not_found()))
            }
        })
        .await
    }

    /// Fetch a listing for editing by `user`; refuses listings of other users.
    #[instrument(skip(self, user), fields(listing_id = %id, user = %user.uid))]
    pub async fn fetch_for_edit(
        &self,
        id: ListingId,
        user: &UserIdentity,
    ) -> Result<Listing, ServiceError> {
        let listing = self.fetch_listing(id).await?;
        if !user.owns(listing.user_ref) {
            warn!(owner = %listing.user_ref, "edit refused, not the owner");
            return Err(ServiceError::NotOwner(id));
        }
        Ok(listing)
    }

    /// Save an edited listing.
    ///
    /// New images replace the stored ones; with no new images the stored
    /// image URLs are kept.
    #[instrument(skip(self, user, draft, images), fields(listing_id = %id, images = images.len()))]
    pub async fn save_listing(
        &self,
        id: ListingId,
        user: &UserIdentity,
        draft: ListingDraft,
        images: Vec<ImageUpload>,
    ) -> Result<Listing, ServiceError> {
        draft.validate(images.len())?;

        let mut listing = self.fetch_for_edit(id, user).await?;
        let img_urls = if images.is_empty() {
            listing.img_urls.clone()
        } else {
            self.upload_images(user.uid, images).await?
        };
        listing.apply_draft(draft, img_urls, Utc::now())?;

        let backend = self.backend.clone();
        let stored = listing.clone();
        self.run(move || {
            let backend = backend.clone();
            let listing = stored.clone();
            async move { backend.update_listing(listing).await.map_err(AttemptError::from) }
        })
        .await?;

        info!("Listing saved");
        Ok(listing)
    }

    /// Create a new listing owned by `user`.
    #[instrument(skip(self, user, draft, images), fields(user = %user.uid, images = images.len()))]
    pub async fn create_listing(
        &self,
        user: &UserIdentity,
        draft: ListingDraft,
        images: Vec<ImageUpload>,
    ) -> Result<Listing, ServiceError> {
        draft.validate(images.len())?;

        let img_urls = self.upload_images(user.uid, images).await?;
        let listing = Listing::create(user.uid, draft, img_urls, Utc::now())?;

        let backend = self.backend.clone();
        let stored = listing.clone();
        self.run(move || {
            let backend = backend.clone();
            let listing = stored.clone();
            async move { backend.create_listing(listing).await.map_err(AttemptError::from) }
        })
        .await?;

        info!(listing_id = %listing.id, "Listing created");
        Ok(listing)
    }

    /// Delete a listing owned by `user`.
    #[instrument(skip(self, user), fields(listing_id = %id, user = %user.uid))]
    pub async fn delete_listing(
        &self,
        id: ListingId,
        user: &UserIdentity,
    ) -> Result<(), ServiceError> {
        self.fetch_for_edit(id, user).await?;

        let backend = self.backend.clone();
        self.run(move || {
            let backend = backend.clone();
            async move { backend.delete_listing(id).await.map_err(AttemptError::from) }
        })
        .await?;

        info!("Successfully deleted listing");
        Ok(())
    }

    /// Listings of the signed-in user, newest first.
    ///
    /// Without a user there is nothing to fetch.
    #[instrument(skip(self, user), fields(user = ?user.map(|u| u.uid)))]
    pub async fn user_listings(
        &self,
        user: Option<&UserIdentity>,
    ) -> Result<Vec<Listing>, ServiceError> {
        let Some(user) = user else {
            return Ok(Vec::new());
        };

        let backend = self.backend.clone();
        let uid = user.uid;
        self.run(move || {
            let backend = backend.clone();
            async move { backend.listings_by_user(uid).await.map_err(AttemptError::from) }
        })
        .await
    }

    /// The [`SLIDER_SIZE`] most recent listings, for the home page slider.
    #[instrument(skip(self))]
    pub async fn recent_listings(&self) -> Result<Vec<Listing>, ServiceError> {
        let backend = self.backend.clone();
        self.run(move || {
            let backend = backend.clone();
            async move { backend.recent_listings(SLIDER_SIZE).await.map_err(AttemptError::from) }
        })
        .await
    }

    /// Load the first offers page into `feed`, replacing its contents.
    ///
    /// Returns the number of listings loaded.
    #[instrument(skip(self, feed))]
    pub async fn load_offers(&self, feed: &mut OfferFeed) -> Result<usize, ServiceError> {
        let page = self.fetch_offers_page(feed, None).await?;
        Ok(feed.replace(page))
    }

    /// Append the next offers page to `feed`.
    ///
    /// Does nothing once the feed has reached the end.
    #[instrument(skip(self, feed))]
    pub async fn load_more_offers(&self, feed: &mut OfferFeed) -> Result<usize, ServiceError> {
        if !feed.has_more() {
            return Ok(0);
        }
        let cursor = feed.cursor();
        let page = self.fetch_offers_page(feed, cursor).await?;
        Ok(feed.extend(page))
    }

    async fn fetch_offers_page(
        &self,
        feed: &mut OfferFeed,
        after: Option<ListingCursor>,
    ) -> Result<ListingPage, ServiceError> {
        let backend = self.backend.clone();
        let page = self
            .executor
            .execute_with_retry(&mut feed.tracker, move || {
                let backend = backend.clone();
                async move {
                    backend
                        .offers_page(after, OFFERS_PAGE_SIZE)
                        .await
                        .map_err(AttemptError::from)
                }
            })
            .await;

        page.ok_or_else(|| {
            ServiceError::Exhausted(
                feed.tracker
                    .last_error()
                    .unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
            )
        })
    }

    /// Upload all images as one retried operation; returns their URLs in order.
    ///
    /// File names are fixed before the first attempt, so a retry overwrites
    /// rather than duplicates what an earlier attempt stored.
    async fn upload_images(
        &self,
        owner: UserId,
        images: Vec<ImageUpload>,
    ) -> Result<Vec<String>, ServiceError> {
        if images.is_empty() {
            return Ok(Vec::new());
        }

        let uploads: Arc<Vec<(String, Vec<u8>)>> = Arc::new(
            images
                .into_iter()
                .map(|image| (format!("{owner}-{}-{}", image.name, Uuid::now_v7()), image.bytes))
                .collect(),
        );

        let backend = self.backend.clone();
        self.executor
            .execute(move || {
                let backend = backend.clone();
                let uploads = uploads.clone();
                async move {
                    let mut urls = Vec::with_capacity(uploads.len());
                    for (file_name, bytes) in uploads.iter() {
                        let url = backend
                            .upload_image(file_name.clone(), bytes.clone())
                            .await
                            .map_err(AttemptError::from)?;
                        urls.push(url);
                    }
                    Ok::<_, AttemptError>(urls)
                }
            })
            .await
            .into_result()
            .map_err(ServiceError::ImagesNotUploaded)
    }

    async fn run<T, F, Fut>(&self, operation: F) -> Result<T, ServiceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AttemptError>> + Send + 'static,
        T: Send + 'static,
    {
        self.executor
            .execute(operation)
            .await
            .into_result()
            .map_err(ServiceError::Exhausted)
    }
}
