//! Listing operations of the HouseBazaar client.
//!
//! Every network call goes through [`housebazaar_retry::RetryExecutor`]: fetching
//! and saving listings, image uploads, a user's properties, the recommended
//! slider and the offers feed. The backend-as-a-service itself sits
//! behind the [`ListingBackend`] trait.

pub mod backend;
pub mod feed;
pub mod memory;
pub mod service;

pub use backend::{BackendError, ImageUpload, ListingBackend, ListingCursor, ListingPage};
pub use feed::{OFFERS_PAGE_SIZE, OfferFeed};
pub use memory::InMemoryListingBackend;
pub use service::{ListingService, SLIDER_SIZE, ServiceError};
