//! `housebazaar-core` — listing domain building blocks.
//!
//! This crate contains **pure domain** primitives (no network or storage
//! concerns): identifiers, the domain error model, listing records and the
//! validation rules the edit form enforces before a save.

pub mod error;
pub mod id;
pub mod identity;
pub mod listing;

pub use error::{DomainError, DomainResult};
pub use id::{ListingId, UserId};
pub use identity::UserIdentity;
pub use listing::{
    GeoLocation, Listing, ListingDraft, ListingType, MAX_IMAGES, category_listings,
    offer_listings,
};
