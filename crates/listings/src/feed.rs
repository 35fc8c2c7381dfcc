//! Paged offer feed ("Load more").

use tokio::sync::watch;

use housebazaar_core::Listing;
use housebazaar_retry::{ExecutionState, ExecutionTracker};

use crate::backend::{ListingCursor, ListingPage};

/// Listings fetched per offers page.
pub const OFFERS_PAGE_SIZE: usize = 10;

/// Accumulated offer listings of one offers page view.
///
/// Owns the execution state of its fetches so the view can show a loading
/// indicator or the last error while a page is in flight.
#[derive(Debug, Default)]
pub struct OfferFeed {
    listings: Vec<Listing>,
    next: Option<ListingCursor>,
    loaded: bool,
    pub(crate) tracker: ExecutionTracker,
}

impl OfferFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    /// Whether another page may exist.
    pub fn has_more(&self) -> bool {
        !self.loaded || self.next.is_some()
    }

    pub(crate) fn cursor(&self) -> Option<ListingCursor> {
        self.next
    }

    pub fn state(&self) -> ExecutionState {
        self.tracker.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ExecutionState> {
        self.tracker.subscribe()
    }

    /// Start over with the first page.
    pub(crate) fn replace(&mut self, page: ListingPage) -> usize {
        self.listings.clear();
        self.extend(page)
    }

    /// Append the next page.
    pub(crate) fn extend(&mut self, page: ListingPage) -> usize {
        let added = page.listings.len();
        self.listings.extend(page.listings);
        self.next = page.next;
        self.loaded = true;
        added
    }
}
