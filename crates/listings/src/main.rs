//! Headless HouseBazaar client run against the in-memory backend.
//!
//! Seeds a few listings, then exercises the retried calls the pages make:
//! the offers feed, a user's listings, and an edit. Retry policy comes from
//! `HOUSEBAZAAR_RETRY_*`; `HOUSEBAZAAR_FLAKY=n` makes the first `n` backend
//! calls fail so the retry notifications can be seen.

use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration as ChronoDuration, Utc};

use housebazaar_core::{Listing, ListingDraft, ListingType, UserId, UserIdentity};
use housebazaar_listings::{InMemoryListingBackend, ListingService, OfferFeed};
use housebazaar_retry::{RetryExecutor, RetryPolicy, TracingSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    housebazaar_observability::init();

    let policy = RetryPolicy::from_env().context("invalid retry configuration")?;
    tracing::info!(
        max_attempts = policy.max_attempts(),
        attempt_timeout_ms = policy.attempt_timeout().as_millis() as u64,
        retry_delay_ms = policy.retry_delay().as_millis() as u64,
        "retry policy loaded"
    );

    let backend = InMemoryListingBackend::arc();
    let owner = UserIdentity::new(UserId::new()).with_display_name("Demo owner");
    let seeded = seed(&backend, &owner).await?;

    if let Ok(raw) = std::env::var("HOUSEBAZAAR_FLAKY") {
        let failures: u32 = raw
            .parse()
            .with_context(|| format!("HOUSEBAZAAR_FLAKY must be a number, got {raw:?}"))?;
        backend.fail_next(failures, "network down");
    }

    let service = ListingService::new(backend.clone(), RetryExecutor::new(policy, TracingSink));

    let mut feed = OfferFeed::new();
    service.load_offers(&mut feed).await?;
    while feed.has_more() {
        service.load_more_offers(&mut feed).await?;
    }
    println!("{}", serde_json::to_string_pretty(feed.listings())?);

    let mine = service.user_listings(Some(&owner)).await?;
    tracing::info!(count = mine.len(), "user listings loaded");

    let mut edit = ListingDraft::from_listing(&seeded);
    edit.offer = true;
    edit.discounted_price = Some(seeded.regular_price * 9 / 10);
    let saved = service
        .save_listing(seeded.id, &owner, edit, Vec::new())
        .await?;
    println!("{}", serde_json::to_string_pretty(&saved)?);

    Ok(())
}

async fn seed(backend: &Arc<InMemoryListingBackend>, owner: &UserIdentity) -> anyhow::Result<Listing> {
    let mut first = None;
    for i in 0..12u32 {
        let draft = ListingDraft {
            name: format!("Listing {i}"),
            listing_type: if i % 2 == 0 {
                ListingType::Rent
            } else {
                ListingType::Sale
            },
            bedrooms: 1 + i % 4,
            location: format!("{} Market Street", 10 + i),
            offer: i % 3 != 0,
            regular_price: 1_000 + u64::from(i) * 250,
            discounted_price: Some(900 + u64::from(i) * 200),
            ..ListingDraft::default()
        };
        let listing = Listing::create(
            owner.uid,
            draft,
            Vec::new(),
            Utc::now() - ChronoDuration::hours(i64::from(i)),
        )?;
        first.get_or_insert_with(|| listing.clone());
        backend.insert(listing).await;
    }
    first.context("no listings seeded")
}
