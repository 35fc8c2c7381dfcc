use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};

use housebazaar_core::{Listing, ListingDraft, ListingType, UserId, UserIdentity, offer_listings};
use housebazaar_listings::{
    ImageUpload, InMemoryListingBackend, ListingService, OFFERS_PAGE_SIZE, OfferFeed,
    ServiceError,
};
use housebazaar_retry::{NotificationLevel, RecordingSink, RetryExecutor, RetryPolicy};

struct Harness {
    backend: Arc<InMemoryListingBackend>,
    sink: Arc<RecordingSink>,
    service: ListingService<InMemoryListingBackend, Arc<RecordingSink>>,
}

impl Harness {
    fn new() -> Self {
        let backend = InMemoryListingBackend::arc();
        let sink = Arc::new(RecordingSink::new());
        let service = ListingService::new(
            backend.clone(),
            RetryExecutor::new(RetryPolicy::default(), sink.clone()),
        );
        Self {
            backend,
            sink,
            service,
        }
    }

    async fn seed_offers(&self, owner: UserId, count: i64) {
        for i in 0..count {
            let draft = ListingDraft {
                name: format!("Offer {i}"),
                listing_type: ListingType::Sale,
                offer: true,
                regular_price: 10_000,
                discounted_price: Some(9_000),
                ..ListingDraft::default()
            };
            let listing =
                Listing::create(owner, draft, vec![], Utc::now() - ChronoDuration::minutes(i))
                    .unwrap();
            self.backend.insert(listing).await;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn offers_feed_pages_until_exhausted() {
    let h = Harness::new();
    h.seed_offers(UserId::new(), 23).await;

    let mut feed = OfferFeed::new();
    assert!(feed.has_more());

    assert_eq!(h.service.load_offers(&mut feed).await.unwrap(), OFFERS_PAGE_SIZE);
    assert_eq!(h.service.load_more_offers(&mut feed).await.unwrap(), OFFERS_PAGE_SIZE);
    assert_eq!(h.service.load_more_offers(&mut feed).await.unwrap(), 3);
    assert!(!feed.has_more());

    let calls = h.backend.calls();
    assert_eq!(h.service.load_more_offers(&mut feed).await.unwrap(), 0);
    assert_eq!(h.backend.calls(), calls);

    let names: Vec<&str> = feed.listings().iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names.len(), 23);
    assert_eq!(names[0], "Offer 0");
    assert_eq!(names[22], "Offer 22");
}

#[tokio::test(start_paused = true)]
async fn feed_state_reports_outage_and_recovers_on_reload() {
    let h = Harness::new();
    h.seed_offers(UserId::new(), 2).await;
    let mut feed = OfferFeed::new();
    let rx = feed.subscribe();

    h.backend.fail_next(3, "server error");
    let err = h.service.load_offers(&mut feed).await.unwrap_err();

    assert_eq!(err, ServiceError::Exhausted("server error".to_string()));
    let state = rx.borrow().clone();
    assert!(!state.is_loading);
    assert_eq!(state.last_error.as_deref(), Some("server error"));
    assert_eq!(state.attempt_count, 3);
    assert_eq!(
        h.sink.messages(NotificationLevel::Error),
        vec!["Failed after 3 attempts: server error"]
    );
    assert_eq!(h.sink.messages(NotificationLevel::Info).len(), 2);

    assert_eq!(h.service.load_offers(&mut feed).await.unwrap(), 2);
    assert_eq!(feed.state().last_error, None);
    assert_eq!(offer_listings(feed.listings()).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn created_listing_shows_up_for_its_owner_only() {
    let h = Harness::new();
    let owner = UserIdentity::new(UserId::new()).with_email("owner@example.com");
    let other = UserIdentity::new(UserId::new());

    let draft = ListingDraft {
        name: "Loft".to_string(),
        location: "3 Canal Row".to_string(),
        regular_price: 1_200,
        ..ListingDraft::default()
    };
    h.backend.fail_next(1, "network down");
    let created = h
        .service
        .create_listing(&owner, draft, vec![ImageUpload::new("loft.jpg", vec![9; 16])])
        .await
        .unwrap();
    assert_eq!(created.img_urls.len(), 1);

    let mine = h.service.user_listings(Some(&owner)).await.unwrap();
    assert_eq!(mine, vec![created.clone()]);
    assert!(h.service.user_listings(Some(&other)).await.unwrap().is_empty());

    let err = h.service.delete_listing(created.id, &other).await.unwrap_err();
    assert_eq!(err, ServiceError::NotOwner(created.id));
}

#[tokio::test(start_paused = true)]
async fn too_many_images_are_rejected_up_front() {
    let h = Harness::new();
    let owner = UserIdentity::new(UserId::new());
    let images = (0..7)
        .map(|i| ImageUpload::new(format!("{i}.jpg"), vec![1]))
        .collect();

    let err = h
        .service
        .create_listing(
            &owner,
            ListingDraft {
                name: "Villa".to_string(),
                ..ListingDraft::default()
            },
            images,
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Max 6 images");
    assert_eq!(h.backend.calls(), 0);
}
