use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::{ListingId, UserId};

/// Upper bound on images attached to one listing.
pub const MAX_IMAGES: usize = 6;

/// Whether a listing is offered for rent or for sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Rent,
    Sale,
}

impl core::fmt::Display for ListingType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ListingType::Rent => f.write_str("rent"),
            ListingType::Sale => f.write_str("sale"),
        }
    }
}

/// Map coordinates of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lng: f64,
}

/// A stored property listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: ListingId,
    pub user_ref: UserId,
    pub name: String,
    #[serde(rename = "type")]
    pub listing_type: ListingType,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub parking: bool,
    pub furnished: bool,
    pub location: String,
    pub geolocation: GeoLocation,
    pub offer: bool,
    pub regular_price: u64, // Price in smallest currency unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discounted_price: Option<u64>,
    pub img_urls: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl Listing {
    /// Create a listing owned by `owner` from a validated draft.
    pub fn create(
        owner: UserId,
        draft: ListingDraft,
        img_urls: Vec<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        draft.validate(img_urls.len())?;
        let mut listing = Self {
            id: ListingId::new(),
            user_ref: owner,
            name: String::new(),
            listing_type: draft.listing_type,
            bedrooms: 0,
            bathrooms: 0,
            parking: false,
            furnished: false,
            location: String::new(),
            geolocation: GeoLocation::default(),
            offer: false,
            regular_price: 0,
            discounted_price: None,
            img_urls: Vec::new(),
            timestamp: now,
        };
        listing.apply(draft, img_urls, now);
        Ok(listing)
    }

    /// Replace the editable fields with a validated draft.
    ///
    /// Ownership and identity are preserved; the timestamp is refreshed.
    pub fn apply_draft(
        &mut self,
        draft: ListingDraft,
        img_urls: Vec<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        draft.validate(img_urls.len())?;
        self.apply(draft, img_urls, now);
        Ok(())
    }

    fn apply(&mut self, draft: ListingDraft, img_urls: Vec<String>, now: DateTime<Utc>) {
        self.name = draft.name.trim().to_string();
        self.listing_type = draft.listing_type;
        self.bedrooms = draft.bedrooms;
        self.bathrooms = draft.bathrooms;
        self.parking = draft.parking;
        self.furnished = draft.furnished;
        self.location = draft.location;
        self.geolocation = draft.geolocation;
        self.offer = draft.offer;
        self.regular_price = draft.regular_price;
        // Non-offer listings never carry a discount.
        self.discounted_price = if draft.offer {
            draft.discounted_price
        } else {
            None
        };
        self.img_urls = img_urls;
        self.timestamp = now;
    }

    /// Price a buyer actually pays.
    pub fn effective_price(&self) -> u64 {
        match (self.offer, self.discounted_price) {
            (true, Some(discounted)) => discounted,
            _ => self.regular_price,
        }
    }
}

/// The editable subset of a listing, as submitted by the edit form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub listing_type: ListingType,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub parking: bool,
    pub furnished: bool,
    pub location: String,
    pub geolocation: GeoLocation,
    pub offer: bool,
    pub regular_price: u64,
    pub discounted_price: Option<u64>,
}

impl Default for ListingDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            listing_type: ListingType::Rent,
            bedrooms: 1,
            bathrooms: 1,
            parking: false,
            furnished: false,
            location: String::new(),
            geolocation: GeoLocation::default(),
            offer: false,
            regular_price: 0,
            discounted_price: None,
        }
    }
}

impl ListingDraft {
    /// Prefill a draft from a stored listing (edit form initial state).
    pub fn from_listing(listing: &Listing) -> Self {
        Self {
            name: listing.name.clone(),
            listing_type: listing.listing_type,
            bedrooms: listing.bedrooms,
            bathrooms: listing.bathrooms,
            parking: listing.parking,
            furnished: listing.furnished,
            location: listing.location.clone(),
            geolocation: listing.geolocation,
            offer: listing.offer,
            regular_price: listing.regular_price,
            discounted_price: listing.discounted_price,
        }
    }

    /// Check the rules the edit form enforces before anything is uploaded.
    pub fn validate(&self, image_count: usize) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("Listing name is required"));
        }

        if self.offer {
            match self.discounted_price {
                None => {
                    return Err(DomainError::validation(
                        "Discounted price is required for offers",
                    ));
                }
                Some(discounted) if discounted >= self.regular_price => {
                    return Err(DomainError::validation(
                        "Discounted price needs to be less than regular price",
                    ));
                }
                Some(_) => {}
            }
        }

        if image_count > MAX_IMAGES {
            return Err(DomainError::validation(format!("Max {MAX_IMAGES} images")));
        }

        Ok(())
    }
}

/// Listings currently on offer.
pub fn offer_listings(listings: &[Listing]) -> Vec<&Listing> {
    listings.iter().filter(|l| l.offer).collect()
}

/// Listings of one category (rent or sale).
pub fn category_listings(listings: &[Listing], category: ListingType) -> Vec<&Listing> {
    listings
        .iter()
        .filter(|l| l.listing_type == category)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ListingDraft {
        ListingDraft {
            name: "Seaside flat".to_string(),
            listing_type: ListingType::Sale,
            location: "1 Harbour Road".to_string(),
            regular_price: 250_000,
            ..ListingDraft::default()
        }
    }

    #[test]
    fn offer_requires_discount_below_regular_price() {
        let mut d = draft();
        d.offer = true;
        d.discounted_price = Some(250_000);

        let err = d.validate(0).unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("Discounted price needs to be less than regular price")
        );

        d.discounted_price = Some(240_000);
        assert!(d.validate(0).is_ok());
    }

    #[test]
    fn offer_without_discount_is_rejected() {
        let mut d = draft();
        d.offer = true;
        assert!(d.validate(0).is_err());
    }

    #[test]
    fn caps_image_count() {
        assert!(draft().validate(MAX_IMAGES).is_ok());
        let err = draft().validate(MAX_IMAGES + 1).unwrap_err();
        assert_eq!(err.to_string(), "Max 6 images");
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut d = draft();
        d.name = "   ".to_string();
        assert!(d.validate(0).is_err());
    }

    #[test]
    fn discount_is_dropped_when_not_on_offer() {
        let owner = UserId::new();
        let mut d = draft();
        d.discounted_price = Some(1);

        let listing = Listing::create(owner, d, vec![], Utc::now()).unwrap();
        assert_eq!(listing.discounted_price, None);
        assert_eq!(listing.effective_price(), 250_000);
    }

    #[test]
    fn apply_draft_keeps_identity_and_owner() {
        let owner = UserId::new();
        let mut listing = Listing::create(owner, draft(), vec![], Utc::now()).unwrap();
        let id = listing.id;

        let mut edit = ListingDraft::from_listing(&listing);
        edit.offer = true;
        edit.discounted_price = Some(200_000);
        listing
            .apply_draft(edit, vec!["https://img/1".to_string()], Utc::now())
            .unwrap();

        assert_eq!(listing.id, id);
        assert_eq!(listing.user_ref, owner);
        assert_eq!(listing.effective_price(), 200_000);
        assert_eq!(listing.img_urls.len(), 1);
    }

    #[test]
    fn rejected_draft_leaves_listing_untouched() {
        let mut listing = Listing::create(UserId::new(), draft(), vec![], Utc::now()).unwrap();
        let before = listing.clone();

        let mut edit = ListingDraft::from_listing(&listing);
        edit.name = String::new();
        assert!(listing.apply_draft(edit, vec![], Utc::now()).is_err());
        assert_eq!(listing, before);
    }

    #[test]
    fn selectors_filter_by_offer_and_category() {
        let owner = UserId::new();
        let rent = Listing::create(
            owner,
            ListingDraft {
                listing_type: ListingType::Rent,
                ..draft()
            },
            vec![],
            Utc::now(),
        )
        .unwrap();
        let sale_offer = Listing::create(
            owner,
            ListingDraft {
                offer: true,
                discounted_price: Some(1_000),
                ..draft()
            },
            vec![],
            Utc::now(),
        )
        .unwrap();
        let all = vec![rent.clone(), sale_offer.clone()];

        assert_eq!(offer_listings(&all), vec![&sale_offer]);
        assert_eq!(category_listings(&all, ListingType::Rent), vec![&rent]);
        assert_eq!(category_listings(&all, ListingType::Sale), vec![&sale_offer]);
    }

    #[test]
    fn serializes_type_field_like_the_document_store() {
        let listing = Listing::create(UserId::new(), draft(), vec![], Utc::now()).unwrap();
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["type"], "sale");
        assert!(json.get("discountedPrice").is_none());
        assert!(json.get("userRef").is_some());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: an offer validates exactly when its discount is below the regular price.
            #[test]
            fn offer_validation_matches_price_order(
                regular in 1u64..10_000_000,
                discounted in 0u64..10_000_000,
                images in 0usize..=MAX_IMAGES,
            ) {
                let d = ListingDraft {
                    offer: true,
                    regular_price: regular,
                    discounted_price: Some(discounted),
                    ..draft()
                };
                prop_assert_eq!(d.validate(images).is_ok(), discounted < regular);
            }
        }
    }
}
