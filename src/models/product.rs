use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a product is being sold
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SellingType {
    /// Fixed-price listing, any quantity
    Sale,
    /// Timed auction, single unit, price set by competitive bidding
    Auction,
}

/// A marketplace listing.
///
/// Fixed-price listings use `price_cents`; auctions track a running high
/// bid in `current_bid_cents`, which starts at `starting_bid_cents` and is
/// strictly increased by each accepted bid. `version` is the optimistic
/// concurrency token bumped on every mutation; `seq` is the store-assigned
/// insertion counter that gives listings a deterministic order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub selling_type: SellingType,
    /// Unit price for fixed-price sales, in cents
    pub price_cents: i64,
    /// Opening bid for auctions, in cents
    pub starting_bid_cents: i64,
    /// Running high bid; equal to `starting_bid_cents` until the first bid
    pub current_bid_cents: i64,
    /// Auction expiry; only meaningful when `selling_type` is `Auction`
    pub end_date: Option<DateTime<Utc>>,
    /// Customer currently winning the auction, if anyone has bid
    pub highest_bidder: Option<Uuid>,
    pub remaining_unit: u32,
    pub sold_unit: u32,
    /// Free-text labels, deduplicated, order-irrelevant
    pub tags: Vec<String>,
    /// The customer that listed this product
    pub seller: Uuid,
    /// Listing visibility; cleared on unlist, stock exhaustion or settlement
    pub is_active: bool,
    pub version: u64,
    pub seq: u64,
}

/// Parameters for creating a new listing
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub selling_type: SellingType,
    pub price_cents: i64,
    pub starting_bid_cents: i64,
    pub end_date: Option<DateTime<Utc>>,
    pub remaining_unit: u32,
    pub tags: Vec<String>,
    pub seller: Uuid,
}

impl Product {
    /// Creates a listing from its creation parameters.
    ///
    /// Tags are deduplicated preserving first occurrence. `seq` is assigned
    /// by the store on insert.
    pub fn new(params: NewProduct) -> Self {
        let mut tags = Vec::new();
        for tag in params.tags {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        Self {
            id: Uuid::new_v4(),
            name: params.name,
            description: params.description,
            selling_type: params.selling_type,
            price_cents: params.price_cents,
            starting_bid_cents: params.starting_bid_cents,
            current_bid_cents: params.starting_bid_cents,
            end_date: params.end_date,
            highest_bidder: None,
            remaining_unit: params.remaining_unit,
            sold_unit: 0,
            tags,
            seller: params.seller,
            is_active: true,
            version: 0,
            seq: 0,
        }
    }

    /// Whether this listing is sold by auction
    pub fn is_auction(&self) -> bool {
        self.selling_type == SellingType::Auction
    }

    /// Whether the auction has expired at `now`.
    ///
    /// Always false for fixed-price listings and auctions without an end
    /// date. Both sides of the comparison are UTC.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_auction() && self.end_date.is_some_and(|end| now >= end)
    }
}

/// A single recorded bid. Immutable once placed; bid history is append-only
/// in placement order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bid {
    pub id: Uuid,
    pub product_id: Uuid,
    pub bidder: Uuid,
    pub amount_cents: i64,
    pub placed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn auction(end: Option<DateTime<Utc>>) -> Product {
        Product::new(NewProduct {
            name: "dog collar".to_string(),
            description: "leather".to_string(),
            selling_type: SellingType::Auction,
            price_cents: 0,
            starting_bid_cents: 500,
            end_date: end,
            remaining_unit: 1,
            tags: vec!["dog".to_string(), "collar".to_string(), "dog".to_string()],
            seller: Uuid::new_v4(),
        })
    }

    #[test]
    fn test_new_product_dedups_tags() {
        let product = auction(None);
        assert_eq!(product.tags, vec!["dog".to_string(), "collar".to_string()]);
        assert_eq!(product.current_bid_cents, 500);
        assert!(product.highest_bidder.is_none());
        assert!(product.is_active);
    }

    #[test]
    fn test_expiry_requires_end_date() {
        let product = auction(None);
        assert!(!product.is_expired(Utc::now()));
    }

    #[test]
    fn test_expiry_boundary_inclusive() {
        let end = Utc::now();
        let product = auction(Some(end));
        assert!(product.is_expired(end));
        assert!(!product.is_expired(end - Duration::seconds(1)));
    }

    #[test]
    fn test_sale_never_expires() {
        let mut product = auction(Some(Utc::now() - Duration::hours(1)));
        product.selling_type = SellingType::Sale;
        assert!(!product.is_expired(Utc::now()));
    }
}
