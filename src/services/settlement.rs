use thiserror::Error;
use uuid::Uuid;

use super::clock::Clock;
use super::notifier::{Notification, Notifier};
use crate::store::{MemoryStore, SettledAuction, StoreError};

/// How a settlement attempt concluded
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// The winner's cart received a quantity-1 line at the final price
    Sold {
        winner: Uuid,
        price_cents: i64,
        order_id: Uuid,
    },
    /// The auction expired with no bids; the listing was closed unsold
    ClosedUnsold,
}

/// Why a settlement attempt was skipped without touching the listing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettleSkip {
    #[error("product not found")]
    NotFound,

    /// Already settled or manually unlisted; repeat calls land here
    #[error("listing is not active")]
    NotActive,

    #[error("listing is not an auction")]
    NotAnAuction,

    #[error("auction has not ended yet")]
    NotExpired,
}

/// Settles one expired auction listing.
///
/// The store primitive deactivates the listing first and refuses repeat
/// calls, so settlement happens at most once per product no matter how
/// often the clock fires. Winner and seller notifications go out after the
/// commit and are best-effort; an auction that never attracted a bid is
/// closed unsold with a warning and no order.
pub async fn settle(
    store: &MemoryStore,
    notifier: &dyn Notifier,
    clock: &dyn Clock,
    product_id: Uuid,
) -> Result<Settlement, SettleSkip> {
    let product = store.product(product_id).await.ok_or(SettleSkip::NotFound)?;
    if !product.is_expired(clock.now()) {
        if !product.is_auction() {
            return Err(SettleSkip::NotAnAuction);
        }
        return Err(SettleSkip::NotExpired);
    }

    match store.settle_auction(product_id, clock.now()).await {
        Ok(SettledAuction::Sold {
            winner,
            seller,
            price_cents,
            order_id,
        }) => {
            tracing::info!(
                product_id = %product_id,
                winner = %winner,
                price_cents,
                "Auction settled"
            );
            notifier
                .notify(Notification::AuctionWon {
                    customer: winner,
                    product: product_id,
                    price_cents,
                })
                .await;
            notifier
                .notify(Notification::ListingSold {
                    seller,
                    product: product_id,
                    price_cents,
                })
                .await;
            Ok(Settlement::Sold {
                winner,
                price_cents,
                order_id,
            })
        }
        Ok(SettledAuction::ClosedUnsold { seller }) => {
            tracing::warn!(
                product_id = %product_id,
                seller = %seller,
                "Auction expired with no bids; listing closed unsold"
            );
            Ok(Settlement::ClosedUnsold)
        }
        Err(StoreError::NotActive) => Err(SettleSkip::NotActive),
        Err(StoreError::NotAnAuction) => Err(SettleSkip::NotAnAuction),
        Err(_) => Err(SettleSkip::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Customer, NewProduct, Product, SellingType};
    use crate::services::clock::ManualClock;
    use crate::services::notifier::{LogNotifier, MockNotifier};
    use chrono::{Duration, Utc};

    async fn customer(store: &MemoryStore, name: &str) -> Uuid {
        store
            .insert_customer(Customer::new(
                name.to_string(),
                format!("{name}@example.com"),
            ))
            .await
            .id
    }

    async fn auction_ending(store: &MemoryStore, seller: Uuid, end: chrono::DateTime<Utc>) -> Uuid {
        store
            .insert_product(Product::new(NewProduct {
                name: "bird cage".to_string(),
                description: String::new(),
                selling_type: SellingType::Auction,
                price_cents: 0,
                starting_bid_cents: 2_000,
                end_date: Some(end),
                remaining_unit: 1,
                tags: vec!["bird".to_string()],
                seller,
            }))
            .await
            .id
    }

    #[tokio::test]
    async fn test_won_auction_creates_order_line_and_notifies_both_parties() {
        let store = MemoryStore::new();
        let seller = customer(&store, "seller").await;
        let alice = customer(&store, "alice").await;
        let start = Utc::now();
        let clock = ManualClock::new(start);
        let product_id = auction_ending(&store, seller, start + Duration::hours(1)).await;
        store
            .commit_bid(product_id, 0, alice, 3_000, start)
            .await
            .unwrap();

        clock.advance(Duration::hours(2));

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(move |n| {
                matches!(n, Notification::AuctionWon { customer, price_cents: 3_000, .. } if *customer == alice)
            })
            .times(1)
            .return_const(());
        notifier
            .expect_notify()
            .withf(move |n| {
                matches!(n, Notification::ListingSold { seller: s, price_cents: 3_000, .. } if *s == seller)
            })
            .times(1)
            .return_const(());

        let settlement = settle(&store, &notifier, &clock, product_id).await.unwrap();
        assert!(matches!(
            settlement,
            Settlement::Sold {
                winner,
                price_cents: 3_000,
                ..
            } if winner == alice
        ));

        let product = store.product(product_id).await.unwrap();
        assert!(!product.is_active);
        let cart = store.open_order(alice).await;
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].product, Some(product_id));
        assert_eq!(cart.items[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_settle_twice_skips_the_second_time() {
        let store = MemoryStore::new();
        let seller = customer(&store, "seller").await;
        let alice = customer(&store, "alice").await;
        let start = Utc::now();
        let clock = ManualClock::new(start + Duration::hours(2));
        let product_id = auction_ending(&store, seller, start).await;
        store
            .commit_bid(product_id, 0, alice, 3_000, start)
            .await
            .unwrap();

        settle(&store, &LogNotifier, &clock, product_id).await.unwrap();
        let err = settle(&store, &LogNotifier, &clock, product_id)
            .await
            .unwrap_err();
        assert_eq!(err, SettleSkip::NotActive);

        // No duplicate order line
        let cart = store.open_order(alice).await;
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_expired_auction_without_bids_closes_unsold() {
        let store = MemoryStore::new();
        let seller = customer(&store, "seller").await;
        let start = Utc::now();
        let clock = ManualClock::new(start + Duration::hours(2));
        let product_id = auction_ending(&store, seller, start).await;

        let mut notifier = MockNotifier::new();
        notifier.expect_notify().never();

        let settlement = settle(&store, &notifier, &clock, product_id).await.unwrap();
        assert_eq!(settlement, Settlement::ClosedUnsold);
        assert!(!store.product(product_id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_running_auction_is_not_settled() {
        let store = MemoryStore::new();
        let seller = customer(&store, "seller").await;
        let start = Utc::now();
        let clock = ManualClock::new(start);
        let product_id = auction_ending(&store, seller, start + Duration::hours(1)).await;

        let err = settle(&store, &LogNotifier, &clock, product_id)
            .await
            .unwrap_err();
        assert_eq!(err, SettleSkip::NotExpired);
        assert!(store.product(product_id).await.unwrap().is_active);
    }
}
