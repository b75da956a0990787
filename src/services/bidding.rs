use thiserror::Error;
use uuid::Uuid;

use super::clock::Clock;
use super::notifier::{Notification, Notifier};
use crate::store::{MemoryStore, StoreError};

/// Optimistic commit attempts before giving up on a heavily contended
/// listing
const MAX_BID_RETRIES: u32 = 5;

/// Why a bid was refused. Each variant carries a distinct, user-facing
/// reason; no state is mutated on rejection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BidRejection {
    #[error("this listing is no longer active")]
    InactiveListing,

    #[error("this product is not an auction listing")]
    NotAnAuction,

    #[error("bid must be strictly greater than the current bid of {current_cents} cents")]
    TooLow { current_cents: i64 },

    #[error("sellers cannot bid on their own listing")]
    SelfBid,
}

/// Errors from `place_bid`
#[derive(Debug, Error)]
pub enum BidError {
    #[error("product not found")]
    ProductNotFound,

    #[error("bidder not found")]
    BidderNotFound,

    #[error(transparent)]
    Rejected(#[from] BidRejection),

    /// The optimistic commit kept losing races; the caller may retry
    #[error("bid could not be committed after {attempts} attempts")]
    Contention { attempts: u32 },

    #[error("storage error: {0}")]
    Store(StoreError),
}

/// A successfully recorded bid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidAccepted {
    pub product_id: Uuid,
    pub bidder: Uuid,
    pub amount_cents: i64,
    /// The customer whose bid was displaced, if anyone had bid before
    pub outbid: Option<Uuid>,
}

/// Validates and records a bid on an auction listing.
///
/// Preconditions are checked in order, each with its own rejection: the
/// listing must be active, must be an auction, the amount must be strictly
/// greater than the running high bid, and the bidder must not be the
/// seller. The commit itself is a versioned compare-and-set retried a
/// bounded number of times, so of two racing bids the higher amount always
/// ends up as the final high bid and an equal amount is accepted exactly
/// once. A successful bid notifies the displaced bidder, best-effort.
pub async fn place_bid(
    store: &MemoryStore,
    notifier: &dyn Notifier,
    clock: &dyn Clock,
    product_id: Uuid,
    bidder_id: Uuid,
    amount_cents: i64,
) -> Result<BidAccepted, BidError> {
    if store.customer(bidder_id).await.is_none() {
        return Err(BidError::BidderNotFound);
    }

    for attempt in 1..=MAX_BID_RETRIES {
        let product = store
            .product(product_id)
            .await
            .ok_or(BidError::ProductNotFound)?;

        if !product.is_active {
            return Err(BidRejection::InactiveListing.into());
        }
        if !product.is_auction() {
            return Err(BidRejection::NotAnAuction.into());
        }
        if amount_cents <= product.current_bid_cents {
            return Err(BidRejection::TooLow {
                current_cents: product.current_bid_cents,
            }
            .into());
        }
        if bidder_id == product.seller {
            return Err(BidRejection::SelfBid.into());
        }

        match store
            .commit_bid(
                product_id,
                product.version,
                bidder_id,
                amount_cents,
                clock.now(),
            )
            .await
        {
            Ok(outbid) => {
                tracing::info!(
                    product_id = %product_id,
                    bidder = %bidder_id,
                    amount_cents,
                    "Bid accepted"
                );
                if let Some(previous) = outbid {
                    notifier
                        .notify(Notification::Outbid {
                            customer: previous,
                            product: product_id,
                            amount_cents,
                        })
                        .await;
                }
                return Ok(BidAccepted {
                    product_id,
                    bidder: bidder_id,
                    amount_cents,
                    outbid,
                });
            }
            Err(StoreError::VersionConflict) => {
                tracing::debug!(
                    product_id = %product_id,
                    attempt,
                    "Bid commit lost a race; revalidating"
                );
                continue;
            }
            Err(StoreError::BidTooLow { current_cents }) => {
                return Err(BidRejection::TooLow { current_cents }.into());
            }
            Err(StoreError::NotFound(_)) => return Err(BidError::ProductNotFound),
            Err(other) => return Err(BidError::Store(other)),
        }
    }

    tracing::warn!(
        product_id = %product_id,
        bidder = %bidder_id,
        "Bid abandoned after repeated commit conflicts"
    );
    Err(BidError::Contention {
        attempts: MAX_BID_RETRIES,
    })
}
