use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;

use super::clock::Clock;
use super::notifier::Notifier;
use super::settlement::{self, SettleSkip};
use crate::store::MemoryStore;

/// One pass over the active auctions: every listing whose end date has
/// passed is handed to settlement.
///
/// Per-product failures are logged and the pass continues, so one listing
/// in a bad state can never stall the others. The function has no state of
/// its own; tests invoke it directly instead of waiting on the interval.
pub async fn run_auction_scan(store: &MemoryStore, notifier: &dyn Notifier, clock: &dyn Clock) {
    let expired = store.expired_active_auctions(clock.now()).await;
    if expired.is_empty() {
        return;
    }
    tracing::debug!(expired = expired.len(), "Auction scan found expired listings");

    for product in expired {
        match settlement::settle(store, notifier, clock, product.id).await {
            Ok(_) => {}
            // Another settlement got there first; nothing to do
            Err(SettleSkip::NotActive) => {}
            Err(skip) => {
                tracing::warn!(
                    product_id = %product.id,
                    reason = %skip,
                    "Skipping settlement for expired auction"
                );
            }
        }
    }
}

/// The recurring background task that drives auction expiry.
///
/// `start` spawns a single interval loop; starting an already running
/// clock is a logged no-op so the scan cadence can never be duplicated.
pub struct AuctionClock {
    store: Arc<MemoryStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    scan_interval: Duration,
    started: AtomicBool,
}

impl AuctionClock {
    pub fn new(
        store: Arc<MemoryStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        scan_interval: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            scan_interval,
            started: AtomicBool::new(false),
        }
    }

    /// Spawns the recurring scan. Runs for the life of the process.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::warn!("Auction clock already running; ignoring second start");
            return;
        }

        let store = Arc::clone(&self.store);
        let notifier = Arc::clone(&self.notifier);
        let clock = Arc::clone(&self.clock);
        let scan_interval = self.scan_interval;

        tokio::spawn(async move {
            tracing::info!(interval_secs = scan_interval.as_secs(), "Auction clock started");
            let mut ticker = interval(scan_interval);
            loop {
                ticker.tick().await;
                run_auction_scan(&store, notifier.as_ref(), clock.as_ref()).await;
            }
        });
    }
}
