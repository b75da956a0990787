use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

/// Events the marketplace tells customers about.
///
/// These correspond to the emails the storefront sends; delivery is a
/// black box behind the `Notifier` trait.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// A higher bid displaced this customer's bid
    Outbid {
        customer: Uuid,
        product: Uuid,
        amount_cents: i64,
    },
    /// The customer won an auction at the final price
    AuctionWon {
        customer: Uuid,
        product: Uuid,
        price_cents: i64,
    },
    /// A seller's auction listing sold
    ListingSold {
        seller: Uuid,
        product: Uuid,
        price_cents: i64,
    },
}

/// Best-effort notification dispatcher.
///
/// Implementations must never propagate delivery failures; a lost
/// notification must not roll back the bid or settlement that triggered it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification);
}

/// Dispatcher that only records notifications in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: Notification) {
        tracing::info!(notification = ?notification, "Notification dispatched");
    }
}

/// Dispatcher that POSTs each notification as JSON to a configured webhook.
/// Failures are logged and swallowed.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: Notification) {
        let result = self
            .client
            .post(&self.url)
            .json(&notification)
            .send()
            .await;

        match result {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(
                    status = %response.status(),
                    notification = ?notification,
                    "Notification webhook rejected the event"
                );
            }
            Ok(_) => {
                tracing::debug!(notification = ?notification, "Notification delivered");
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    notification = ?notification,
                    "Notification webhook unreachable"
                );
            }
        }
    }
}
