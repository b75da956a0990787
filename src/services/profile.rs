use std::collections::HashMap;

use uuid::Uuid;

use crate::store::MemoryStore;

/// Weight added to every tag of a purchased product, on top of the
/// view-count weights
pub const PURCHASE_WEIGHT: f64 = 2.0;

/// A customer's derived tag-affinity profile: tag name to accumulated
/// weight. Empty for guests and for customers with no history.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TagProfile {
    weights: HashMap<String, f64>,
}

impl TagProfile {
    /// Adds weight to a tag, accumulating with any existing weight
    pub fn add(&mut self, tag: &str, weight: f64) {
        *self.weights.entry(tag.to_string()).or_insert(0.0) += weight;
    }

    /// The accumulated weight for a tag, 0 if absent
    pub fn weight(&self, tag: &str) -> f64 {
        self.weights.get(tag).copied().unwrap_or(0.0)
    }

    /// True when the profile carries no signal (no tags, or all weights
    /// zero)
    pub fn is_empty(&self) -> bool {
        self.weights.values().all(|&w| w == 0.0)
    }

    /// Iterates (tag, weight) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(tag, &w)| (tag.as_str(), w))
    }
}

impl<const N: usize> From<[(&str, f64); N]> for TagProfile {
    fn from(entries: [(&str, f64); N]) -> Self {
        let mut profile = TagProfile::default();
        for (tag, weight) in entries {
            profile.add(tag, weight);
        }
        profile
    }
}

/// Builds a customer's tag profile from their viewing and purchase history.
///
/// Every product view adds its view count to each of the product's tags;
/// every line of a completed order adds `PURCHASE_WEIGHT` per tag. Order
/// lines whose product no longer resolves are skipped. Weights only
/// accumulate, so the result is independent of iteration order.
pub async fn build_profile(store: &MemoryStore, customer: Uuid) -> TagProfile {
    let mut profile = TagProfile::default();

    for (product_id, count) in store.views_for(customer).await {
        if let Some(product) = store.product(product_id).await {
            for tag in &product.tags {
                profile.add(tag, count as f64);
            }
        }
    }

    for order in store.completed_orders(customer).await {
        for item in &order.items {
            let Some(product_id) = item.product else {
                continue;
            };
            let Some(product) = store.product(product_id).await else {
                continue;
            };
            for tag in &product.tags {
                profile.add(tag, PURCHASE_WEIGHT);
            }
        }
    }

    profile
}
