use std::cmp::Ordering;

use uuid::Uuid;

use super::profile::{build_profile, TagProfile};
use super::similarity::cosine_similarity;
use crate::models::{Product, MAX_RATING};
use crate::store::MemoryStore;

/// Default cap on the number of ranked products returned
pub const DEFAULT_MAX_RESULTS: usize = 1000;

/// Largest share of the blended score the review signal can take
const MAX_RATING_WEIGHT: f64 = 0.3;

/// Review count at which the review signal reaches its full weight
const MAX_WEIGHTED_REVIEWS: u32 = 5;

/// A storefront candidate with its review signal attached
#[derive(Debug, Clone)]
pub struct Candidate {
    pub product: Product,
    pub review_count: u32,
    pub avg_rating: f64,
}

/// Blends tag similarity with the review-rating signal.
///
/// The review signal's weight grows with review count up to
/// `MAX_WEIGHTED_REVIEWS`: a well-reviewed product ranks on social proof,
/// an unreviewed one on tag affinity. Guests (`similarity` absent) are
/// scored on the review signal alone.
fn blended_score(similarity: Option<f64>, review_count: u32, avg_rating: f64) -> f64 {
    let review_score = avg_rating / MAX_RATING as f64;
    let Some(similarity) = similarity else {
        return review_score;
    };
    let n = review_count.min(MAX_WEIGHTED_REVIEWS);
    let review_weight = MAX_RATING_WEIGHT * n as f64 / MAX_WEIGHTED_REVIEWS as f64;
    similarity * (1.0 - review_weight) + review_score * review_weight
}

/// Ranks candidates by blended score, descending, truncated to
/// `max_results`.
///
/// The sort is stable: candidates with equal scores keep their incoming
/// (listing-insertion) order.
pub fn rank(
    profile: Option<&TagProfile>,
    candidates: Vec<Candidate>,
    max_results: usize,
) -> Vec<Product> {
    let mut scored: Vec<(f64, Product)> = candidates
        .into_iter()
        .map(|c| {
            let similarity = profile.map(|p| cosine_similarity(p, &c.product.tags));
            (
                blended_score(similarity, c.review_count, c.avg_rating),
                c.product,
            )
        })
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored
        .into_iter()
        .take(max_results)
        .map(|(_, product)| product)
        .collect()
}

/// Produces the ranked storefront for a customer (or a guest).
///
/// Candidates are the active listings with stock remaining; the customer's
/// profile is built from their viewing and purchase history.
pub async fn recommend(
    store: &MemoryStore,
    customer: Option<Uuid>,
    max_results: usize,
) -> Vec<Product> {
    let profile = match customer {
        Some(id) => Some(build_profile(store, id).await),
        None => None,
    };

    let mut candidates = Vec::new();
    for product in store.products().await {
        if !product.is_active || product.remaining_unit == 0 {
            continue;
        }
        let (review_count, avg_rating) = store.rating_summary(product.id).await;
        candidates.push(Candidate {
            product,
            review_count,
            avg_rating,
        });
    }

    tracing::debug!(
        candidates = candidates.len(),
        personalized = profile.is_some(),
        "Ranking storefront"
    );

    rank(profile.as_ref(), candidates, max_results)
}
