use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Rating scale upper bound
pub const MAX_RATING: u8 = 5;

/// A customer's review of a product. One review per (product, author).
///
/// `author` is a weak reference, nulled if the account is removed. Reacts
/// map reacting customer to liked (true) / disliked (false); re-reacting
/// the same way cancels, the other way switches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductReview {
    pub id: Uuid,
    pub product: Uuid,
    pub author: Option<Uuid>,
    /// Star rating, 1 to `MAX_RATING`
    pub rating: u8,
    pub text: String,
    pub date_posted: DateTime<Utc>,
    pub edited: bool,
    pub reacts: HashMap<Uuid, bool>,
}

impl ProductReview {
    pub fn new(
        product: Uuid,
        author: Uuid,
        rating: u8,
        text: String,
        date_posted: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product,
            author: Some(author),
            rating,
            text,
            date_posted,
            edited: false,
            reacts: HashMap::new(),
        }
    }

    /// Likes minus dislikes
    pub fn score(&self) -> i64 {
        let likes = self.reacts.values().filter(|&&liked| liked).count() as i64;
        likes - (self.reacts.len() as i64 - likes)
    }

    /// Applies a like/dislike toggle from a customer and returns the
    /// resulting state of their react, `None` meaning cancelled.
    pub fn toggle_react(&mut self, customer: Uuid, liked: bool) -> Option<bool> {
        match self.reacts.get(&customer) {
            Some(&existing) if existing == liked => {
                self.reacts.remove(&customer);
                None
            }
            _ => {
                self.reacts.insert(customer, liked);
                Some(liked)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review() -> ProductReview {
        ProductReview::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            4,
            "solid".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn test_score_counts_likes_minus_dislikes() {
        let mut review = review();
        review.reacts.insert(Uuid::new_v4(), true);
        review.reacts.insert(Uuid::new_v4(), true);
        review.reacts.insert(Uuid::new_v4(), false);
        assert_eq!(review.score(), 1);
    }

    #[test]
    fn test_toggle_react_cancel_and_switch() {
        let mut review = review();
        let customer = Uuid::new_v4();

        assert_eq!(review.toggle_react(customer, true), Some(true));
        // Same reaction again cancels
        assert_eq!(review.toggle_react(customer, true), None);
        assert!(review.reacts.is_empty());
        // Opposite reaction switches
        assert_eq!(review.toggle_react(customer, false), Some(false));
        assert_eq!(review.toggle_react(customer, true), Some(true));
        assert_eq!(review.score(), 1);
    }
}
