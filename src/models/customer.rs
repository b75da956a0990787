use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered marketplace customer.
///
/// Customers buy and sell: every product is owned by the customer that
/// listed it. The wishlist doubles as an auction watchlist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    /// Unique identifier for the customer
    pub id: Uuid,
    /// Public display name
    pub nickname: String,
    /// Contact address for notifications
    pub email: String,
    /// Whether the customer has been marked as a trusted seller
    pub trusted: bool,
    /// Product ids the customer has wishlisted / is watching
    pub wishlist: Vec<Uuid>,
}

impl Customer {
    /// Creates a new, untrusted customer with an empty wishlist
    pub fn new(nickname: String, email: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            nickname,
            email,
            trusted: false,
            wishlist: Vec::new(),
        }
    }
}
