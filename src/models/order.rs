use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A customer's order. While `complete` is false the order is the
/// customer's open cart; checkout stamps `date_ordered` and a transaction
/// id and marks it complete. Each customer has at most one open order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub customer: Uuid,
    pub complete: bool,
    pub date_ordered: Option<DateTime<Utc>>,
    pub transaction_id: Option<String>,
    pub items: Vec<OrderItem>,
}

/// A line in an order.
///
/// `product` is a weak reference: removing a product from the catalog nulls
/// it rather than deleting the line, so purchase history survives. Readers
/// skip lines whose product no longer resolves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub id: Uuid,
    pub product: Option<Uuid>,
    pub quantity: u32,
    pub date_added: DateTime<Utc>,
}

impl Order {
    /// Creates an empty open (cart) order for a customer
    pub fn open(customer: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer,
            complete: false,
            date_ordered: None,
            transaction_id: None,
            items: Vec::new(),
        }
    }

    /// Returns the line for a product, if the cart already holds one
    pub fn item_for(&self, product_id: Uuid) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.product == Some(product_id))
    }

    /// Total quantity across all lines
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

impl OrderItem {
    /// Creates a quantity-zero line for a product
    pub fn new(product_id: Uuid, date_added: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            product: Some(product_id),
            quantity: 0,
            date_added,
        }
    }
}
