use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Bid, Customer, Order, OrderItem, Product, ProductReview};

/// Rating assumed for a product nobody has reviewed yet (neutral midpoint
/// of the 1-5 scale)
pub const NEUTRAL_RATING: f64 = 2.5;

/// Errors surfaced by store operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Optimistic concurrency check failed; the caller saw a stale version
    #[error("listing was modified concurrently")]
    VersionConflict,

    /// Re-check inside the bid commit failed: the running high bid moved
    /// past the offered amount
    #[error("bid must be strictly greater than the current bid of {current_cents} cents")]
    BidTooLow { current_cents: i64 },

    #[error("not enough stock remaining for product {product}")]
    InsufficientStock { product: Uuid },

    #[error("cart is empty")]
    EmptyCart,

    #[error("customer has already reviewed this product")]
    DuplicateReview,

    #[error("listing is not active")]
    NotActive,

    #[error("listing is not an auction")]
    NotAnAuction,
}

/// Outcome of the transactional settlement primitive
#[derive(Debug, Clone, PartialEq)]
pub enum SettledAuction {
    /// The auction had a winner; a quantity-1 line was added to their cart
    Sold {
        winner: Uuid,
        seller: Uuid,
        price_cents: i64,
        order_id: Uuid,
    },
    /// No bid was ever placed; the listing was closed with no order
    ClosedUnsold { seller: Uuid },
}

#[derive(Default)]
struct Tables {
    customers: HashMap<Uuid, Customer>,
    products: HashMap<Uuid, Product>,
    /// Bid history per product, in placement order
    bids: HashMap<Uuid, Vec<Bid>>,
    orders: HashMap<Uuid, Order>,
    reviews: HashMap<Uuid, ProductReview>,
    view_counts: HashMap<(Uuid, Uuid), u32>,
    next_seq: u64,
}

/// In-process entity store.
///
/// All tables live behind a single `RwLock`; every multi-step mutation the
/// marketplace needs to be atomic (bid commit, checkout, settlement) runs
/// inside one write-lock critical section, so request handlers and the
/// auction clock can race freely without losing updates. Products carry a
/// `version` token so read-validate-commit flows can detect interleaving.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Customers ---

    pub async fn insert_customer(&self, customer: Customer) -> Customer {
        let mut tables = self.inner.write().await;
        tables.customers.insert(customer.id, customer.clone());
        customer
    }

    pub async fn customer(&self, id: Uuid) -> Option<Customer> {
        self.inner.read().await.customers.get(&id).cloned()
    }

    // --- Products ---

    pub async fn insert_product(&self, mut product: Product) -> Product {
        let mut tables = self.inner.write().await;
        product.seq = tables.next_seq;
        tables.next_seq += 1;
        tables.products.insert(product.id, product.clone());
        product
    }

    pub async fn product(&self, id: Uuid) -> Option<Product> {
        self.inner.read().await.products.get(&id).cloned()
    }

    /// All products in listing-insertion order
    pub async fn products(&self) -> Vec<Product> {
        let tables = self.inner.read().await;
        let mut products: Vec<Product> = tables.products.values().cloned().collect();
        products.sort_by_key(|p| p.seq);
        products
    }

    /// Active auctions whose end date has passed at `now`
    pub async fn expired_active_auctions(&self, now: DateTime<Utc>) -> Vec<Product> {
        let mut expired: Vec<Product> = self
            .inner
            .read()
            .await
            .products
            .values()
            .filter(|p| p.is_active && p.is_expired(now))
            .cloned()
            .collect();
        expired.sort_by_key(|p| p.seq);
        expired
    }

    /// Flips a listing's visibility and returns the new state
    pub async fn toggle_active(&self, product_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.inner.write().await;
        let product = tables
            .products
            .get_mut(&product_id)
            .ok_or(StoreError::NotFound("product"))?;
        product.is_active = !product.is_active;
        product.version += 1;
        Ok(product.is_active)
    }

    /// Removes a product from the catalog. Bid history is dropped with it;
    /// order lines and wishlists referencing it are nulled/cleared so
    /// purchase history survives with an unresolvable product reference.
    pub async fn remove_product(&self, product_id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;
        tables
            .products
            .remove(&product_id)
            .ok_or(StoreError::NotFound("product"))?;
        tables.bids.remove(&product_id);
        for order in tables.orders.values_mut() {
            for item in order.items.iter_mut() {
                if item.product == Some(product_id) {
                    item.product = None;
                }
            }
        }
        for customer in tables.customers.values_mut() {
            customer.wishlist.retain(|&id| id != product_id);
        }
        Ok(())
    }

    // --- Bids ---

    /// Versioned compare-and-set commit of a bid.
    ///
    /// Fails with `VersionConflict` when the product changed since the
    /// caller read it, and re-checks `amount > current_bid` inside the
    /// critical section so a concurrently committed higher bid can never be
    /// displaced by a lower one. On success the bid is appended to the
    /// product's history, the running high bid and highest bidder are
    /// updated, and the previous highest bidder (if any) is returned for
    /// the outbid notification.
    pub async fn commit_bid(
        &self,
        product_id: Uuid,
        expected_version: u64,
        bidder: Uuid,
        amount_cents: i64,
        placed_at: DateTime<Utc>,
    ) -> Result<Option<Uuid>, StoreError> {
        let mut tables = self.inner.write().await;
        let product = tables
            .products
            .get_mut(&product_id)
            .ok_or(StoreError::NotFound("product"))?;

        if product.version != expected_version {
            return Err(StoreError::VersionConflict);
        }
        if amount_cents <= product.current_bid_cents {
            return Err(StoreError::BidTooLow {
                current_cents: product.current_bid_cents,
            });
        }

        let previous = product.highest_bidder;
        product.current_bid_cents = amount_cents;
        product.highest_bidder = Some(bidder);
        product.version += 1;

        tables.bids.entry(product_id).or_default().push(Bid {
            id: Uuid::new_v4(),
            product_id,
            bidder,
            amount_cents,
            placed_at,
        });

        Ok(previous)
    }

    /// Bid history for a product, in placement order
    pub async fn bids_for(&self, product_id: Uuid) -> Vec<Bid> {
        self.inner
            .read()
            .await
            .bids
            .get(&product_id)
            .cloned()
            .unwrap_or_default()
    }

    // --- View counts ---

    /// Records one product-page view and returns the updated count
    pub async fn log_view(&self, customer: Uuid, product: Uuid) -> u32 {
        let mut tables = self.inner.write().await;
        let count = tables.view_counts.entry((customer, product)).or_insert(0);
        *count += 1;
        *count
    }

    /// (product, view count) pairs for a customer
    pub async fn views_for(&self, customer: Uuid) -> Vec<(Uuid, u32)> {
        self.inner
            .read()
            .await
            .view_counts
            .iter()
            .filter(|((c, _), _)| *c == customer)
            .map(|((_, p), count)| (*p, *count))
            .collect()
    }

    // --- Orders & cart ---

    /// Returns the customer's open cart order, creating it if absent
    pub async fn open_order(&self, customer: Uuid) -> Order {
        let mut tables = self.inner.write().await;
        Self::open_order_mut(&mut tables, customer).clone()
    }

    fn open_order_mut(tables: &mut Tables, customer: Uuid) -> &mut Order {
        let existing = tables
            .orders
            .values()
            .find(|o| o.customer == customer && !o.complete)
            .map(|o| o.id);
        let id = match existing {
            Some(id) => id,
            None => {
                let order = Order::open(customer);
                let id = order.id;
                tables.orders.insert(id, order);
                id
            }
        };
        tables.orders.get_mut(&id).expect("order just ensured")
    }

    /// Adjusts the cart line for a product by a signed quantity delta.
    ///
    /// Increases are capped by the product's remaining stock (the cart can
    /// never hold more units than exist); a line driven to zero or below is
    /// removed. Returns the updated cart order.
    pub async fn add_to_cart(
        &self,
        customer: Uuid,
        product_id: Uuid,
        delta: i64,
        now: DateTime<Utc>,
    ) -> Result<Order, StoreError> {
        let mut tables = self.inner.write().await;
        let product = tables
            .products
            .get(&product_id)
            .ok_or(StoreError::NotFound("product"))?;
        if delta > 0 && !product.is_active {
            return Err(StoreError::NotActive);
        }
        let remaining = product.remaining_unit as i64;

        let order = Self::open_order_mut(&mut tables, customer);
        let pos = order.items.iter().position(|i| i.product == Some(product_id));
        let current = pos.map_or(0, |p| order.items[p].quantity as i64);

        let requested = current + delta;
        if requested > remaining {
            return Err(StoreError::InsufficientStock {
                product: product_id,
            });
        }
        if requested <= 0 {
            if let Some(p) = pos {
                order.items.remove(p);
            }
        } else if let Some(p) = pos {
            order.items[p].quantity = requested as u32;
        } else {
            let mut item = OrderItem::new(product_id, now);
            item.quantity = requested as u32;
            order.items.push(item);
        }
        Ok(order.clone())
    }

    /// Completes the customer's cart order.
    ///
    /// Every resolvable line's stock is validated before anything mutates,
    /// so a single under-stocked line aborts the whole checkout. Stock
    /// decrements happen in the same critical section; a listing whose
    /// remaining stock reaches zero is deactivated.
    pub async fn checkout(
        &self,
        customer: Uuid,
        transaction_id: String,
        now: DateTime<Utc>,
    ) -> Result<Order, StoreError> {
        let mut tables = self.inner.write().await;
        let order_id = tables
            .orders
            .values()
            .find(|o| o.customer == customer && !o.complete && !o.items.is_empty())
            .map(|o| o.id)
            .ok_or(StoreError::EmptyCart)?;

        // Validate every line before mutating any state
        let lines: Vec<(Uuid, u32)> = tables.orders[&order_id]
            .items
            .iter()
            .filter_map(|i| i.product.map(|p| (p, i.quantity)))
            .collect();
        for (product_id, quantity) in &lines {
            let product = tables
                .products
                .get(product_id)
                .ok_or(StoreError::NotFound("product"))?;
            if product.remaining_unit < *quantity {
                return Err(StoreError::InsufficientStock {
                    product: *product_id,
                });
            }
        }

        for (product_id, quantity) in &lines {
            let product = tables.products.get_mut(product_id).expect("validated above");
            product.remaining_unit -= quantity;
            product.sold_unit += quantity;
            if product.remaining_unit == 0 {
                product.is_active = false;
            }
            product.version += 1;
        }

        let order = tables.orders.get_mut(&order_id).expect("validated above");
        order.complete = true;
        order.date_ordered = Some(now);
        order.transaction_id = Some(transaction_id);
        Ok(order.clone())
    }

    /// Completed orders for a customer
    pub async fn completed_orders(&self, customer: Uuid) -> Vec<Order> {
        self.inner
            .read()
            .await
            .orders
            .values()
            .filter(|o| o.customer == customer && o.complete)
            .cloned()
            .collect()
    }

    /// Cancels one line of a completed order, restoring the product's
    /// stock, and removes the line
    pub async fn restore_item(&self, customer: Uuid, item_id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;
        let order_id = tables
            .orders
            .values()
            .find(|o| o.customer == customer && o.complete && o.items.iter().any(|i| i.id == item_id))
            .map(|o| o.id)
            .ok_or(StoreError::NotFound("order item"))?;

        let order = tables.orders.get_mut(&order_id).expect("found above");
        let item_pos = order
            .items
            .iter()
            .position(|i| i.id == item_id)
            .expect("found above");
        let item = order.items.remove(item_pos);

        if let Some(product_id) = item.product {
            if let Some(product) = tables.products.get_mut(&product_id) {
                product.remaining_unit += item.quantity;
                product.sold_unit = product.sold_unit.saturating_sub(item.quantity);
                product.version += 1;
            }
        }
        Ok(())
    }

    // --- Settlement ---

    /// Transactional settlement of an expired auction.
    ///
    /// Deactivating the listing is the first mutation, and the `is_active`
    /// guard makes a repeat call a `NotActive` error, so a product can
    /// never be settled twice. A won auction adds a quantity-1 line to the
    /// winner's cart order; an auction with no recorded bidder closes
    /// unsold with no order created.
    pub async fn settle_auction(
        &self,
        product_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<SettledAuction, StoreError> {
        let mut tables = self.inner.write().await;
        let product = tables
            .products
            .get_mut(&product_id)
            .ok_or(StoreError::NotFound("product"))?;
        if !product.is_active {
            return Err(StoreError::NotActive);
        }
        if !product.is_auction() {
            return Err(StoreError::NotAnAuction);
        }

        product.is_active = false;
        product.version += 1;
        let seller = product.seller;
        let price_cents = product.current_bid_cents;

        let Some(winner) = product.highest_bidder else {
            return Ok(SettledAuction::ClosedUnsold { seller });
        };

        let order = Self::open_order_mut(&mut tables, winner);
        let order_id = order.id;
        match order.items.iter_mut().find(|i| i.product == Some(product_id)) {
            Some(item) => item.quantity += 1,
            None => {
                let mut item = OrderItem::new(product_id, now);
                item.quantity = 1;
                order.items.push(item);
            }
        }

        Ok(SettledAuction::Sold {
            winner,
            seller,
            price_cents,
            order_id,
        })
    }

    // --- Reviews ---

    /// Stores a review, enforcing one review per (product, author)
    pub async fn insert_review(
        &self,
        review: ProductReview,
    ) -> Result<ProductReview, StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.products.contains_key(&review.product) {
            return Err(StoreError::NotFound("product"));
        }
        let duplicate = tables
            .reviews
            .values()
            .any(|r| r.product == review.product && r.author == review.author);
        if duplicate {
            return Err(StoreError::DuplicateReview);
        }
        tables.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    pub async fn reviews_for(&self, product_id: Uuid) -> Vec<ProductReview> {
        let mut reviews: Vec<ProductReview> = self
            .inner
            .read()
            .await
            .reviews
            .values()
            .filter(|r| r.product == product_id)
            .cloned()
            .collect();
        reviews.sort_by_key(|r| r.date_posted);
        reviews
    }

    /// Applies a like/dislike toggle and returns the react state and the
    /// review's updated score
    pub async fn toggle_react(
        &self,
        review_id: Uuid,
        customer: Uuid,
        liked: bool,
    ) -> Result<(Option<bool>, i64), StoreError> {
        let mut tables = self.inner.write().await;
        let review = tables
            .reviews
            .get_mut(&review_id)
            .ok_or(StoreError::NotFound("review"))?;
        let state = review.toggle_react(customer, liked);
        Ok((state, review.score()))
    }

    /// Review count and average rating for a product; the average defaults
    /// to the neutral midpoint when there are no reviews
    pub async fn rating_summary(&self, product_id: Uuid) -> (u32, f64) {
        let tables = self.inner.read().await;
        let mut count = 0u32;
        let mut total = 0u64;
        for review in tables.reviews.values().filter(|r| r.product == product_id) {
            count += 1;
            total += review.rating as u64;
        }
        if count == 0 {
            (0, NEUTRAL_RATING)
        } else {
            (count, total as f64 / count as f64)
        }
    }

    // --- Wishlist ---

    /// Adds the product to the customer's wishlist, or removes it if
    /// already present. Returns true when the product was added.
    pub async fn toggle_wishlist(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
    ) -> Result<bool, StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.products.contains_key(&product_id) {
            return Err(StoreError::NotFound("product"));
        }
        let customer = tables
            .customers
            .get_mut(&customer_id)
            .ok_or(StoreError::NotFound("customer"))?;
        if let Some(pos) = customer.wishlist.iter().position(|&id| id == product_id) {
            customer.wishlist.remove(pos);
            Ok(false)
        } else {
            customer.wishlist.push(product_id);
            Ok(true)
        }
    }

    /// The customer's wishlisted products, resolved; removed products are
    /// skipped
    pub async fn wishlist_of(&self, customer_id: Uuid) -> Result<Vec<Product>, StoreError> {
        let tables = self.inner.read().await;
        let customer = tables
            .customers
            .get(&customer_id)
            .ok_or(StoreError::NotFound("customer"))?;
        Ok(customer
            .wishlist
            .iter()
            .filter_map(|id| tables.products.get(id))
            .cloned()
            .collect())
    }
}
