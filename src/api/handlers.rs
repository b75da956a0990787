use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Bid, Customer, NewProduct, Order, Product, ProductReview, SellingType, MAX_RATING,
};
use crate::services::{self, Clock, DEFAULT_MAX_RESULTS};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub nickname: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub nickname: String,
    pub email: String,
    pub trusted: bool,
}

impl From<&Customer> for CustomerResponse {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            nickname: customer.nickname.clone(),
            email: customer.email.clone(),
            trusted: customer.trusted,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub selling_type: SellingType,
    #[serde(default)]
    pub price_cents: i64,
    #[serde(default)]
    pub starting_bid_cents: i64,
    pub end_date: Option<DateTime<Utc>>,
    pub remaining_unit: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    pub seller: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub selling_type: SellingType,
    pub price_cents: i64,
    pub starting_bid_cents: i64,
    pub current_bid_cents: i64,
    pub end_date: Option<DateTime<Utc>>,
    pub remaining_unit: u32,
    pub sold_unit: u32,
    pub tags: Vec<String>,
    pub seller: Uuid,
    pub is_active: bool,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            selling_type: product.selling_type,
            price_cents: product.price_cents,
            starting_bid_cents: product.starting_bid_cents,
            current_bid_cents: product.current_bid_cents,
            end_date: product.end_date,
            remaining_unit: product.remaining_unit,
            sold_unit: product.sold_unit,
            tags: product.tags.clone(),
            seller: product.seller,
            is_active: product.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub product: ProductResponse,
    pub review_count: u32,
    pub avg_rating: f64,
}

#[derive(Debug, Deserialize)]
pub struct StorefrontQuery {
    pub customer_id: Option<Uuid>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ViewerQuery {
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UnlistRequest {
    pub customer_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct PlaceBidRequest {
    pub customer_id: Uuid,
    pub amount_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct BidResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub bidder: Uuid,
    pub amount_cents: i64,
    pub placed_at: DateTime<Utc>,
}

impl From<&Bid> for BidResponse {
    fn from(bid: &Bid) -> Self {
        Self {
            id: bid.id,
            product_id: bid.product_id,
            bidder: bid.bidder,
            amount_cents: bid.amount_cents,
            placed_at: bid.placed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BidAcceptedResponse {
    pub product_id: Uuid,
    pub bidder: Uuid,
    pub amount_cents: i64,
    pub outbid: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub customer_id: Uuid,
    pub rating: u8,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub product: Uuid,
    pub author: Option<Uuid>,
    pub rating: u8,
    pub text: String,
    pub date_posted: DateTime<Utc>,
    pub edited: bool,
    pub score: i64,
}

impl From<&ProductReview> for ReviewResponse {
    fn from(review: &ProductReview) -> Self {
        Self {
            id: review.id,
            product: review.product,
            author: review.author,
            rating: review.rating,
            text: review.text.clone(),
            date_posted: review.date_posted,
            edited: review.edited,
            score: review.score(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReactRequest {
    pub customer_id: Uuid,
    pub liked: bool,
}

#[derive(Debug, Serialize)]
pub struct ReactResponse {
    /// The customer's react after the toggle; null means cancelled
    pub liked: Option<bool>,
    pub score: i64,
}

#[derive(Debug, Deserialize)]
pub struct CartItemRequest {
    pub customer_id: Uuid,
    pub product_id: Uuid,
    /// Signed quantity change; negative removes units
    pub delta: i64,
}

#[derive(Debug, Serialize)]
pub struct CartLineResponse {
    pub item_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub line_total_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer: Uuid,
    pub complete: bool,
    pub date_ordered: Option<DateTime<Utc>>,
    pub transaction_id: Option<String>,
    pub items: Vec<CartLineResponse>,
    pub total_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct WishlistRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct WishlistToggleResponse {
    pub product_id: Uuid,
    pub wishlisted: bool,
}

/// Resolves an order's lines against the current listings.
///
/// Fixed-price lines are priced at the listed price times quantity; a won
/// auction line carries the winning bid. Lines whose product has since been
/// removed are skipped.
async fn order_response(state: &AppState, order: &Order) -> OrderResponse {
    let mut items = Vec::new();
    let mut total_cents = 0;
    for item in &order.items {
        let Some(product_id) = item.product else {
            continue;
        };
        let Some(product) = state.store.product(product_id).await else {
            continue;
        };
        let line_total_cents = match product.selling_type {
            SellingType::Sale => product.price_cents * item.quantity as i64,
            SellingType::Auction => product.current_bid_cents,
        };
        total_cents += line_total_cents;
        items.push(CartLineResponse {
            item_id: item.id,
            product_id,
            product_name: product.name,
            quantity: item.quantity,
            line_total_cents,
        });
    }
    OrderResponse {
        id: order.id,
        customer: order.customer,
        complete: order.complete,
        date_ordered: order.date_ordered,
        transaction_id: order.transaction_id.clone(),
        items,
        total_cents,
    }
}

async fn require_customer(state: &AppState, id: Uuid) -> AppResult<Customer> {
    state
        .store
        .customer(id)
        .await
        .ok_or_else(|| AppError::NotFound("customer".to_string()))
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Register a customer account
pub async fn create_customer(
    State(state): State<AppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> AppResult<(StatusCode, Json<CustomerResponse>)> {
    if request.nickname.trim().is_empty() {
        return Err(AppError::InvalidInput("nickname must not be empty".to_string()));
    }
    let customer = state
        .store
        .insert_customer(Customer::new(request.nickname, request.email))
        .await;
    Ok((StatusCode::CREATED, Json(CustomerResponse::from(&customer))))
}

/// Get a customer account
pub async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<CustomerResponse>> {
    let customer = require_customer(&state, customer_id).await?;
    Ok(Json(CustomerResponse::from(&customer)))
}

/// Create a new listing
pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<ProductResponse>)> {
    require_customer(&state, request.seller).await?;
    match request.selling_type {
        SellingType::Sale => {
            if request.price_cents <= 0 {
                return Err(AppError::InvalidInput(
                    "sale listings need a positive price".to_string(),
                ));
            }
        }
        SellingType::Auction => {
            if request.starting_bid_cents <= 0 {
                return Err(AppError::InvalidInput(
                    "auctions need a positive starting bid".to_string(),
                ));
            }
            if request.end_date.is_none() {
                return Err(AppError::InvalidInput(
                    "auctions need an end date".to_string(),
                ));
            }
        }
    }

    let product = state
        .store
        .insert_product(Product::new(NewProduct {
            name: request.name,
            description: request.description,
            selling_type: request.selling_type,
            price_cents: request.price_cents,
            starting_bid_cents: request.starting_bid_cents,
            end_date: request.end_date,
            remaining_unit: request.remaining_unit,
            tags: request.tags,
            seller: request.seller,
        }))
        .await;
    Ok((StatusCode::CREATED, Json(ProductResponse::from(&product))))
}

/// The ranked storefront.
///
/// With a `customer_id` the ordering is personalized to that customer's
/// viewing and purchase history; without one, review ratings alone decide.
pub async fn get_storefront(
    State(state): State<AppState>,
    Query(query): Query<StorefrontQuery>,
) -> AppResult<Json<Vec<ProductResponse>>> {
    if let Some(customer_id) = query.customer_id {
        require_customer(&state, customer_id).await?;
    }
    let limit = query.limit.unwrap_or(DEFAULT_MAX_RESULTS);
    let ranked = services::recommend(&state.store, query.customer_id, limit).await;
    Ok(Json(ranked.iter().map(ProductResponse::from).collect()))
}

/// A single listing with its review summary. A `customer_id` query records
/// the view for that customer's tag profile.
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(query): Query<ViewerQuery>,
) -> AppResult<Json<ProductDetailResponse>> {
    let product = state
        .store
        .product(product_id)
        .await
        .ok_or_else(|| AppError::NotFound("product".to_string()))?;

    if let Some(customer_id) = query.customer_id {
        if state.store.customer(customer_id).await.is_some() {
            state.store.log_view(customer_id, product_id).await;
        }
    }

    let (review_count, avg_rating) = state.store.rating_summary(product_id).await;
    Ok(Json(ProductDetailResponse {
        product: ProductResponse::from(&product),
        review_count,
        avg_rating,
    }))
}

/// Toggle a listing's storefront visibility. Only the seller may do this.
pub async fn unlist_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(request): Json<UnlistRequest>,
) -> AppResult<Json<ProductResponse>> {
    let product = state
        .store
        .product(product_id)
        .await
        .ok_or_else(|| AppError::NotFound("product".to_string()))?;
    if product.seller != request.customer_id {
        return Err(AppError::Forbidden(
            "only the seller may unlist a product".to_string(),
        ));
    }
    state.store.toggle_active(product_id).await?;
    let product = state
        .store
        .product(product_id)
        .await
        .ok_or_else(|| AppError::NotFound("product".to_string()))?;
    Ok(Json(ProductResponse::from(&product)))
}

/// Remove a listing from the catalog entirely. Only the seller may delete;
/// purchase history keeps its lines with the product reference cleared.
pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(request): Json<UnlistRequest>,
) -> AppResult<StatusCode> {
    let product = state
        .store
        .product(product_id)
        .await
        .ok_or_else(|| AppError::NotFound("product".to_string()))?;
    if product.seller != request.customer_id {
        return Err(AppError::Forbidden(
            "only the seller may delete a product".to_string(),
        ));
    }
    state.store.remove_product(product_id).await?;
    tracing::info!(product_id = %product_id, "Listing removed");
    Ok(StatusCode::NO_CONTENT)
}

/// Place a bid on an auction listing
pub async fn place_bid(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(request): Json<PlaceBidRequest>,
) -> AppResult<(StatusCode, Json<BidAcceptedResponse>)> {
    let accepted = services::place_bid(
        &state.store,
        state.notifier.as_ref(),
        state.clock.as_ref(),
        product_id,
        request.customer_id,
        request.amount_cents,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(BidAcceptedResponse {
            product_id: accepted.product_id,
            bidder: accepted.bidder,
            amount_cents: accepted.amount_cents,
            outbid: accepted.outbid,
        }),
    ))
}

/// Bid history for a listing, in placement order
pub async fn get_bids(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Vec<BidResponse>>> {
    state
        .store
        .product(product_id)
        .await
        .ok_or_else(|| AppError::NotFound("product".to_string()))?;
    let bids = state.store.bids_for(product_id).await;
    Ok(Json(bids.iter().map(BidResponse::from).collect()))
}

/// Post a review of a product
pub async fn create_review(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(request): Json<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<ReviewResponse>)> {
    if request.rating == 0 || request.rating > MAX_RATING {
        return Err(AppError::InvalidInput(format!(
            "rating must be between 1 and {MAX_RATING}"
        )));
    }
    require_customer(&state, request.customer_id).await?;
    let review = state
        .store
        .insert_review(ProductReview::new(
            product_id,
            request.customer_id,
            request.rating,
            request.text,
            state.clock.now(),
        ))
        .await?;
    Ok((StatusCode::CREATED, Json(ReviewResponse::from(&review))))
}

/// Reviews for a product, oldest first
pub async fn get_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Vec<ReviewResponse>>> {
    state
        .store
        .product(product_id)
        .await
        .ok_or_else(|| AppError::NotFound("product".to_string()))?;
    let reviews = state.store.reviews_for(product_id).await;
    Ok(Json(reviews.iter().map(ReviewResponse::from).collect()))
}

/// Like or dislike a review. Repeating the same react cancels it; the
/// opposite react switches it.
pub async fn react_to_review(
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
    Json(request): Json<ReactRequest>,
) -> AppResult<Json<ReactResponse>> {
    require_customer(&state, request.customer_id).await?;
    let (liked, score) = state
        .store
        .toggle_react(review_id, request.customer_id, request.liked)
        .await?;
    Ok(Json(ReactResponse { liked, score }))
}

/// Adjust the quantity of a product in the customer's cart
pub async fn update_cart_item(
    State(state): State<AppState>,
    Json(request): Json<CartItemRequest>,
) -> AppResult<Json<OrderResponse>> {
    require_customer(&state, request.customer_id).await?;
    let order = state
        .store
        .add_to_cart(
            request.customer_id,
            request.product_id,
            request.delta,
            state.clock.now(),
        )
        .await?;
    Ok(Json(order_response(&state, &order).await))
}

/// The customer's open cart with resolved line totals
pub async fn get_cart(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<OrderResponse>> {
    require_customer(&state, customer_id).await?;
    let order = state.store.open_order(customer_id).await;
    Ok(Json(order_response(&state, &order).await))
}

/// Complete the customer's cart order
pub async fn checkout(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<OrderResponse>> {
    require_customer(&state, customer_id).await?;
    let transaction_id = Uuid::new_v4().to_string();
    let order = state
        .store
        .checkout(customer_id, transaction_id, state.clock.now())
        .await?;
    tracing::info!(
        customer_id = %customer_id,
        order_id = %order.id,
        items = order.items.len(),
        "Checkout completed"
    );
    Ok(Json(order_response(&state, &order).await))
}

/// Cancel one line of a completed order, restoring its stock
pub async fn restore_order_item(
    State(state): State<AppState>,
    Path((customer_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    require_customer(&state, customer_id).await?;
    state.store.restore_item(customer_id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The customer's completed orders
pub async fn get_purchases(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<Vec<OrderResponse>>> {
    require_customer(&state, customer_id).await?;
    let orders = state.store.completed_orders(customer_id).await;
    let mut responses = Vec::with_capacity(orders.len());
    for order in &orders {
        responses.push(order_response(&state, order).await);
    }
    Ok(Json(responses))
}

/// Toggle a product on the customer's wishlist
pub async fn toggle_wishlist(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Json(request): Json<WishlistRequest>,
) -> AppResult<Json<WishlistToggleResponse>> {
    let wishlisted = state
        .store
        .toggle_wishlist(customer_id, request.product_id)
        .await?;
    Ok(Json(WishlistToggleResponse {
        product_id: request.product_id,
        wishlisted,
    }))
}

/// The customer's wishlisted products
pub async fn get_wishlist(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<Vec<ProductResponse>>> {
    let products = state.store.wishlist_of(customer_id).await?;
    Ok(Json(products.iter().map(ProductResponse::from).collect()))
}
