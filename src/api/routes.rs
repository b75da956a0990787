use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Customers
        .route("/customers", post(handlers::create_customer))
        .route("/customers/:id", get(handlers::get_customer))
        // Listings and the ranked storefront
        .route("/products", get(handlers::get_storefront))
        .route("/products", post(handlers::create_product))
        .route("/products/:id", get(handlers::get_product))
        .route("/products/:id", delete(handlers::delete_product))
        .route("/products/:id/unlist", post(handlers::unlist_product))
        // Bidding
        .route("/products/:id/bids", get(handlers::get_bids))
        .route("/products/:id/bids", post(handlers::place_bid))
        // Reviews
        .route("/products/:id/reviews", get(handlers::get_reviews))
        .route("/products/:id/reviews", post(handlers::create_review))
        .route("/reviews/:id/reacts", post(handlers::react_to_review))
        // Cart and orders
        .route("/cart/items", post(handlers::update_cart_item))
        .route("/customers/:id/cart", get(handlers::get_cart))
        .route("/customers/:id/checkout", post(handlers::checkout))
        .route(
            "/customers/:id/order-items/:item_id/restore",
            post(handlers::restore_order_item),
        )
        .route("/customers/:id/purchases", get(handlers::get_purchases))
        // Wishlist
        .route("/customers/:id/wishlist", get(handlers::get_wishlist))
        .route("/customers/:id/wishlist", post(handlers::toggle_wishlist))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
