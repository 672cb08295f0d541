//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Auth (strict rate limit on the credential endpoints)
//! GET  /api/auth/me                  - Current user (401 if anonymous)
//! PUT  /api/auth/me                  - Edit profile
//! POST /api/auth/login               - Login with email or phone
//! POST /api/auth/register            - Register and log in
//! POST /api/auth/forgot-password     - Issue a reset link (always 202)
//! POST /api/auth/reset-password      - Redeem a reset token
//! POST /api/auth/logout              - End the session
//!
//! # Catalog
//! GET  /api/categories               - All categories
//! GET  /api/categories/{slug}        - Category with its products
//! GET  /api/products                 - ?category=&q=&limit=&offset=
//! GET  /api/products/{id}            - Product detail
//! GET  /api/banners                  - ?placement=
//! GET  /api/settings/upi             - UPI payment details
//!
//! # Cart (requires auth)
//! GET    /api/cart                   - Priced cart
//! DELETE /api/cart                   - Empty the cart
//! POST   /api/cart/items             - Add a product
//! PUT    /api/cart/items/{productId} - Set quantity (0 removes)
//! DELETE /api/cart/items/{productId} - Remove a line
//!
//! # Orders (requires auth)
//! POST /api/orders                   - Place an order from the cart
//! GET  /api/orders                   - Own orders
//! GET  /api/orders/{id}              - One order (owner or admin)
//!
//! # Watchlist (requires auth)
//! GET    /api/watchlist
//! POST   /api/watchlist
//! DELETE /api/watchlist/{productId}
//!
//! # Back-office (requires admin)
//! /api/admin/products, /categories, /banners, /orders, /settings/upi
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod settings;
pub mod watchlist;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let credentials = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/me", get(auth::me).put(auth::update_me))
        .route("/logout", post(auth::logout))
        .merge(credentials)
}

/// Create the public catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(catalog::categories))
        .route("/categories/{slug}", get(catalog::category))
        .route("/products", get(catalog::products))
        .route("/products/{id}", get(catalog::product))
        .route("/banners", get(catalog::banners))
        .route("/settings/upi", get(settings::upi))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{product_id}",
            put(cart::set_quantity).delete(cart::remove_item),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list).post(orders::place))
        .route("/{id}", get(orders::show))
}

/// Create the watchlist routes router.
pub fn watchlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(watchlist::list).post(watchlist::add))
        .route("/{product_id}", axum::routing::delete(watchlist::remove))
}

/// Create the back-office routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(admin::create_product))
        .route(
            "/products/{id}",
            put(admin::update_product).delete(admin::delete_product),
        )
        .route("/categories", post(admin::create_category))
        .route(
            "/categories/{id}",
            put(admin::update_category).delete(admin::delete_category),
        )
        .route("/banners", get(admin::banners).post(admin::create_banner))
        .route(
            "/banners/{id}",
            put(admin::update_banner).delete(admin::delete_banner),
        )
        .route("/orders", get(admin::orders))
        .route("/orders/{id}", get(admin::order))
        .route("/orders/{id}/status", post(admin::update_order_status))
        .route("/settings/upi", put(admin::update_upi))
}

/// Create all routes for the storefront API.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/watchlist", watchlist_routes())
        .nest("/admin", admin_routes())
        .merge(catalog_routes())
        .layer(api_rate_limiter())
        .nest("/auth", auth_routes());

    Router::new().nest("/api", api)
}
