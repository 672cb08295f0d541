//! Loomline Wholesale client core.
//!
//! Everything a storefront front end needs below its views: a request cache
//! with shared in-flight fetches, the session, the cart and checkout flow,
//! order display projection and the route guard.
//!
//! # Example
//!
//! ```rust,ignore
//! use loomline_client::{App, ClientConfig};
//!
//! let app = App::from_config(&ClientConfig::from_env()?)?;
//!
//! app.session().login("asha@mehta.in", "correct horse").await?;
//! app.cart().add(product_id, 10).await?;
//! let order_id = app.checkout().place_order().await?;
//!
//! let order = app.orders().get(order_id).await?;
//! if OrderView::from(&order).show_payment_prompt {
//!     let upi = app.orders().upi_settings().await?;
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod cache;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod guard;
pub mod models;
pub mod orders;
pub mod session;
pub mod transport;
pub mod watchlist;

#[cfg(test)]
mod testing;

pub use app::App;
pub use cache::{CachePolicy, KeyPolicy, QueryClient, QueryKey};
pub use config::ClientConfig;
pub use error::ClientError;
pub use guard::{Navigation, Route, route_guard};
pub use orders::OrderView;
pub use transport::{HttpTransport, Transport};
