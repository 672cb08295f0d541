//! Domain models for the storefront.
//!
//! Row types (`*Row`) mirror database columns and convert into these
//! validated domain types; the domain types are what handlers serialize.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod session;
pub mod settings;
pub mod user;

pub use cart::{CartLine, CartView};
pub use catalog::{Banner, Category, CategoryWithProducts, Product, ProductSummary};
pub use order::{Order, OrderCustomer, OrderItem};
pub use session::{CurrentUser, keys as session_keys};
pub use settings::UpiSettings;
pub use user::User;
