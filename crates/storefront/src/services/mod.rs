//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Accounts: password login, registration, profile, password reset
//! - `checkout` - Cart pricing, order placement and status changes
//! - `email` - Transactional email (password reset links)

pub mod auth;
pub mod checkout;
pub mod email;

pub use auth::{AuthError, AuthService};
pub use checkout::{CheckoutError, CheckoutService};
pub use email::{EmailError, EmailService};
