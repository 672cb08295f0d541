//! Loomline Core - Shared domain library.
//!
//! This crate provides the domain types used by every Loomline component:
//! - `storefront` - The REST API server (catalog, cart, checkout, back-office)
//! - `client` - The client core (request cache, session, checkout flow)
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Checkout arithmetic, the order status machine and
//! the role/capability guard live here so that server and client agree on them.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, contact details and money
//! - [`pricing`] - Cart subtotal, tax, shipping and total computation
//! - [`status`] - Order status machine and payment prompt gating
//! - [`access`] - Roles, capabilities and the access guard

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod pricing;
pub mod status;
pub mod types;

pub use access::{Access, Capability, DenyReason, Role};
pub use pricing::{CartTotals, PricedLine, PricingPolicy};
pub use status::{OrderStatus, StatusTransitionError, payment_prompt_visible};
pub use types::*;
