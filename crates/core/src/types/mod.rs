//! Core types for Loomline.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod identifier;
pub mod money;
pub mod phone;

pub use email::{Email, EmailError};
pub use id::*;
pub use identifier::{Identifier, IdentifierError};
pub use money::Money;
pub use phone::{Phone, PhoneError};
