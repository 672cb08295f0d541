//! Roles, capabilities and the access guard.
//!
//! Every protected view or route asks one question before it runs:
//! "may this (possibly anonymous) caller use this capability?". The answer is
//! an [`Access`] value that the server's extractors and the client's router
//! turn into a 401/403 or a redirect.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account role. The only authorization axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A wholesale buyer.
    #[default]
    Customer,
    /// Store staff with back-office access.
    Admin,
}

/// Something a caller may want to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Read the public catalog, categories and banners.
    Browse,
    /// View and edit one's own profile, watchlist and orders.
    ManageAccount,
    /// Keep a cart and place orders.
    Checkout,
    /// Back-office: catalog, banners, orders and settings.
    ManageStore,
}

impl Role {
    /// Capability predicate.
    #[must_use]
    pub const fn can(self, capability: Capability) -> bool {
        match capability {
            Capability::Browse | Capability::ManageAccount | Capability::Checkout => true,
            Capability::ManageStore => matches!(self, Self::Admin),
        }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Why access was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No one is logged in; send them to the login page.
    Unauthenticated,
    /// Logged in, but the role lacks the capability.
    Forbidden,
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny(DenyReason),
}

impl Access {
    /// Decide whether `role` (or an anonymous caller for `None`) may use
    /// `capability`.
    #[must_use]
    pub const fn evaluate(role: Option<Role>, capability: Capability) -> Self {
        match (role, capability) {
            (_, Capability::Browse) => Self::Allow,
            (None, _) => Self::Deny(DenyReason::Unauthenticated),
            (Some(role), capability) if role.can(capability) => Self::Allow,
            (Some(_), _) => Self::Deny(DenyReason::Forbidden),
        }
    }

    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ALL: [Capability; 4] = [
        Capability::Browse,
        Capability::ManageAccount,
        Capability::Checkout,
        Capability::ManageStore,
    ];

    #[test]
    fn test_anonymous_may_only_browse() {
        for capability in ALL {
            let expected = if capability == Capability::Browse {
                Access::Allow
            } else {
                Access::Deny(DenyReason::Unauthenticated)
            };
            assert_eq!(Access::evaluate(None, capability), expected);
        }
    }

    #[test]
    fn test_customer_is_forbidden_from_back_office() {
        assert_eq!(
            Access::evaluate(Some(Role::Customer), Capability::ManageStore),
            Access::Deny(DenyReason::Forbidden)
        );
        assert!(Access::evaluate(Some(Role::Customer), Capability::Checkout).is_allowed());
    }

    #[test]
    fn test_admin_may_do_everything() {
        assert!(ALL
            .into_iter()
            .all(|c| Access::evaluate(Some(Role::Admin), c).is_allowed()));
    }

    #[test]
    fn test_role_round_trips_through_text() {
        for role in [Role::Customer, Role::Admin] {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
        assert!("Admin".parse::<Role>().is_err());
    }
}
