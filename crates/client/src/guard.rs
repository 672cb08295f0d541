//! Route guard.
//!
//! Views are entered only after the guard says so; the decision comes from
//! the same [`Access`] table the server's extractors use.

use loomline_core::{Access, Capability, DenyReason, Role};

/// The screens of the storefront app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Category,
    Product,
    Login,
    Register,
    ForgotPassword,
    ResetPassword,
    Account,
    Watchlist,
    Cart,
    Checkout,
    Orders,
    Order,
    Admin,
}

impl Route {
    /// What the visitor must be allowed to do to open this route.
    #[must_use]
    pub const fn capability(self) -> Capability {
        match self {
            Self::Home
            | Self::Category
            | Self::Product
            | Self::Login
            | Self::Register
            | Self::ForgotPassword
            | Self::ResetPassword => Capability::Browse,
            Self::Account | Self::Watchlist | Self::Orders | Self::Order => {
                Capability::ManageAccount
            }
            Self::Cart | Self::Checkout => Capability::Checkout,
            Self::Admin => Capability::ManageStore,
        }
    }
}

/// What the router should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    /// Send the visitor to the login page, then back to `return_to`.
    RedirectToLogin { return_to: String },
    /// Logged in, but not allowed here.
    Forbidden,
}

impl Navigation {
    /// Login page URL for a redirect, e.g. `/login?returnTo=%2Fcart`.
    #[must_use]
    pub fn login_url(&self) -> Option<String> {
        match self {
            Self::RedirectToLogin { return_to } => {
                let query = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("returnTo", return_to)
                    .finish();
                Some(format!("/login?{query}"))
            }
            Self::Proceed | Self::Forbidden => None,
        }
    }
}

/// Decide whether a visitor with `role` (`None` when logged out) may open
/// `route`, requested at `requested_path`.
#[must_use]
pub fn route_guard(role: Option<Role>, route: Route, requested_path: &str) -> Navigation {
    match Access::evaluate(role, route.capability()) {
        Access::Allow => Navigation::Proceed,
        Access::Deny(DenyReason::Unauthenticated) => Navigation::RedirectToLogin {
            return_to: requested_path.to_owned(),
        },
        Access::Deny(DenyReason::Forbidden) => Navigation::Forbidden,
    }
}
