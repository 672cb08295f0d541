//! Application root.
//!
//! [`App`] owns the cache and the transport; everything else borrows them
//! through the service accessors.

use std::sync::Arc;

use crate::cache::{CachePolicy, QueryClient};
use crate::cart::CartService;
use crate::catalog::CatalogService;
use crate::checkout::CheckoutService;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::guard::{Navigation, Route, route_guard};
use crate::orders::OrderService;
use crate::session::SessionProvider;
use crate::transport::{HttpTransport, Transport};
use crate::watchlist::WatchlistService;

pub struct App<T> {
    cache: Arc<QueryClient>,
    transport: Arc<T>,
}

impl<T> Clone for App<T> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl App<HttpTransport> {
    /// Connect to the configured storefront.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Network`] if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(config)?;
        tracing::debug!(api_url = %config.api_url, "Client configured");
        Ok(Self::new(transport, config.cache_policy()))
    }
}

impl<T: Transport> App<T> {
    #[must_use]
    pub fn new(transport: T, policy: CachePolicy) -> Self {
        Self {
            cache: Arc::new(QueryClient::new(policy)),
            transport: Arc::new(transport),
        }
    }

    #[must_use]
    pub const fn cache(&self) -> &Arc<QueryClient> {
        &self.cache
    }

    #[must_use]
    pub fn session(&self) -> SessionProvider<'_, T> {
        SessionProvider::new(&self.cache, &self.transport)
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_, T> {
        CatalogService::new(&self.cache, &self.transport)
    }

    #[must_use]
    pub fn cart(&self) -> CartService<'_, T> {
        CartService::new(&self.cache, &self.transport)
    }

    #[must_use]
    pub fn checkout(&self) -> CheckoutService<'_, T> {
        CheckoutService::new(&self.cache, &self.transport)
    }

    #[must_use]
    pub fn orders(&self) -> OrderService<'_, T> {
        OrderService::new(&self.cache, &self.transport)
    }

    #[must_use]
    pub fn watchlist(&self) -> WatchlistService<'_, T> {
        WatchlistService::new(&self.cache, &self.transport)
    }

    /// Run the route guard for the current visitor.
    pub async fn navigate(&self, route: Route, requested_path: &str) -> Navigation {
        let role = self.session().current_user().await.map(|user| user.role);
        route_guard(role, route, requested_path)
    }

    /// The app window regained focus.
    pub async fn on_focus(&self) {
        self.cache.revalidate_on_focus().await;
    }

    /// Drop all cached data.
    pub async fn stop(&self) {
        self.cache.clear().await;
        tracing::debug!("Client cache cleared");
    }
}
