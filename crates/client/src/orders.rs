//! Order history and the order page projection.

use std::sync::Arc;

use loomline_core::{OrderId, payment_prompt_visible};

use crate::cache::{QueryClient, QueryKey, keys};
use crate::error::ClientError;
use crate::models::{Order, OrderItem, UpiSettings};
use crate::transport::{Transport, fetch_get};

pub struct OrderService<'a, T> {
    cache: &'a QueryClient,
    transport: &'a Arc<T>,
}

impl<'a, T: Transport> OrderService<'a, T> {
    pub const fn new(cache: &'a QueryClient, transport: &'a Arc<T>) -> Self {
        Self { cache, transport }
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// [`ClientError::Unauthorized`] without a session.
    pub async fn list(&self) -> Result<Vec<Order>, ClientError> {
        let key = QueryKey::new(keys::ORDERS);
        self.cache
            .read_as(&key, || fetch_get(self.transport, &key))
            .await
    }

    /// # Errors
    ///
    /// [`ClientError::NotFound`] for someone else's order.
    pub async fn get(&self, id: OrderId) -> Result<Order, ClientError> {
        let key = keys::order(id);
        self.cache
            .read_as(&key, || fetch_get(self.transport, &key))
            .await
    }

    /// Payment details for orders awaiting payment.
    ///
    /// # Errors
    ///
    /// Transport and server errors.
    pub async fn upi_settings(&self) -> Result<UpiSettings, ClientError> {
        let key = QueryKey::new(keys::UPI_SETTINGS);
        self.cache
            .read_as(&key, || fetch_get(self.transport, &key))
            .await
    }
}

/// An order ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderView {
    pub id: OrderId,
    /// e.g. "#1024"
    pub reference: String,
    pub status: String,
    pub placed_on: String,
    pub address: String,
    pub lines: Vec<OrderLineView>,
    pub subtotal: String,
    pub tax: String,
    pub shipping: String,
    pub total: String,
    /// Show the "verify your UPI payment" prompt.
    pub show_payment_prompt: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineView {
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl From<&OrderItem> for OrderLineView {
    fn from(item: &OrderItem) -> Self {
        Self {
            name: item.name.clone(),
            image: item.image.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price.to_string(),
            line_total: item.line_total.to_string(),
        }
    }
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        let status = if order.status_label.is_empty() {
            order.status.clone()
        } else {
            order.status_label.clone()
        };

        Self {
            id: order.id,
            reference: format!("#{}", order.id),
            show_payment_prompt: payment_prompt_visible(&status),
            status,
            placed_on: order.created_at.format("%d %b %Y").to_string(),
            address: order.address.clone(),
            lines: order.items.iter().map(OrderLineView::from).collect(),
            subtotal: order.subtotal.to_string(),
            tax: order.tax.to_string(),
            shipping: order.shipping.to_string(),
            total: order.total.to_string(),
        }
    }
}
