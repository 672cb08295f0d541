//! In-memory [`Transport`] for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use reqwest::Method;
use serde_json::Value;

use crate::error::ClientError;
use crate::transport::Transport;

type Reply = Result<Value, ClientError>;

/// Replies with queued responses per `(method, path)` and records every call.
///
/// The last queued reply for a route is repeated once the queue runs dry.
#[derive(Default)]
pub(crate) struct FakeTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    calls: Mutex<Vec<(Method, String, Option<Value>)>>,
    latency: Duration,
}

#[allow(clippy::unwrap_used)]
impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every reply takes `latency` (use with a paused clock).
    pub(crate) fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub(crate) fn reply(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_owned()))
            .or_default()
            .push_back(reply);
        self
    }

    pub(crate) fn calls(&self) -> Vec<(Method, String)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(m, p, _)| (m.clone(), p.clone()))
            .collect()
    }

    pub(crate) fn count(&self, method: &Method, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|(m, p)| m == method && p == path)
            .count()
    }

    pub(crate) fn body_of(&self, method: &Method, path: &str) -> Option<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(m, p, _)| m == method && p == path)
            .and_then(|(_, _, body)| body.clone())
    }

    fn next_reply(&self, method: &Method, path: &str) -> Reply {
        let mut routes = self.routes.lock().unwrap();
        let Some(queue) = routes.get_mut(&(method.clone(), path.to_owned())) else {
            return Err(ClientError::NotFound(format!("no fake route for {method} {path}")));
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        }
    }
}

impl Transport for FakeTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        #[allow(clippy::unwrap_used)]
        self.calls
            .lock()
            .unwrap()
            .push((method.clone(), path.to_owned(), body));

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.next_reply(&method, path)
    }
}

/// Server-shaped JSON bodies.
pub(crate) mod fixtures {
    use serde_json::{Value, json};

    pub(crate) fn user(id: i64, email: &str, role: &str) -> Value {
        json!({
            "id": id,
            "email": email,
            "phone": "+919876543210",
            "name": "Asha Mehta",
            "businessName": "Mehta Textiles",
            "address": "12 MG Road, Pune",
            "role": role,
            "createdAt": "2025-01-10T09:30:00Z",
            "updatedAt": "2025-01-10T09:30:00Z"
        })
    }

    /// A cart of `(product id, price, quantity)` lines priced for a
    /// non-Surat address.
    pub(crate) fn cart(lines: &[(i64, i64, u32)]) -> Value {
        let items: Vec<Value> = lines
            .iter()
            .map(|&(id, price, quantity)| {
                json!({
                    "product": {"id": id, "name": format!("Kurta {id}"), "price": format!("{price}.00"), "image": null},
                    "quantity": quantity,
                    "lineTotal": format!("{}.00", price * i64::from(quantity))
                })
            })
            .collect();
        let subtotal: i64 = lines.iter().map(|&(_, p, q)| p * i64::from(q)).sum();
        let item_count: u32 = lines.iter().map(|&(_, _, q)| q).sum();
        let (tax, shipping) = if subtotal == 0 { (0, 0) } else { (subtotal * 18 / 100, 100) };

        json!({
            "items": items,
            "itemCount": item_count,
            "totals": {
                "subtotal": format!("{subtotal}.00"),
                "tax": format!("{tax}.00"),
                "shipping": format!("{shipping}.00"),
                "total": format!("{}.00", subtotal + tax + shipping)
            }
        })
    }

    pub(crate) fn order(id: i64, status: &str, label: &str) -> Value {
        json!({
            "id": id,
            "userId": 1,
            "status": status,
            "statusLabel": label,
            "address": "12 MG Road, Pune",
            "items": [{
                "id": 90,
                "productId": 4,
                "name": "Linen shirt",
                "image": "https://cdn.loomline.in/p/4.jpg",
                "quantity": 2,
                "unitPrice": "500.00",
                "lineTotal": "1000.00"
            }],
            "subtotal": "1000.00",
            "tax": "180.00",
            "shipping": "100.00",
            "total": "1280.00",
            "createdAt": "2025-03-02T11:00:00Z"
        })
    }
}
