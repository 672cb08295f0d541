//! Order repository.
//!
//! Orders are written once, at checkout, from the user's cart. Afterwards
//! only their status changes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use loomline_core::{Money, OrderId, OrderItemId, OrderStatus, PricedLine, PricingPolicy, UserId};

use super::cart::{CART_LINE_SELECT, CartLineRow};
use super::{RepositoryError, quantity_from_db, quantity_to_db};
use crate::models::cart::CartLine;
use crate::models::order::{Order, OrderCustomer, OrderItem, OrderItemRow, OrderRow};

const ORDER_COLUMNS: &str = "o.id, o.user_id, o.status::text AS status, o.address, \
     o.subtotal, o.tax, o.shipping, o.total, o.created_at";

/// Outcome of turning a cart into an order.
#[derive(Debug)]
pub enum CartCheckout {
    /// The cart had no lines; nothing was written.
    Empty,
    Placed(Order),
}

#[derive(sqlx::FromRow)]
struct OrderWithCustomerRow {
    #[sqlx(flatten)]
    order: OrderRow,
    #[sqlx(flatten)]
    customer: OrderCustomer,
}

#[derive(sqlx::FromRow)]
struct InsertedOrder {
    id: OrderId,
    created_at: DateTime<Utc>,
}

pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order from the user's cart in a single transaction.
    ///
    /// Locks the user and their cart lines, prices the lines at current
    /// product prices for the user's address, writes the order and its item
    /// snapshot, then empties the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn place_from_cart(
        &self,
        user_id: UserId,
        policy: &PricingPolicy,
    ) -> Result<CartCheckout, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent checkouts by the same user.
        let address: String =
            sqlx::query_scalar("SELECT address FROM storefront.user WHERE id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(RepositoryError::NotFound)?;

        let lines: Vec<CartLine> =
            sqlx::query_as::<_, CartLineRow>(&format!("{CART_LINE_SELECT} FOR UPDATE OF ci"))
                .bind(user_id)
                .fetch_all(&mut *tx)
                .await?
                .into_iter()
                .map(CartLine::try_from)
                .collect::<Result<_, _>>()?;

        if lines.is_empty() {
            return Ok(CartCheckout::Empty);
        }

        let priced: Vec<PricedLine> = lines.iter().map(CartLine::priced).collect();
        let totals = policy.price(&priced, &address);
        // Subtotal and shipping are already whole paise, so rounding only the
        // tax keeps total = subtotal + tax + shipping exact in storage.
        let tax = Money::new(totals.tax.rounded());
        let total = totals.subtotal + tax + totals.shipping;

        let inserted = sqlx::query_as::<_, InsertedOrder>(
            r"
            INSERT INTO storefront.order (user_id, address, subtotal, tax, shipping, total)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, created_at
            ",
        )
        .bind(user_id)
        .bind(&address)
        .bind(totals.subtotal)
        .bind(tax)
        .bind(totals.shipping)
        .bind(total)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for (position, line) in (0_i32..).zip(&lines) {
            let item_id: OrderItemId = sqlx::query_scalar(
                r"
                INSERT INTO storefront.order_item
                    (order_id, product_id, product_name, product_image, unit_price, quantity, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id
                ",
            )
            .bind(inserted.id)
            .bind(line.product.id)
            .bind(&line.product.name)
            .bind(line.product.image.as_deref())
            .bind(line.product.price)
            .bind(quantity_to_db(line.quantity)?)
            .bind(position)
            .fetch_one(&mut *tx)
            .await?;

            items.push(OrderItem {
                id: item_id,
                product_id: Some(line.product.id),
                name: line.product.name.clone(),
                image: line.product.image.clone(),
                quantity: line.quantity,
                unit_price: line.product.price,
                line_total: line.line_total,
            });
        }

        sqlx::query("DELETE FROM storefront.cart_item WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let status = OrderStatus::PendingPayment;
        Ok(CartCheckout::Placed(Order {
            id: inserted.id,
            user_id,
            status,
            status_label: status.label(),
            address,
            items,
            subtotal: totals.subtotal,
            tax,
            shipping: totals.shipping,
            total,
            created_at: inserted.created_at,
            customer: None,
        }))
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.order o \
             WHERE o.user_id = $1 ORDER BY o.created_at DESC, o.id DESC"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        let pairs = rows.into_iter().map(|r| (r, None)).collect();
        self.assemble(pairs).await
    }

    /// Every order, newest first, optionally filtered by status. Includes the customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_all(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS}, u.name, u.business_name, u.email, u.phone \
             FROM storefront.order o JOIN storefront.user u ON u.id = o.user_id \
             WHERE ($1::text IS NULL OR o.status::text = $1) \
             ORDER BY o.created_at DESC, o.id DESC"
        );
        let rows = sqlx::query_as::<_, OrderWithCustomerRow>(&sql)
            .bind(status.map(OrderStatus::as_str))
            .fetch_all(self.pool)
            .await?;

        let pairs = rows
            .into_iter()
            .map(|r| (r.order, Some(r.customer)))
            .collect();
        self.assemble(pairs).await
    }

    /// Get an order by ID, including the customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS}, u.name, u.business_name, u.email, u.phone \
             FROM storefront.order o JOIN storefront.user u ON u.id = o.user_id \
             WHERE o.id = $1"
        );
        let Some(row) = sqlx::query_as::<_, OrderWithCustomerRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
        else {
            return Ok(None);
        };

        Ok(self
            .assemble(vec![(row.order, Some(row.customer))])
            .await?
            .pop())
    }

    /// Change an order's status if it is still `from`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the status changed in the meantime.
    pub async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.order
            SET status = $3::storefront.order_status, updated_at = NOW()
            WHERE id = $1 AND status = $2::storefront.order_status
            ",
        )
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "order {id} is no longer {from}"
            )));
        }
        Ok(())
    }

    /// Attach items to order rows, preserving the row order.
    async fn assemble(
        &self,
        rows: Vec<(OrderRow, Option<OrderCustomer>)>,
    ) -> Result<Vec<Order>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|(r, _)| r.id.as_i64()).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_id, product_name, product_image, unit_price, quantity
            FROM storefront.order_item
            WHERE order_id = ANY($1)
            ORDER BY order_id, position
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut items: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for r in item_rows {
            let quantity = quantity_from_db(r.quantity)?;
            items.entry(r.order_id).or_default().push(OrderItem {
                id: r.id,
                product_id: r.product_id,
                name: r.product_name,
                image: r.product_image,
                quantity,
                unit_price: r.unit_price,
                line_total: PricedLine::new(r.unit_price, quantity).line_total(),
            });
        }

        rows.into_iter()
            .map(|(row, customer)| {
                let status = row
                    .status
                    .parse::<OrderStatus>()
                    .map_err(RepositoryError::DataCorruption)?;
                Ok(Order {
                    id: row.id,
                    user_id: row.user_id,
                    status,
                    status_label: status.label(),
                    address: row.address,
                    items: items.remove(&row.id).unwrap_or_default(),
                    subtotal: row.subtotal,
                    tax: row.tax,
                    shipping: row.shipping,
                    total: row.total,
                    created_at: row.created_at,
                    customer,
                })
            })
            .collect()
    }
}
