//! Cart repository.
//!
//! A cart is the set of `storefront.cart_item` rows owned by one user. Rows
//! always have `quantity >= 1`; setting a quantity of zero deletes the row.

use sqlx::PgPool;

use loomline_core::{Money, ProductId, UserId};

use super::{RepositoryError, map_foreign_key_violation, quantity_from_db, quantity_to_db};
use crate::models::cart::CartLine;
use crate::models::catalog::ProductSummary;

/// A cart row joined with the product's current price.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CartLineRow {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub image: Option<String>,
    pub quantity: i32,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(r: CartLineRow) -> Result<Self, Self::Error> {
        let product = ProductSummary {
            id: r.product_id,
            name: r.name,
            price: r.price,
            image: r.image,
        };
        Ok(Self::new(product, quantity_from_db(r.quantity)?))
    }
}

/// Most units of one product per line.
pub const MAX_LINE_QUANTITY: u32 = 10_000;

pub(crate) const CART_LINE_SELECT: &str = r"
    SELECT p.id AS product_id, p.name, p.price, p.images[1] AS image, ci.quantity
    FROM storefront.cart_item ci
    JOIN storefront.product p ON p.id = ci.product_id
    WHERE ci.user_id = $1
    ORDER BY ci.created_at, p.id
";

fn over_limit() -> RepositoryError {
    RepositoryError::Invalid(format!(
        "A cart line can't exceed {MAX_LINE_QUANTITY} units"
    ))
}

pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's cart lines in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        sqlx::query_as::<_, CartLineRow>(CART_LINE_SELECT)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(CartLine::try_from)
            .collect()
    }

    /// Add `quantity` of a product, merging with an existing line.
    ///
    /// The merge is refused, leaving the line unchanged, when it would take
    /// the line past [`MAX_LINE_QUANTITY`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist and
    /// `RepositoryError::Invalid` if the merged quantity is over the limit.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO storefront.cart_item (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = storefront.cart_item.quantity + EXCLUDED.quantity,
                          updated_at = NOW()
            WHERE storefront.cart_item.quantity + EXCLUDED.quantity <= $4
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity_to_db(quantity)?)
        .bind(quantity_to_db(MAX_LINE_QUANTITY)?)
        .execute(self.pool)
        .await
        .map_err(map_foreign_key_violation)?;

        if result.rows_affected() == 0 {
            return Err(over_limit());
        }
        Ok(())
    }

    /// Set a line's quantity; zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        if quantity == 0 {
            return self.remove(user_id, product_id).await;
        }

        sqlx::query(
            r"
            INSERT INTO storefront.cart_item (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = NOW()
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity_to_db(quantity)?)
        .execute(self.pool)
        .await
        .map_err(map_foreign_key_violation)?;

        Ok(())
    }

    /// Remove a line. Removing an absent line is not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM storefront.cart_item WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM storefront.cart_item WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_over_limit_names_the_cap() {
        let RepositoryError::Invalid(msg) = over_limit() else {
            panic!("expected an invalid-input error");
        };
        assert_eq!(msg, "A cart line can't exceed 10000 units");
    }

    #[test]
    fn test_cap_fits_an_integer_column_twice() {
        // The merge adds two capped quantities before comparing.
        let doubled = quantity_to_db(MAX_LINE_QUANTITY).unwrap().checked_mul(2);
        assert!(doubled.is_some());
    }
}
