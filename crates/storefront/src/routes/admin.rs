//! Back-office routes under `/api/admin`.
//!
//! Every handler takes [`RequireAdmin`], so customers get 403 and anonymous
//! callers 401 before any work happens.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use loomline_core::{BannerId, CategoryId, OrderId, OrderStatus, ProductId};

use crate::db::{
    BannerRepository, CategoryRepository, OrderRepository, ProductRepository, SettingsRepository,
};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::catalog::{BannerInput, CategoryInput, ProductInput};
use crate::models::{Banner, Category, Order, Product, UpiSettings};
use crate::services::CheckoutService;
use crate::state::AppState;

// =============================================================================
// Validation
// =============================================================================

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

fn validate_product(input: &ProductInput) -> Result<()> {
    require("Name", &input.name)?;
    if input.price.is_negative() {
        return Err(AppError::BadRequest("Price can't be negative".to_owned()));
    }
    if input.price.amount().normalize().scale() > 2 {
        return Err(AppError::BadRequest(
            "Price can have at most two decimal places".to_owned(),
        ));
    }
    if input.images.iter().any(|url| url.trim().is_empty()) {
        return Err(AppError::BadRequest("Image URLs can't be blank".to_owned()));
    }
    Ok(())
}

/// Slugs are lowercase ASCII letters, digits and dashes.
fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

fn validate_category(input: &CategoryInput) -> Result<()> {
    require("Name", &input.name)?;
    if !is_valid_slug(&input.slug) {
        return Err(AppError::BadRequest(
            "Slug may only contain lowercase letters, digits and dashes".to_owned(),
        ));
    }
    Ok(())
}

fn validate_banner(input: &BannerInput) -> Result<()> {
    require("Placement", &input.placement)?;
    require("Title", &input.title)?;
    require("Desktop image", &input.desktop_image_url)?;
    require("Mobile image", &input.mobile_image_url)
}

// =============================================================================
// Products
// =============================================================================

/// POST /api/admin/products
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    validate_product(&input)?;
    let product = ProductRepository::new(state.pool()).create(&input).await?;
    tracing::info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/admin/products/{id}
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>> {
    validate_product(&input)?;
    Ok(Json(ProductRepository::new(state.pool()).update(id, &input).await?))
}

/// DELETE /api/admin/products/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool()).delete(id).await?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Categories
// =============================================================================

/// POST /api/admin/categories
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn create_category(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CategoryInput>,
) -> Result<(StatusCode, Json<Category>)> {
    validate_category(&input)?;
    let category = CategoryRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/admin/categories/{id}
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update_category(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CategoryId>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<Category>> {
    validate_category(&input)?;
    Ok(Json(
        CategoryRepository::new(state.pool())
            .update(id, &input)
            .await?,
    ))
}

/// DELETE /api/admin/categories/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_category(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    CategoryRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Banners
// =============================================================================

/// Every banner across placements.
///
/// GET /api/admin/banners
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn banners(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<Banner>>> {
    Ok(Json(BannerRepository::new(state.pool()).list(None).await?))
}

/// POST /api/admin/banners
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn create_banner(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<BannerInput>,
) -> Result<(StatusCode, Json<Banner>)> {
    validate_banner(&input)?;
    let banner = BannerRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(banner)))
}

/// PUT /api/admin/banners/{id}
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update_banner(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<BannerId>,
    Json(input): Json<BannerInput>,
) -> Result<Json<Banner>> {
    validate_banner(&input)?;
    Ok(Json(BannerRepository::new(state.pool()).update(id, &input).await?))
}

/// DELETE /api/admin/banners/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_banner(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<BannerId>,
) -> Result<StatusCode> {
    BannerRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    /// Target status, in any of the accepted spellings ("verified", "Verified").
    pub status: String,
}

fn parse_status(raw: &str) -> Result<OrderStatus> {
    raw.parse::<OrderStatus>().map_err(AppError::BadRequest)
}

/// All orders, newest first, with the customer attached.
///
/// GET /api/admin/orders?status=
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Vec<Order>>> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(parse_status)
        .transpose()?;

    Ok(Json(OrderRepository::new(state.pool()).list_all(status).await?))
}

/// GET /api/admin/orders/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn order(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))
}

/// Advance an order through the status machine.
///
/// POST /api/admin/orders/{id}/status
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn update_order_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(req): Json<StatusChangeRequest>,
) -> Result<Json<Order>> {
    let to = parse_status(&req.status)?;
    let order = CheckoutService::new(state.pool(), &state.config().pricing)
        .update_order_status(id, to)
        .await?;
    Ok(Json(order))
}

// =============================================================================
// Settings
// =============================================================================

/// PUT /api/admin/settings/upi
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn update_upi(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(settings): Json<UpiSettings>,
) -> Result<Json<UpiSettings>> {
    require("UPI ID", &settings.upi_id)?;

    let settings = UpiSettings {
        upi_id: settings.upi_id.trim().to_owned(),
        qr_code_url: settings.qr_code_url.trim().to_owned(),
    };
    SettingsRepository::new(state.pool())
        .set(UpiSettings::KEY, &settings)
        .await?;

    Ok(Json(settings))
}

#[cfg(test)]
mod tests {
    use loomline_core::Money;
    use rust_decimal::Decimal;

    use super::*;

    fn product(price: Decimal) -> ProductInput {
        ProductInput {
            name: "Cotton kurta".to_owned(),
            description: None,
            price: Money::new(price),
            images: vec!["https://cdn.example/k.jpg".to_owned()],
            category_id: None,
        }
    }

    #[test]
    fn test_slug_validation() {
        assert!(is_valid_slug("mens-kurtas-2025"));
        assert!(!is_valid_slug("Mens"));
        assert!(!is_valid_slug("with space"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn test_product_validation() {
        assert!(validate_product(&product(Decimal::new(49950, 2))).is_ok());
        assert!(validate_product(&product(Decimal::new(-1, 0))).is_err());
        assert!(validate_product(&product(Decimal::new(1234, 3))).is_err());
        // Trailing zeros don't count as extra precision.
        assert!(validate_product(&product(Decimal::new(12_000, 3))).is_ok());

        let mut blank = product(Decimal::ONE);
        blank.name = "  ".to_owned();
        assert!(validate_product(&blank).is_err());
    }

    #[test]
    fn test_status_spellings() {
        assert_eq!(parse_status("Verified").ok(), Some(OrderStatus::Verified));
        assert_eq!(
            parse_status("pending payment").ok(),
            Some(OrderStatus::PendingPayment)
        );
        assert!(parse_status("shipped").is_err());
    }
}
