//! Public store settings.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::SettingsRepository;
use crate::error::Result;
use crate::models::UpiSettings;
use crate::state::AppState;

/// UPI payment details. Empty strings until an admin sets them.
///
/// GET /api/settings/upi
#[instrument(skip(state))]
pub async fn upi(State(state): State<AppState>) -> Result<Json<UpiSettings>> {
    let settings = SettingsRepository::new(state.pool())
        .get::<UpiSettings>(UpiSettings::KEY)
        .await?
        .unwrap_or_default();
    Ok(Json(settings))
}
