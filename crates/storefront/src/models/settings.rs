//! Store settings.

use serde::{Deserialize, Serialize};

/// Manual UPI payment details shown on the order page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpiSettings {
    pub upi_id: String,
    pub qr_code_url: String,
}

impl UpiSettings {
    /// Setting key in `storefront.setting`.
    pub const KEY: &'static str = "upi";
}
