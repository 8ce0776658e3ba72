//! Settings command module
//!
//! Handles application settings persistence.

use crate::shared::error::AppResult;
use crate::shared::settings::AppSettings;

/// Get current application settings
pub async fn get_settings() -> AppResult<AppSettings> {
    AppSettings::load().await
}

/// Save application settings; storage changes apply on next launch
pub async fn save_settings(settings: AppSettings) -> AppResult<()> {
    settings.save().await
}
