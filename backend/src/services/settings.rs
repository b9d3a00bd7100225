//! Settings service
//!
//! Runtime settings persisted as JSON in the data directory.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Deployment-specific settings. Missing fields fall back to their defaults,
/// so older settings files keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// SQLite file name, relative to the data directory
    #[serde(default = "default_database_file")]
    pub database_file: String,
    /// `tracing` filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Monthly budget given to new users
    #[serde(default = "default_salary_cents")]
    pub default_salary_cents: i64,
    /// Items expiring within this many days show up as expiring
    #[serde(default = "default_expiry_warning_days")]
    pub expiry_warning_days: i64,
    /// Hobbies without activity for this long count as inactive
    #[serde(default = "default_hobby_inactivity_days")]
    pub hobby_inactivity_days: i64,
}

fn default_database_file() -> String {
    "bunnysteps.db".to_string()
}

fn default_log_filter() -> String {
    "bunnysteps=debug,info".to_string()
}

fn default_salary_cents() -> i64 {
    120_000 // 1200.00
}

fn default_expiry_warning_days() -> i64 {
    3
}

fn default_hobby_inactivity_days() -> i64 {
    30
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            database_file: default_database_file(),
            log_filter: default_log_filter(),
            default_salary_cents: default_salary_cents(),
            expiry_warning_days: default_expiry_warning_days(),
            hobby_inactivity_days: default_hobby_inactivity_days(),
        }
    }
}

/// Service for loading and saving `settings.json`
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            settings_path: data_dir.join("settings.json"),
        }
    }

    /// Load settings from disk or create default if not exists
    pub async fn load(&self) -> Result<AppSettings> {
        if !self.settings_path.exists() {
            tracing::info!("Settings file not found, creating default settings");
            let default = AppSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        // Read and parse settings
        let content = fs::read_to_string(&self.settings_path).await?;
        let settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Generic(format!("Failed to parse settings: {}", e)))?;

        Ok(settings)
    }

    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        let content = serde_json::to_string_pretty(settings)?;

        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_service() -> (SettingsService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let service = SettingsService::new(temp_dir.path());
        (service, temp_dir)
    }

    #[tokio::test]
    async fn test_default_settings_created_on_load() {
        let (service, temp) = create_test_service();

        let settings = service.load().await.unwrap();

        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.database_file, "bunnysteps.db");
        assert_eq!(settings.default_salary_cents, 120_000);
        assert!(temp.path().join("settings.json").exists());
    }

    #[tokio::test]
    async fn test_settings_persistence() {
        let temp_dir = TempDir::new().unwrap();

        {
            let service = SettingsService::new(temp_dir.path());
            let updated = AppSettings {
                expiry_warning_days: 5,
                ..AppSettings::default()
            };
            service.save(&updated).await.unwrap();
        }

        let service = SettingsService::new(temp_dir.path());
        assert_eq!(service.load().await.unwrap().expiry_warning_days, 5);
    }

    #[tokio::test]
    async fn test_missing_fields_use_defaults() {
        let (service, temp) = create_test_service();
        std::fs::write(
            temp.path().join("settings.json"),
            r#"{ "hobby_inactivity_days": 14 }"#,
        )
        .unwrap();

        let settings = service.load().await.unwrap();

        assert_eq!(settings.hobby_inactivity_days, 14);
        assert_eq!(settings.log_filter, "bunnysteps=debug,info");
    }

    #[tokio::test]
    async fn test_malformed_settings_rejected() {
        let (service, temp) = create_test_service();
        std::fs::write(temp.path().join("settings.json"), "not json").unwrap();

        assert!(matches!(service.load().await, Err(AppError::Generic(_))));
    }
}
