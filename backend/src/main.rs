// BunnySteps sweep
// Periodic pass over every user: fire due reminders and award the weekly
// discipline badge. Meant to run from cron or a systemd timer.

use anyhow::Context;
use bunnysteps::app::AppState;
use bunnysteps::services::SettingsService;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = std::env::var_os("BUNNYSTEPS_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./data"));

    let settings = SettingsService::new(&data_dir)
        .load()
        .await
        .with_context(|| format!("loading settings from {}", data_dir.display()))?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting BunnySteps sweep");

    let state = AppState::initialize(&data_dir)
        .await
        .context("initializing application state")?;

    // Visit every user; one failure must not stop the sweep
    let user_ids = state.users.list_user_ids().await?;
    let mut fired = 0;
    let mut failures = 0;

    for user_id in &user_ids {
        match state.reminders.fire_due_reminders(user_id).await {
            Ok(count) => fired += count,
            Err(e) => {
                failures += 1;
                tracing::error!("Reminder sweep failed for {}: {}", user_id, e);
            }
        }

        if let Err(e) = state.discipline.check_weekly_discipline(user_id).await {
            failures += 1;
            tracing::warn!("Discipline check failed for {}: {}", user_id, e);
        }
    }

    tracing::info!(
        "Sweep finished: {} users, {} reminders fired, {} failures",
        user_ids.len(),
        fired,
        failures
    );

    Ok(())
}
