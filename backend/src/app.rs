//! Application state and initialization
//!
//! This module wires the database, the reward dispatcher and every service
//! together. All services are made available through `AppState`.

use crate::clock::{Clock, SystemClock};
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::rewards::EventDispatcher;
use crate::services::{
    AppSettings, CategoryService, DisciplineService, FocusSessionService, HobbyService,
    JournalService, NotificationService, ReminderService, RewardService, SettingsService,
    ShoppingService, TaskService, UserService,
};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub settings: AppSettings,
    pub repo: Repository,
    pub users: UserService,
    pub categories: CategoryService,
    pub tasks: TaskService,
    pub focus: FocusSessionService,
    pub rewards: RewardService,
    pub discipline: DisciplineService,
    pub notifications: NotificationService,
    pub reminders: ReminderService,
    pub hobbies: HobbyService,
    pub journal: JournalService,
    pub shopping: ShoppingService,
}

impl AppState {
    /// Load settings from `data_dir`, open the database and build every
    /// service on the system clock
    pub async fn initialize(data_dir: &Path) -> Result<Self> {
        tracing::info!("Initializing application in {:?}", data_dir);

        std::fs::create_dir_all(data_dir)?;
        // Load settings
        let settings = SettingsService::new(data_dir).load().await?;

        // Initialize database
        let db_path: PathBuf = data_dir.join(&settings.database_file);
        let pool = create_pool(&db_path).await?;

        let state = Self::from_pool(pool, settings, Arc::new(SystemClock));
        tracing::info!("Application initialized successfully");
        Ok(state)
    }

    /// Build every service over an existing pool
    pub fn from_pool(pool: SqlitePool, settings: AppSettings, clock: Arc<dyn Clock>) -> Self {
        let repo = Repository::new(pool);
        let dispatcher = Arc::new(EventDispatcher::with_default_rules());
        let discipline = DisciplineService::new(repo.clone(), clock.clone());

        Self {
            users: UserService::new(repo.clone(), clock.clone(), settings.default_salary_cents),
            categories: CategoryService::new(repo.clone(), clock.clone()),
            tasks: TaskService::new(repo.clone(), dispatcher.clone(), clock.clone()),
            focus: FocusSessionService::new(repo.clone(), dispatcher, clock.clone()),
            rewards: RewardService::new(repo.clone(), discipline.clone(), clock.clone()),
            discipline,
            notifications: NotificationService::new(repo.clone()),
            reminders: ReminderService::new(repo.clone(), clock.clone()),
            hobbies: HobbyService::new(repo.clone(), clock.clone(), settings.hobby_inactivity_days),
            journal: JournalService::new(repo.clone(), clock.clone()),
            shopping: ShoppingService::new(repo.clone(), clock, settings.expiry_warning_days),
            repo,
            settings,
        }
    }
}
