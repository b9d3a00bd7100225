//! Services module
//!
//! Business logic that coordinates between callers and the repository.
//! Every operation takes the acting user's id explicitly.

pub mod discipline;
pub mod focus;
pub mod hobbies;
pub mod journal;
pub mod notifications;
pub mod rewards;
pub mod settings;
pub mod shopping;
pub mod tasks;
pub mod users;

pub use discipline::DisciplineService;
pub use focus::FocusSessionService;
pub use hobbies::HobbyService;
pub use journal::JournalService;
pub use notifications::{NotificationService, ReminderService};
pub use rewards::RewardService;
pub use settings::{AppSettings, SettingsService};
pub use shopping::ShoppingService;
pub use tasks::TaskService;
pub use users::{CategoryService, UserService};
