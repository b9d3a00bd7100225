//! Database models
//!
//! Rust structs representing database entities.
//! All models use serde for serialization to API clients.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// Free-form key/value data with no schema enforced at this layer
pub type Metadata = serde_json::Map<String, serde_json::Value>;

// ===== Enumerations =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    Paused,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// Built-in focus mode presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum FocusPreset {
    Pomodoro,
    Flow,
    Mini,
    Shuffle,
    #[default]
    Custom,
}

impl FocusPreset {
    /// Parse a client-supplied mode key; free-text keys have no preset
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "pomodoro" => Some(FocusPreset::Pomodoro),
            "flow" => Some(FocusPreset::Flow),
            "mini" => Some(FocusPreset::Mini),
            "shuffle" => Some(FocusPreset::Shuffle),
            "custom" => Some(FocusPreset::Custom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ItemType {
    #[default]
    Needed,
    Impulsive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum NotificationType {
    Reminder,
    TaskComplete,
    LevelUp,
    BadgeEarned,
    ReminderDue,
    WeeklyDiscipline,
}

// ===== Users and categories =====

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Monthly budget used by the impulsive-purchase check
    pub salary_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// Task category. Rows with no owner are global seed categories.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: String,
    pub user_id: Option<String>,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

// ===== Tasks =====

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub category_id: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub estimated_minutes: Option<i64>,
    pub preferred_datetime: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub custom_fields: Json<Metadata>,
    pub frozen: bool,
    pub preferred_focus_mode: Option<String>,
    pub shopping_item_id: Option<String>,
    pub hobby_id: Option<String>,
    pub completed: bool,
    /// Set the first time the task reaches `done`, never cleared afterwards
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create task request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category_id: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    pub estimated_minutes: Option<i64>,
    pub preferred_datetime: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub preferred_focus_mode: Option<String>,
    pub shopping_item_id: Option<String>,
    pub hobby_id: Option<String>,
    #[serde(default)]
    pub custom_fields: Metadata,
}

/// Partial task update; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub estimated_minutes: Option<i64>,
    pub preferred_datetime: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub preferred_focus_mode: Option<String>,
    pub custom_fields: Option<Metadata>,
}

/// Optional filters for listing tasks
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub category_id: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
}

// ===== Focus =====

/// A user's focus mode, usually one per preset
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FocusMode {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub preset: FocusPreset,
    /// e.g. work_seconds, break_seconds
    pub config: Json<Metadata>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFocusModeRequest {
    pub name: String,
    #[serde(default)]
    pub preset: FocusPreset,
    #[serde(default)]
    pub config: Metadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FocusSession {
    pub id: String,
    pub user_id: String,
    pub mode_id: Option<String>,
    pub mode_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub interruptions: i64,
    pub distractions_resisted: i64,
    /// Derived once, when `ended_at` is first set
    pub effective_minutes: Option<i64>,
    pub notes: String,
    pub is_hyperfocus: bool,
    /// Shuffle sessions keep their chosen task order here
    pub metadata: Json<Metadata>,
}

/// A session that already happened, logged after the fact
#[derive(Debug, Clone, Deserialize)]
pub struct RecordSessionRequest {
    pub mode_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    #[serde(default)]
    pub interruptions: i64,
    #[serde(default)]
    pub distractions_resisted: i64,
    #[serde(default)]
    pub notes: String,
}

// ===== Hobbies =====

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Hobby {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: String,
    pub note: String,
    pub frozen: bool,
    pub freeze_reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateHobbyRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HobbyActivity {
    pub id: String,
    pub user_id: String,
    pub hobby_id: String,
    pub timestamp: DateTime<Utc>,
    pub notes: String,
    pub custom_data: Json<Metadata>,
    pub created_at: DateTime<Utc>,
}

// ===== Reminders, notes, moods =====

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reminder {
    pub id: String,
    pub user_id: String,
    pub task_id: Option<String>,
    pub title: String,
    pub note: String,
    pub remind_at: Option<DateTime<Utc>>,
    pub repeat_rule: String,
    pub frozen: bool,
    pub freeze_reason: String,
    pub snoozed_until: Option<DateTime<Utc>>,
    /// Prevents duplicate notifications
    pub notified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateReminderRequest {
    pub title: String,
    #[serde(default)]
    pub note: String,
    pub task_id: Option<String>,
    pub remind_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub repeat_rule: String,
}

/// Journal entry, optionally tied to a task or delivered to the future self
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub task_id: Option<String>,
    pub mood_at_time: String,
    pub send_to_future: bool,
    pub future_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub title: String,
    pub body: String,
    pub task_id: Option<String>,
    #[serde(default)]
    pub mood_at_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MoodLog {
    pub id: String,
    pub user_id: String,
    pub mood: String,
    pub rating: Option<i64>,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

// ===== Shopping and money =====

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShoppingItem {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub note: String,
    pub expiry_date: Option<NaiveDate>,
    pub quantity: f64,
    pub unit: String,
    pub estimated_cost_cents: Option<i64>,
    pub purchased: bool,
    pub item_type: ItemType,
    pub priority: Priority,
    pub category_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateShoppingItemRequest {
    pub name: String,
    #[serde(default)]
    pub note: String,
    pub expiry_date: Option<NaiveDate>,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    pub estimated_cost_cents: Option<i64>,
    #[serde(default)]
    pub item_type: ItemType,
    #[serde(default)]
    pub priority: Priority,
    pub category_id: Option<String>,
}

fn default_quantity() -> f64 {
    1.0
}

impl Default for CreateShoppingItemRequest {
    fn default() -> Self {
        Self {
            name: String::new(),
            note: String::new(),
            expiry_date: None,
            quantity: default_quantity(),
            unit: String::new(),
            estimated_cost_cents: None,
            item_type: ItemType::default(),
            priority: Priority::default(),
            category_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Expense {
    pub id: String,
    pub user_id: String,
    pub shopping_item_id: Option<String>,
    pub amount_cents: i64,
    pub currency: String,
    pub category: String,
    pub note: String,
    pub spent_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateExpenseRequest {
    pub shopping_item_id: Option<String>,
    pub amount_cents: i64,
    pub currency: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub note: String,
    /// Defaults to now
    pub spent_at: Option<DateTime<Utc>>,
}

// ===== Rewards =====

/// Achievement, issued at most once per (user, key)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Badge {
    pub id: String,
    pub user_id: String,
    pub key: String,
    pub title: String,
    pub description: String,
    pub earned_at: DateTime<Utc>,
}

/// Per-user XP, coins and level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RewardSummary {
    pub user_id: String,
    pub xp: i64,
    pub coins: i64,
    pub level: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub related_task_id: Option<String>,
    pub related_reminder_id: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification about to be appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub related_task_id: Option<String>,
    pub related_reminder_id: Option<String>,
}
