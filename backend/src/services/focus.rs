//! Focus session service
//!
//! Session lifecycle is `running -> ended`, and the end transition happens
//! exactly once. `effective_minutes` is derived at that moment and the
//! session reward is settled in the same transaction.

use crate::clock::{day_bounds, Clock};
use crate::config::{
    ADAPTIVE_HISTORY_LIMIT, DEFAULT_POMODORO_BREAK_SECONDS, DEFAULT_POMODORO_WORK_SECONDS,
    FLOW_MODE_KEY, FLOW_SESSIONS_MAX_DAILY, MAX_RECORDED_SESSION_HOURS, MINI_SESSION_PROMPT,
    MINI_SUGGESTED_MINUTES, SHUFFLE_MODE_KEY,
};
use crate::database::repository::{attach_tasks, fetch_owned, finish_session, insert_session};
use crate::database::{
    CreateFocusModeRequest, FocusMode, FocusPreset, FocusSession, Metadata, RecordSessionRequest,
    Repository, Task,
};
use crate::error::{AppError, Result};
use crate::rewards::{apply_effects, DomainEvent, EventDispatcher};
use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use serde::Serialize;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub mode: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlowAllowance {
    pub allowed: bool,
    pub current_count: i64,
    pub max_daily: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShuffledTask {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShuffleResult {
    /// Owned tasks among the requested ids
    pub selected: Vec<ShuffledTask>,
    /// Every requested id, in random order
    pub random_order: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MiniInfo {
    pub suggested_durations: Vec<i64>,
    pub bunny_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdaptiveRecommendation {
    pub recommended_length: i64,
    pub message: String,
}

/// Whole minutes between two instants, never negative
pub fn effective_minutes(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> i64 {
    (ended_at - started_at).num_seconds().div_euclid(60).max(0)
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Service for focus sessions and focus modes
#[derive(Clone)]
pub struct FocusSessionService {
    repo: Repository,
    dispatcher: Arc<EventDispatcher>,
    clock: Arc<dyn Clock>,
}

impl FocusSessionService {
    pub fn new(repo: Repository, dispatcher: Arc<EventDispatcher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            dispatcher,
            clock,
        }
    }

    /// Start a running session. Task ids the user does not own are dropped.
    /// The daily flow limit is not checked here; see `flow_allowed_today`.
    pub async fn start(
        &self,
        user_id: &str,
        mode_key: &str,
        task_ids: &[String],
    ) -> Result<StartSessionResponse> {
        let mode_key = mode_key.trim();
        if mode_key.is_empty() {
            return Err(AppError::Validation("focus mode is required".to_string()));
        }

        // Prefer the user's own preset for the display name
        let mode = match FocusPreset::from_key(mode_key) {
            Some(preset) => self.repo.find_focus_mode(user_id, preset).await?,
            None => None,
        };

        // Shuffle sessions remember the order they were dealt
        let mut metadata = Metadata::new();
        if mode_key == SHUFFLE_MODE_KEY {
            let mut order = task_ids.to_vec();
            order.shuffle(&mut rand::thread_rng());
            metadata.insert("chosen_tasks".to_string(), Value::from(task_ids.to_vec()));
            metadata.insert("random_order".to_string(), Value::from(order));
        }

        let session = FocusSession {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            mode_id: mode.as_ref().map(|m| m.id.clone()),
            mode_name: mode
                .map(|m| m.name)
                .unwrap_or_else(|| mode_key.to_string()),
            started_at: self.clock.now(),
            ended_at: None,
            interruptions: 0,
            distractions_resisted: 0,
            effective_minutes: None,
            notes: String::new(),
            is_hyperfocus: mode_key == FLOW_MODE_KEY,
            metadata: Json(metadata),
        };

        let mut tx = self.repo.begin().await?;
        insert_session(&mut tx, &session).await?;
        let attached = attach_tasks(&mut tx, user_id, &session.id, task_ids).await?;
        tx.commit().await?;

        tracing::info!(
            "Focus session {} started in {} mode with {} task(s)",
            session.id,
            mode_key,
            attached
        );

        Ok(StartSessionResponse {
            session_id: session.id,
            mode: mode_key.to_string(),
            message: format!("{} session started.", capitalize(mode_key)),
        })
    }

    /// End a running session and return its effective minutes
    pub async fn end(&self, user_id: &str, session_id: &str) -> Result<i64> {
        let now = self.clock.now();
        let mut tx = self.repo.begin().await?;
        let session: FocusSession = fetch_owned(&mut tx, user_id, session_id).await?;

        if session.ended_at.is_some() {
            return Err(AppError::Conflict("session already ended".to_string()));
        }

        // Guarded on ended_at IS NULL
        let minutes = effective_minutes(session.started_at, now);
        if !finish_session(&mut tx, user_id, session_id, now, minutes).await? {
            return Err(AppError::Conflict("session already ended".to_string()));
        }
        self.settle_session(&mut tx, user_id, session_id, minutes, now)
            .await?;
        tx.commit().await?;

        tracing::info!("Focus session {} ended after {} minute(s)", session_id, minutes);
        Ok(minutes)
    }

    /// Log a session that already happened; it is rewarded once, on creation
    pub async fn record_session(
        &self,
        user_id: &str,
        req: RecordSessionRequest,
    ) -> Result<FocusSession> {
        let mode_name = req.mode_name.trim();
        if mode_name.is_empty() {
            return Err(AppError::Validation("focus mode is required".to_string()));
        }
        if req.ended_at < req.started_at {
            return Err(AppError::Validation(
                "session cannot end before it starts".to_string(),
            ));
        }
        if req.ended_at - req.started_at > Duration::hours(MAX_RECORDED_SESSION_HOURS) {
            return Err(AppError::Validation(format!(
                "a recorded session cannot exceed {} hours",
                MAX_RECORDED_SESSION_HOURS
            )));
        }

        let minutes = effective_minutes(req.started_at, req.ended_at);
        let session = FocusSession {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            mode_id: None,
            mode_name: mode_name.to_string(),
            started_at: req.started_at,
            ended_at: Some(req.ended_at),
            interruptions: req.interruptions,
            distractions_resisted: req.distractions_resisted,
            effective_minutes: Some(minutes),
            notes: req.notes,
            is_hyperfocus: mode_name.eq_ignore_ascii_case(FLOW_MODE_KEY),
            metadata: Json(Metadata::new()),
        };

        let now = self.clock.now();
        let mut tx = self.repo.begin().await?;
        insert_session(&mut tx, &session).await?;
        self.settle_session(&mut tx, user_id, &session.id, minutes, now)
            .await?;
        tx.commit().await?;

        tracing::info!("Recorded focus session {} ({} minutes)", session.id, minutes);
        Ok(session)
    }

    async fn settle_session(
        &self,
        conn: &mut SqliteConnection,
        user_id: &str,
        session_id: &str,
        effective_minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let event = DomainEvent::FocusSessionCompleted {
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
            effective_minutes,
        };
        let effects = self.dispatcher.dispatch(&event);
        apply_effects(conn, user_id, &effects, now).await?;
        Ok(())
    }

    /// Whether another flow session fits in today's quota
    pub async fn flow_allowed_today(&self, user_id: &str) -> Result<FlowAllowance> {
        let (start, end) = day_bounds(self.clock.today());
        let current_count = self
            .repo
            .count_flow_sessions_between(user_id, start, end)
            .await?;

        Ok(FlowAllowance {
            allowed: current_count < FLOW_SESSIONS_MAX_DAILY,
            current_count,
            max_daily: FLOW_SESSIONS_MAX_DAILY,
        })
    }

    /// Owned tasks among `task_ids`, plus all of `task_ids` in random order
    pub async fn shuffle(&self, user_id: &str, task_ids: &[String]) -> Result<ShuffleResult> {
        let tasks = self.repo.owned_tasks_among(user_id, task_ids).await?;

        let mut random_order = task_ids.to_vec();
        random_order.shuffle(&mut rand::thread_rng());

        Ok(ShuffleResult {
            selected: tasks
                .into_iter()
                .map(|t| ShuffledTask {
                    id: t.id,
                    title: t.title,
                })
                .collect(),
            random_order,
        })
    }

    pub async fn get_session(&self, user_id: &str, session_id: &str) -> Result<FocusSession> {
        self.repo.get_owned(user_id, session_id).await
    }

    /// All sessions, newest first
    pub async fn list_sessions(&self, user_id: &str) -> Result<Vec<FocusSession>> {
        self.repo.list_owned(user_id).await
    }

    /// Tasks attached to a session
    pub async fn session_tasks(&self, user_id: &str, session_id: &str) -> Result<Vec<Task>> {
        let ids = self.repo.session_task_ids(user_id, session_id).await?;
        self.repo.owned_tasks_among(user_id, &ids).await
    }

    pub async fn create_focus_mode(
        &self,
        user_id: &str,
        req: CreateFocusModeRequest,
    ) -> Result<FocusMode> {
        if req.name.trim().is_empty() {
            return Err(AppError::Validation("focus mode name is required".to_string()));
        }
        self.repo.create_focus_mode(user_id, req, self.clock.now()).await
    }

    pub async fn list_focus_modes(&self, user_id: &str) -> Result<Vec<FocusMode>> {
        self.repo.list_owned(user_id).await
    }

    /// The user's pomodoro preset config, or the 25/5 default
    pub async fn pomodoro_config(&self, user_id: &str) -> Result<Metadata> {
        if let Some(mode) = self.repo.find_focus_mode(user_id, FocusPreset::Pomodoro).await? {
            return Ok(mode.config.0);
        }

        let mut config = Metadata::new();
        config.insert(
            "work_seconds".to_string(),
            Value::from(DEFAULT_POMODORO_WORK_SECONDS),
        );
        config.insert(
            "break_seconds".to_string(),
            Value::from(DEFAULT_POMODORO_BREAK_SECONDS),
        );
        Ok(config)
    }

    pub fn mini_info(&self) -> MiniInfo {
        MiniInfo {
            suggested_durations: MINI_SUGGESTED_MINUTES.to_vec(),
            bunny_text: MINI_SESSION_PROMPT.to_string(),
        }
    }

    /// Average length of the most recent sessions, unfinished ones counting
    /// as zero. `None` without any history.
    pub async fn adaptive_recommendation(
        &self,
        user_id: &str,
    ) -> Result<Option<AdaptiveRecommendation>> {
        let sessions = self
            .repo
            .recent_sessions(user_id, ADAPTIVE_HISTORY_LIMIT)
            .await?;

        if sessions.is_empty() {
            return Ok(None);
        }

        // Unfinished sessions add nothing but still count
        let total: i64 = sessions.iter().filter_map(|s| s.effective_minutes).sum();
        let average = total / sessions.len() as i64;

        Ok(Some(AdaptiveRecommendation {
            recommended_length: average,
            message: format!("You focus best around {} minutes.", average),
        }))
    }
}
