use super::{ensure_owned, OwnedResource, Repository};
use crate::database::{CreateFocusModeRequest, FocusMode, FocusPreset, FocusSession, Task};
use crate::error::Result;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::SqliteConnection;
use uuid::Uuid;

impl OwnedResource for FocusMode {
    const TABLE: &'static str = "focus_modes";
    const ENTITY: &'static str = "Focus mode";
}

impl OwnedResource for FocusSession {
    const TABLE: &'static str = "focus_sessions";
    const ENTITY: &'static str = "Focus session";
    const ORDER_BY: &'static str = "started_at DESC";
}

impl Repository {
    pub async fn create_focus_mode(
        &self,
        user_id: &str,
        req: CreateFocusModeRequest,
        now: DateTime<Utc>,
    ) -> Result<FocusMode> {
        let id = Uuid::new_v4().to_string();

        let mode = sqlx::query_as::<_, FocusMode>(
            r#"
            INSERT INTO focus_modes (id, user_id, name, preset, config, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&req.name)
        .bind(req.preset)
        .bind(Json(&req.config))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created focus mode: {} ({:?})", id, req.preset);
        Ok(mode)
    }

    /// The user's oldest mode for a preset
    pub async fn find_focus_mode(
        &self,
        user_id: &str,
        preset: FocusPreset,
    ) -> Result<Option<FocusMode>> {
        let mode = sqlx::query_as::<_, FocusMode>(
            r#"
            SELECT * FROM focus_modes
            WHERE user_id = ? AND preset = ?
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(preset)
        .fetch_optional(&self.pool)
        .await?;

        Ok(mode)
    }

    /// Flow sessions started within `[start, end)`, matched by the mode's
    /// preset or, for sessions without a mode, by name
    pub async fn count_flow_sessions_between(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64> {
        let count = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM focus_sessions s
            LEFT JOIN focus_modes m ON m.id = s.mode_id
            WHERE s.user_id = ?
              AND s.started_at >= ? AND s.started_at < ?
              AND (m.preset = ? OR LOWER(s.mode_name) = 'flow')
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .bind(FocusPreset::Flow)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Most recently started sessions, newest first
    pub async fn recent_sessions(&self, user_id: &str, limit: i64) -> Result<Vec<FocusSession>> {
        let sessions = sqlx::query_as::<_, FocusSession>(
            "SELECT * FROM focus_sessions WHERE user_id = ? ORDER BY started_at DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// Ids of the tasks attached to a session
    pub async fn session_task_ids(&self, user_id: &str, session_id: &str) -> Result<Vec<String>> {
        let mut conn = self.pool.acquire().await?;
        ensure_owned::<FocusSession>(&mut conn, user_id, session_id).await?;

        let ids = sqlx::query_scalar(
            "SELECT task_id FROM focus_session_tasks WHERE session_id = ? ORDER BY task_id",
        )
        .bind(session_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(ids)
    }

    /// The subset of `ids` naming tasks owned by `user_id`, in input order.
    /// Unknown and foreign ids are skipped.
    pub async fn owned_tasks_among(&self, user_id: &str, ids: &[String]) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = Vec::with_capacity(ids.len());

        for id in ids {
            // Skip duplicates, keep first position
            if tasks.iter().any(|t| &t.id == id) {
                continue;
            }

            let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ? AND user_id = ?")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

            if let Some(task) = task {
                tasks.push(task);
            }
        }

        Ok(tasks)
    }
}

pub(crate) async fn insert_session(conn: &mut SqliteConnection, session: &FocusSession) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO focus_sessions (
            id, user_id, mode_id, mode_name, started_at, ended_at, interruptions,
            distractions_resisted, effective_minutes, notes, is_hyperfocus, metadata
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(&session.user_id)
    .bind(&session.mode_id)
    .bind(&session.mode_name)
    .bind(session.started_at)
    .bind(session.ended_at)
    .bind(session.interruptions)
    .bind(session.distractions_resisted)
    .bind(session.effective_minutes)
    .bind(&session.notes)
    .bind(session.is_hyperfocus)
    .bind(&session.metadata)
    .execute(&mut *conn)
    .await?;

    tracing::debug!("Inserted focus session: {}", session.id);
    Ok(())
}

/// Link tasks to a session; ids not owned by the session's user are dropped.
/// Returns how many links were made.
pub(crate) async fn attach_tasks(
    conn: &mut SqliteConnection,
    user_id: &str,
    session_id: &str,
    task_ids: &[String],
) -> Result<u64> {
    let mut attached = 0;

    for task_id in task_ids {
        attached += sqlx::query(
            r#"
            INSERT OR IGNORE INTO focus_session_tasks (session_id, task_id)
            SELECT ?, id FROM tasks WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(session_id)
        .bind(task_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    }

    Ok(attached)
}

/// Set `ended_at` and `effective_minutes` on a running session.
/// Returns false when the session had already ended.
pub(crate) async fn finish_session(
    conn: &mut SqliteConnection,
    user_id: &str,
    session_id: &str,
    ended_at: DateTime<Utc>,
    effective_minutes: i64,
) -> Result<bool> {
    let rows = sqlx::query(
        r#"
        UPDATE focus_sessions SET ended_at = ?, effective_minutes = ?
        WHERE id = ? AND user_id = ? AND ended_at IS NULL
        "#,
    )
    .bind(ended_at)
    .bind(effective_minutes)
    .bind(session_id)
    .bind(user_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    Ok(rows == 1)
}
