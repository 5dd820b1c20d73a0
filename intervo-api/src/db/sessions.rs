//! Interview session persistence
//!
//! Sessions are the durable record of the orchestrator state machine. The
//! notify event for a change is only emitted after the row is committed, so
//! readers observing an event can always re-query the matching state.

use chrono::{DateTime, Utc};
use intervo_common::models::{InterviewSession, SessionStatus};
use intervo_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Insert or update a session row
pub async fn save_session(pool: &SqlitePool, session: &InterviewSession) -> Result<()> {
    let status = serde_json::to_string(&session.status)?;
    // status column stores the bare enum name, not the JSON-quoted form
    let status = status.trim_matches('"').to_string();

    sqlx::query(
        r#"
        INSERT INTO interview_sessions (
            id, user_id, title, company, job_title, job_spec, ideal_talent,
            status, current_question_index, total_time_sec,
            cover_letter_url, portfolio_url, final_feedback, average_score,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            status = excluded.status,
            current_question_index = excluded.current_question_index,
            total_time_sec = excluded.total_time_sec,
            cover_letter_url = excluded.cover_letter_url,
            portfolio_url = excluded.portfolio_url,
            final_feedback = excluded.final_feedback,
            average_score = excluded.average_score,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(session.id.to_string())
    .bind(session.user_id.to_string())
    .bind(&session.title)
    .bind(&session.company)
    .bind(&session.job_title)
    .bind(&session.job_spec)
    .bind(&session.ideal_talent)
    .bind(&status)
    .bind(session.current_question_index)
    .bind(session.total_time_sec)
    .bind(&session.cover_letter_url)
    .bind(&session.portfolio_url)
    .bind(&session.final_feedback)
    .bind(session.average_score)
    .bind(session.created_at.to_rfc3339())
    .bind(session.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a session by id
pub async fn load_session(pool: &SqlitePool, session_id: Uuid) -> Result<Option<InterviewSession>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, title, company, job_title, job_spec, ideal_talent,
               status, current_question_index, total_time_sec,
               cover_letter_url, portfolio_url, final_feedback, average_score,
               created_at, updated_at
        FROM interview_sessions
        WHERE id = ?
        "#,
    )
    .bind(session_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(session_from_row).transpose()
}

/// Number of sessions a user already has for a company (title suffix seed)
pub async fn count_sessions_for_company(pool: &SqlitePool, user_id: Uuid, company: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM interview_sessions WHERE user_id = ? AND company = ?",
    )
    .bind(user_id.to_string())
    .bind(company)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Whether a (user, title) pair is already taken
pub async fn title_exists(pool: &SqlitePool, user_id: Uuid, title: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM interview_sessions WHERE user_id = ? AND title = ?",
    )
    .bind(user_id.to_string())
    .bind(title)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// Best-effort update of client-reported elapsed time
pub async fn update_total_time(pool: &SqlitePool, session_id: Uuid, elapsed_sec: i64) -> Result<()> {
    sqlx::query("UPDATE interview_sessions SET total_time_sec = ?, updated_at = ? WHERE id = ?")
        .bind(elapsed_sec)
        .bind(Utc::now().to_rfc3339())
        .bind(session_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Mark stale PENDING sessions as FAILED on startup
///
/// The background setup pipeline dies with the process; any session still
/// PENDING at boot will never progress, so fail it instead of leaving clients
/// waiting forever.
pub async fn fail_stale_pending(pool: &SqlitePool) -> Result<usize> {
    let result = sqlx::query(
        r#"
        UPDATE interview_sessions
        SET status = 'FAILED', updated_at = ?
        WHERE status = 'PENDING'
        "#,
    )
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() as usize)
}

fn session_from_row(row: sqlx::sqlite::SqliteRow) -> Result<InterviewSession> {
    let id_str: String = row.get("id");
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| Error::Internal(format!("Failed to parse session id: {}", e)))?;

    let user_id_str: String = row.get("user_id");
    let user_id = Uuid::parse_str(&user_id_str)
        .map_err(|e| Error::Internal(format!("Failed to parse user id: {}", e)))?;

    let status_str: String = row.get("status");
    let status: SessionStatus = serde_json::from_str(&format!("\"{}\"", status_str))
        .map_err(|e| Error::Internal(format!("Failed to parse status '{}': {}", status_str, e)))?;

    Ok(InterviewSession {
        id,
        user_id,
        title: row.get("title"),
        company: row.get("company"),
        job_title: row.get("job_title"),
        job_spec: row.get("job_spec"),
        ideal_talent: row.get("ideal_talent"),
        status,
        current_question_index: row.get("current_question_index"),
        total_time_sec: row.get("total_time_sec"),
        cover_letter_url: row.get("cover_letter_url"),
        portfolio_url: row.get("portfolio_url"),
        final_feedback: row.get("final_feedback"),
        average_score: row.get("average_score"),
        created_at: parse_rfc3339(row.get("created_at"))?,
        updated_at: parse_rfc3339(row.get("updated_at"))?,
    })
}

pub(crate) fn parse_rfc3339(value: String) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map_err(|e| Error::Internal(format!("Failed to parse timestamp: {}", e)))
        .map(|dt| dt.with_timezone(&Utc))
}
