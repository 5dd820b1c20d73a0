//! Database access for intervo-api
//!
//! SQLite-backed persistence for users, interview sessions, steps, and
//! per-step emotion analysis frames.

pub mod sessions;
pub mod steps;
pub mod users;

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            token_digest TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS interview_sessions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id),
            title TEXT NOT NULL,
            company TEXT NOT NULL,
            job_title TEXT NOT NULL,
            job_spec TEXT NOT NULL,
            ideal_talent TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'PENDING',
            current_question_index INTEGER NOT NULL DEFAULT 0,
            total_time_sec INTEGER NOT NULL DEFAULT 0,
            cover_letter_url TEXT,
            portfolio_url TEXT,
            final_feedback TEXT,
            average_score REAL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, title)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS interview_steps (
            id TEXT PRIMARY KEY,
            interview_session_id TEXT NOT NULL REFERENCES interview_sessions(id) ON DELETE CASCADE,
            ai_question_id TEXT NOT NULL,
            parent_step_id TEXT REFERENCES interview_steps(id),
            step_type TEXT NOT NULL,
            question TEXT NOT NULL,
            criteria TEXT NOT NULL DEFAULT '[]',
            skills TEXT NOT NULL DEFAULT '[]',
            rationale TEXT NOT NULL DEFAULT '',
            estimated_answer_time_sec INTEGER NOT NULL DEFAULT 0,
            answer TEXT,
            answer_duration_sec INTEGER,
            answer_started_at TEXT,
            answer_ended_at TEXT,
            score REAL,
            strengths TEXT,
            improvements TEXT,
            red_flags TEXT,
            feedback TEXT,
            criterion_scores TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS emotion_frames (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            step_id TEXT NOT NULL REFERENCES interview_steps(id) ON DELETE CASCADE,
            frame INTEGER NOT NULL,
            time REAL NOT NULL,
            happy REAL NOT NULL,
            sad REAL NOT NULL,
            neutral REAL NOT NULL,
            angry REAL NOT NULL,
            fear REAL NOT NULL,
            surprise REAL NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (users, interview_sessions, interview_steps, emotion_frames)");

    Ok(())
}
