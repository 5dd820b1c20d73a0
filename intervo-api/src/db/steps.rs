//! Interview step persistence
//!
//! Main steps order by their AI-assigned id ascending; creation order
//! (rowid) reproduces the full interleaved sequence, since a follow-up is
//! always inserted after its parent was answered and before the next main
//! question is reached.

use chrono::{DateTime, Utc};
use intervo_common::models::{EmotionFrame, InterviewStep, StepEvaluation, StepType};
use intervo_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Bulk-insert steps (initial question set or a single follow-up)
pub async fn insert_steps(pool: &SqlitePool, steps: &[InterviewStep]) -> Result<()> {
    let mut tx = pool.begin().await?;
    for step in steps {
        let step_type = enum_name(&step.step_type)?;
        sqlx::query(
            r#"
            INSERT INTO interview_steps (
                id, interview_session_id, ai_question_id, parent_step_id,
                step_type, question, criteria, skills, rationale,
                estimated_answer_time_sec, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(step.id.to_string())
        .bind(step.interview_session_id.to_string())
        .bind(&step.ai_question_id)
        .bind(step.parent_step_id.map(|id| id.to_string()))
        .bind(&step_type)
        .bind(&step.question)
        .bind(serde_json::to_string(&step.criteria)?)
        .bind(serde_json::to_string(&step.skills)?)
        .bind(&step.rationale)
        .bind(step.estimated_answer_time_sec)
        .bind(step.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

/// All steps of a session in creation order
pub async fn load_steps(pool: &SqlitePool, session_id: Uuid) -> Result<Vec<InterviewStep>> {
    let rows = sqlx::query(&select_sql("WHERE interview_session_id = ? ORDER BY rowid ASC"))
        .bind(session_id.to_string())
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(step_from_row).collect()
}

/// Main questions of a session, ordered by AI-assigned id ascending
pub async fn load_main_steps(pool: &SqlitePool, session_id: Uuid) -> Result<Vec<InterviewStep>> {
    let rows = sqlx::query(&select_sql(
        "WHERE interview_session_id = ? AND parent_step_id IS NULL ORDER BY ai_question_id ASC",
    ))
    .bind(session_id.to_string())
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(step_from_row).collect()
}

/// Load one step by id
pub async fn load_step(pool: &SqlitePool, step_id: Uuid) -> Result<Option<InterviewStep>> {
    let row = sqlx::query(&select_sql("WHERE id = ?"))
        .bind(step_id.to_string())
        .fetch_optional(pool)
        .await?;
    row.map(step_from_row).transpose()
}

/// Persist the answer fields of a step (written once)
pub async fn save_answer(
    pool: &SqlitePool,
    step_id: Uuid,
    answer: &str,
    duration_sec: i64,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE interview_steps
        SET answer = ?, answer_duration_sec = ?, answer_started_at = ?, answer_ended_at = ?
        WHERE id = ?
        "#,
    )
    .bind(answer)
    .bind(duration_sec)
    .bind(started_at.to_rfc3339())
    .bind(ended_at.to_rfc3339())
    .bind(step_id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

/// Persist the evaluation fields of a step (written once)
pub async fn save_evaluation(pool: &SqlitePool, step_id: Uuid, evaluation: &StepEvaluation) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE interview_steps
        SET score = ?, strengths = ?, improvements = ?, red_flags = ?,
            feedback = ?, criterion_scores = ?
        WHERE id = ?
        "#,
    )
    .bind(evaluation.score)
    .bind(serde_json::to_string(&evaluation.strengths)?)
    .bind(serde_json::to_string(&evaluation.improvements)?)
    .bind(serde_json::to_string(&evaluation.red_flags)?)
    .bind(&evaluation.feedback)
    .bind(serde_json::to_string(&evaluation.criterion_scores)?)
    .bind(step_id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

/// Number of follow-ups already attached to a root main question
pub async fn count_follow_ups(pool: &SqlitePool, session_id: Uuid, root_step_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM interview_steps WHERE interview_session_id = ? AND parent_step_id = ?",
    )
    .bind(session_id.to_string())
    .bind(root_step_id.to_string())
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Average evaluated score across a session's steps, None if nothing scored
pub async fn average_score(pool: &SqlitePool, session_id: Uuid) -> Result<Option<f64>> {
    let avg: Option<f64> = sqlx::query_scalar(
        "SELECT AVG(score) FROM interview_steps WHERE interview_session_id = ? AND score IS NOT NULL",
    )
    .bind(session_id.to_string())
    .fetch_one(pool)
    .await?;
    Ok(avg)
}

/// Write per-frame emotion analysis results for a step
pub async fn insert_emotion_frames(pool: &SqlitePool, step_id: Uuid, frames: &[EmotionFrame]) -> Result<()> {
    let mut tx = pool.begin().await?;
    for f in frames {
        sqlx::query(
            r#"
            INSERT INTO emotion_frames (step_id, frame, time, happy, sad, neutral, angry, fear, surprise)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(step_id.to_string())
        .bind(f.frame)
        .bind(f.time)
        .bind(f.happy)
        .bind(f.sad)
        .bind(f.neutral)
        .bind(f.angry)
        .bind(f.fear)
        .bind(f.surprise)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

fn select_sql(where_clause: &str) -> String {
    format!(
        r#"
        SELECT id, interview_session_id, ai_question_id, parent_step_id,
               step_type, question, criteria, skills, rationale,
               estimated_answer_time_sec, answer, answer_duration_sec,
               answer_started_at, answer_ended_at, score, strengths,
               improvements, red_flags, feedback, criterion_scores, created_at
        FROM interview_steps
        {}
        "#,
        where_clause
    )
}

fn enum_name<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.trim_matches('"').to_string())
}

fn step_from_row(row: sqlx::sqlite::SqliteRow) -> Result<InterviewStep> {
    let parse_uuid = |value: String, what: &str| {
        Uuid::parse_str(&value).map_err(|e| Error::Internal(format!("Failed to parse {}: {}", what, e)))
    };

    let id = parse_uuid(row.get("id"), "step id")?;
    let interview_session_id = parse_uuid(row.get("interview_session_id"), "session id")?;
    let parent_step_id = row
        .get::<Option<String>, _>("parent_step_id")
        .map(|s| parse_uuid(s, "parent step id"))
        .transpose()?;

    let type_str: String = row.get("step_type");
    let step_type: StepType = serde_json::from_str(&format!("\"{}\"", type_str))
        .map_err(|e| Error::Internal(format!("Failed to parse step type '{}': {}", type_str, e)))?;

    let json_list = |value: Option<String>| -> Result<Vec<String>> {
        match value {
            Some(s) => Ok(serde_json::from_str(&s)?),
            None => Ok(Vec::new()),
        }
    };

    // Evaluation fields are written together; score is the presence marker
    let evaluation = match row.get::<Option<f64>, _>("score") {
        Some(score) => Some(StepEvaluation {
            score,
            strengths: json_list(row.get("strengths"))?,
            improvements: json_list(row.get("improvements"))?,
            red_flags: json_list(row.get("red_flags"))?,
            feedback: row.get::<Option<String>, _>("feedback").unwrap_or_default(),
            criterion_scores: match row.get::<Option<String>, _>("criterion_scores") {
                Some(s) => serde_json::from_str(&s)?,
                None => Vec::new(),
            },
        }),
        None => None,
    };

    Ok(InterviewStep {
        id,
        interview_session_id,
        ai_question_id: row.get("ai_question_id"),
        parent_step_id,
        step_type,
        question: row.get("question"),
        criteria: json_list(row.get("criteria"))?,
        skills: json_list(row.get("skills"))?,
        rationale: row.get("rationale"),
        estimated_answer_time_sec: row.get("estimated_answer_time_sec"),
        answer: row.get("answer"),
        answer_duration_sec: row.get("answer_duration_sec"),
        answer_started_at: row
            .get::<Option<String>, _>("answer_started_at")
            .map(super::sessions::parse_rfc3339)
            .transpose()?,
        answer_ended_at: row
            .get::<Option<String>, _>("answer_ended_at")
            .map(super::sessions::parse_rfc3339)
            .transpose()?,
        evaluation,
        created_at: super::sessions::parse_rfc3339(row.get("created_at"))?,
    })
}
