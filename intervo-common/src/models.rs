//! Interview session data model
//!
//! An interview session progresses through a fixed state machine:
//! PENDING → READY → IN_PROGRESS → COMPLETED, with FAILED reachable from
//! PENDING/READY/IN_PROGRESS. COMPLETED and FAILED are terminal.
//!
//! Steps are the questions of a session. A step with `parent_step_id = None`
//! is a main question; main questions are ordered by their AI-assigned id
//! (`q1`, `q2`, ...). A step with `parent_step_id = Some(..)` is a follow-up
//! attached to the root main question it drills into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Interview session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Created, background setup (upload + parse + question generation) running
    Pending,
    /// Questions generated and persisted, waiting for first answer
    Ready,
    /// At least one answer submitted
    InProgress,
    /// Last main question resolved with no pending follow-up
    Completed,
    /// Background setup or unrecoverable processing error
    Failed,
}

impl SessionStatus {
    /// Whether the session can move from `self` to `next`.
    ///
    /// Transitions are monotonic forward; terminal states accept nothing.
    /// Self-transitions are allowed so repeated persistence of the current
    /// state is not an error.
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        if self == next {
            return true;
        }
        match self {
            Pending => matches!(next, Ready | Failed),
            Ready => matches!(next, InProgress | Completed | Failed),
            InProgress => matches!(next, Completed | Failed),
            Completed | Failed => false,
        }
    }

    /// Terminal states never re-enter the state machine.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }
}

/// Question type assigned to a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepType {
    Technical,
    Personality,
    Tailored,
}

/// One end-to-end mock-interview attempt by one user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub company: String,
    pub job_title: String,
    pub job_spec: String,
    pub ideal_talent: String,
    pub status: SessionStatus,
    /// Index of the current main question (0-based), advances as main
    /// questions are answered
    pub current_question_index: i64,
    /// Cumulative elapsed time reported by client heartbeats
    pub total_time_sec: i64,
    pub cover_letter_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub final_feedback: Option<String>,
    /// Average step score rounded to one decimal, set at completion
    pub average_score: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InterviewSession {
    pub fn new(user_id: Uuid, title: String, company: String, job_title: String, job_spec: String, ideal_talent: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title,
            company,
            job_title,
            job_spec,
            ideal_talent,
            status: SessionStatus::Pending,
            current_question_index: 0,
            total_time_sec: 0,
            cover_letter_url: None,
            portfolio_url: None,
            final_feedback: None,
            average_score: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition to a new status, enforcing the state machine.
    pub fn transition_to(&mut self, next: SessionStatus) -> crate::Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(crate::Error::InvalidTransition(format!(
                "{:?} -> {:?} for session {}",
                self.status, next, self.id
            )));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Per-criterion evaluation score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionScore {
    pub name: String,
    pub score: f64,
    pub reason: String,
}

/// Evaluation fields of a step, written once after the answer is evaluated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepEvaluation {
    pub score: f64,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub red_flags: Vec<String>,
    pub feedback: String,
    pub criterion_scores: Vec<CriterionScore>,
}

/// One question (main or follow-up) within a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewStep {
    pub id: Uuid,
    pub interview_session_id: Uuid,
    /// AI-assigned correlation id (`q1`, `q2-fu1`, ...); main steps order by
    /// this ascending
    pub ai_question_id: String,
    /// Set for follow-ups; always points at the root main step
    pub parent_step_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub step_type: StepType,
    pub question: String,
    pub criteria: Vec<String>,
    pub skills: Vec<String>,
    pub rationale: String,
    pub estimated_answer_time_sec: i64,
    pub answer: Option<String>,
    pub answer_duration_sec: Option<i64>,
    pub answer_started_at: Option<DateTime<Utc>>,
    pub answer_ended_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub evaluation: Option<StepEvaluation>,
    pub created_at: DateTime<Utc>,
}

impl InterviewStep {
    /// Follow-up steps attach to exactly one parent
    pub fn is_follow_up(&self) -> bool {
        self.parent_step_id.is_some()
    }

    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }
}

/// One per-frame emotion-probability record, attached to a step after a video
/// upload completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionFrame {
    pub frame: i64,
    /// Time of this frame within the recording, in seconds
    pub time: f64,
    pub happy: f64,
    pub sad: f64,
    pub neutral: f64,
    pub angry: f64,
    pub fear: f64,
    pub surprise: f64,
}
