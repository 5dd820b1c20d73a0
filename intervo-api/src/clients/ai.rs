//! AI gateway client
//!
//! HTTP client for the external AI service responsible for PDF parsing,
//! question generation, answer evaluation, follow-up generation, session
//! memory, TTL keep-alive, and emotion analysis. Every call carries an
//! explicit timeout so a stalled upstream cannot wedge a session's
//! background task.

use async_trait::async_trait;
use intervo_common::models::EmotionFrame;
use intervo_common::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Default timeout for AI gateway requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Question category as assigned by the AI service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiQuestionCategory {
    Behavioral,
    Technical,
    Tailored,
}

/// One generated main question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub main_question_id: String,
    pub category: AiQuestionCategory,
    pub criteria: Vec<String>,
    pub skills: Vec<String>,
    pub rationale: String,
    pub question: String,
    pub estimated_answer_time_sec: i64,
}

/// Candidate context sent with a question-generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionUserInfo {
    pub desired_role: String,
    pub company: String,
    pub core_values: String,
    pub resume_text: String,
    pub portfolio_text: String,
}

/// Whether the AI wants a follow-up after an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TailDecision {
    Create,
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    pub ai_question_id: String,
    #[serde(rename = "type")]
    pub step_type: String,
    pub criteria: Vec<String>,
    pub skills: Vec<String>,
    pub question_text: String,
    pub user_answer: String,
    pub answer_duration_sec: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiCriterionScore {
    pub name: String,
    pub score: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub ai_question_id: String,
    pub overall_score: f64,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub red_flags: Vec<String>,
    pub criterion_scores: Vec<AiCriterionScore>,
    pub feedback: String,
    pub tail_decision: TailDecision,
    pub tail_rationale: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpRequest {
    pub ai_question_id: String,
    #[serde(rename = "type")]
    pub step_type: String,
    pub question_text: String,
    pub criteria: Vec<String>,
    pub skills: Vec<String>,
    pub user_answer: String,
    pub evaluation_summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUp {
    pub followup_id: String,
    pub parent_question_id: String,
    pub focus_criteria: Vec<String>,
    pub rationale: String,
    pub question: String,
    pub expected_answer_time_sec: i64,
}

/// Memory log entry for a question shown to the candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAskedLog {
    pub ai_question_id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub step_type: String,
    pub criteria: Vec<String>,
    pub skills: Vec<String>,
    pub rationale: Option<String>,
    pub estimated_answer_time_sec: Option<i64>,
    pub parent_question_id: Option<String>,
}

/// Memory log entry for a received answer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerReceivedLog {
    pub ai_question_id: String,
    pub answer: String,
    pub answer_duration_sec: i64,
}

/// Step snapshot used to rebuild AI session memory after a reconnect
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRestoreData {
    pub ai_question_id: String,
    #[serde(rename = "type")]
    pub step_type: String,
    pub question: String,
    pub criteria: Vec<String>,
    pub skills: Vec<String>,
    pub rationale: Option<String>,
    pub estimated_answer_time_sec: Option<i64>,
    pub parent_question_id: Option<String>,
    pub answer: Option<String>,
    pub answer_duration_sec: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEvaluation {
    pub session_feedback: String,
}

/// External AI service surface consumed by the interview core
#[async_trait]
pub trait AiGateway: Send + Sync {
    /// Extract text from an uploaded PDF
    async fn parse_pdf(&self, bytes: Vec<u8>, filename: &str, session_id: Uuid) -> Result<String>;

    /// Generate the initial main-question set
    async fn generate_questions(&self, user_info: &QuestionUserInfo, session_id: Uuid) -> Result<Vec<GeneratedQuestion>>;

    /// Score an answer and decide whether a follow-up is warranted
    async fn evaluate_answer(&self, request: &EvaluationRequest, session_id: Uuid) -> Result<EvaluationResult>;

    /// Generate a follow-up question for an evaluated answer
    async fn generate_follow_up(&self, request: &FollowUpRequest, session_id: Uuid) -> Result<FollowUp>;

    /// Record a shown question in session memory
    async fn log_shown_question(&self, entry: &QuestionAskedLog, session_id: Uuid) -> Result<()>;

    /// Record a received answer in session memory
    async fn log_user_answer(&self, entry: &AnswerReceivedLog, session_id: Uuid) -> Result<()>;

    /// Rebuild session memory from persisted steps
    async fn restore_memory(&self, steps: &[StepRestoreData], session_id: Uuid) -> Result<()>;

    /// Discard session memory
    async fn reset_memory(&self, session_id: Uuid) -> Result<()>;

    /// Produce whole-session feedback after the last answer
    async fn evaluate_session(&self, session_id: Uuid) -> Result<SessionEvaluation>;

    /// Keep-alive for server-side session memory
    async fn refresh_ttl(&self, session_id: Uuid) -> Result<()>;

    /// Analyze a recorded video blob into per-frame emotion probabilities
    async fn analyze_emotion(&self, blob: Vec<u8>, filename: &str, session_id: Uuid) -> Result<Vec<EmotionFrame>>;
}

/// reqwest-backed AI gateway client
pub struct HttpAiGateway {
    http_client: Client,
    base_url: String,
}

impl HttpAiGateway {
    pub fn new(base_url: String, timeout: Option<Duration>) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str, session_id: Uuid) -> String {
        format!("{}{}?session_id={}", self.base_url, path, session_id)
    }

    async fn post_json<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        session_id: Uuid,
        body: &Req,
    ) -> Result<Resp> {
        let response = self
            .http_client
            .post(self.url(path, session_id))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("AI gateway {} failed: {}", path, e)))?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "AI gateway {} returned {}",
                path,
                response.status()
            )));
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| Error::Upstream(format!("AI gateway {} bad response: {}", path, e)))
    }

    async fn post_file<Resp: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        session_id: Uuid,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<Resp> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| Error::Upstream(format!("Invalid upload part: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http_client
            .post(self.url(path, session_id))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("AI gateway {} failed: {}", path, e)))?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "AI gateway {} returned {}",
                path,
                response.status()
            )));
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| Error::Upstream(format!("AI gateway {} bad response: {}", path, e)))
    }
}

#[derive(Deserialize)]
struct ParsedPdf {
    extracted_text: String,
}

#[derive(Serialize)]
struct QuestionGenerateRequest<'a> {
    user_info: &'a QuestionUserInfo,
}

#[derive(Serialize)]
struct RestoreRequest<'a> {
    steps: &'a [StepRestoreData],
}

#[derive(Deserialize)]
struct EmotionAnalysisResponse {
    results: Vec<EmotionFrame>,
}

#[async_trait]
impl AiGateway for HttpAiGateway {
    async fn parse_pdf(&self, bytes: Vec<u8>, filename: &str, session_id: Uuid) -> Result<String> {
        let parsed: ParsedPdf = self.post_file("/pdf-parsing", session_id, bytes, filename).await?;
        Ok(parsed.extracted_text)
    }

    async fn generate_questions(&self, user_info: &QuestionUserInfo, session_id: Uuid) -> Result<Vec<GeneratedQuestion>> {
        self.post_json("/question-generating", session_id, &QuestionGenerateRequest { user_info })
            .await
    }

    async fn evaluate_answer(&self, request: &EvaluationRequest, session_id: Uuid) -> Result<EvaluationResult> {
        self.post_json("/answer-evaluating", session_id, request).await
    }

    async fn generate_follow_up(&self, request: &FollowUpRequest, session_id: Uuid) -> Result<FollowUp> {
        self.post_json("/followup-generating", session_id, request).await
    }

    async fn log_shown_question(&self, entry: &QuestionAskedLog, session_id: Uuid) -> Result<()> {
        let _: serde_json::Value = self.post_json("/log/question-asked", session_id, entry).await?;
        Ok(())
    }

    async fn log_user_answer(&self, entry: &AnswerReceivedLog, session_id: Uuid) -> Result<()> {
        let _: serde_json::Value = self.post_json("/log/answer-received", session_id, entry).await?;
        Ok(())
    }

    async fn restore_memory(&self, steps: &[StepRestoreData], session_id: Uuid) -> Result<()> {
        let _: serde_json::Value = self
            .post_json("/restore", session_id, &RestoreRequest { steps })
            .await?;
        Ok(())
    }

    async fn reset_memory(&self, session_id: Uuid) -> Result<()> {
        let _: serde_json::Value = self
            .post_json("/memory/reset", session_id, &serde_json::json!({}))
            .await?;
        Ok(())
    }

    async fn evaluate_session(&self, session_id: Uuid) -> Result<SessionEvaluation> {
        self.post_json("/session-evaluating", session_id, &serde_json::json!({})).await
    }

    async fn refresh_ttl(&self, session_id: Uuid) -> Result<()> {
        let _: serde_json::Value = self
            .post_json("/ttl/refresh", session_id, &serde_json::json!({}))
            .await?;
        Ok(())
    }

    async fn analyze_emotion(&self, blob: Vec<u8>, filename: &str, session_id: Uuid) -> Result<Vec<EmotionFrame>> {
        let response: EmotionAnalysisResponse = self
            .post_file("/emotion-analyzing", session_id, blob, filename)
            .await?;
        Ok(response.results)
    }
}
