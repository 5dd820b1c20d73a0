//! Interview orchestration
//!
//! Owns the session state machine and the question/answer progression:
//! background setup (upload, parse, generate), answer evaluation with
//! follow-up chaining, and session completion with final feedback. Success
//! events are broadcast to the session's room; callers turn returned errors
//! into unicast error events for the offending connection.

use crate::clients::ai::{
    AiGateway, AiQuestionCategory, AnswerReceivedLog, EvaluationRequest, EvaluationResult,
    FollowUpRequest, GeneratedQuestion, QuestionAskedLog, QuestionUserInfo, StepRestoreData,
    TailDecision,
};
use crate::clients::{ObjectStorage, SttTokenIssuer, TtsService};
use crate::db;
use crate::rooms::RoomSink;
use chrono::{DateTime, Utc};
use intervo_common::events::{ErrorCode, ServerEvent, UploadKind};
use intervo_common::models::{
    CriterionScore, InterviewSession, InterviewStep, SessionStatus, StepEvaluation, StepType,
};
use intervo_common::{Error, Result};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Maximum follow-up questions chained onto one main question
const MAX_FOLLOW_UPS: i64 = 3;

/// Fields submitted when creating a session
pub struct NewInterviewParams {
    pub company: String,
    pub job_title: String,
    pub job_spec: String,
    pub ideal_talent: String,
}

/// A file received from the multipart create request
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub struct Orchestrator {
    db: SqlitePool,
    ai: Arc<dyn AiGateway>,
    storage: Arc<dyn ObjectStorage>,
    tts: Arc<dyn TtsService>,
    stt: Arc<dyn SttTokenIssuer>,
    rooms: Arc<dyn RoomSink>,
    /// Per-session locks serializing answer processing
    answer_locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl Orchestrator {
    pub fn new(
        db: SqlitePool,
        ai: Arc<dyn AiGateway>,
        storage: Arc<dyn ObjectStorage>,
        tts: Arc<dyn TtsService>,
        stt: Arc<dyn SttTokenIssuer>,
        rooms: Arc<dyn RoomSink>,
    ) -> Self {
        Self {
            db,
            ai,
            storage,
            tts,
            stt,
            rooms,
            answer_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn db(&self) -> &SqlitePool {
        &self.db
    }

    /// Create a PENDING session with a unique per-user title.
    ///
    /// Titles are `{company} {n}` where n starts at the user's existing
    /// session count for that company plus one, bumped past collisions.
    pub async fn initialize_session(
        &self,
        user_id: Uuid,
        params: NewInterviewParams,
    ) -> Result<InterviewSession> {
        let company = params.company.trim().to_string();
        let job_title = params.job_title.trim().to_string();
        let job_spec = params.job_spec.trim().to_string();
        let ideal_talent = params.ideal_talent.trim().to_string();
        if company.is_empty() || job_title.is_empty() || job_spec.is_empty() || ideal_talent.is_empty() {
            return Err(Error::InvalidInput(
                "company, job_title, job_spec and ideal_talent are required".to_string(),
            ));
        }

        let mut n = db::sessions::count_sessions_for_company(&self.db, user_id, &company).await? + 1;
        let mut title = format!("{} {}", company, n);
        while db::sessions::title_exists(&self.db, user_id, &title).await? {
            n += 1;
            title = format!("{} {}", company, n);
        }

        let session = InterviewSession::new(user_id, title, company, job_title, job_spec, ideal_talent);
        db::sessions::save_session(&self.db, &session).await?;
        info!(session_id = %session.id, title = %session.title, "Interview session created");
        Ok(session)
    }

    /// Background setup pipeline: upload files, parse PDFs, generate and
    /// persist the question set. Any failure flips the session to FAILED and
    /// broadcasts a setup error to the room.
    pub async fn run_setup(
        &self,
        session: InterviewSession,
        cover_letter: Option<UploadedFile>,
        portfolio: Option<UploadedFile>,
    ) {
        let session_id = session.id;
        if let Err(e) = self.setup_inner(session, cover_letter, portfolio).await {
            error!(%session_id, error = %e, "Interview setup failed");
            self.mark_failed(session_id).await;
            self.rooms.broadcast(
                session_id,
                ServerEvent::error(ErrorCode::InterviewSetupFailed, "Interview setup failed"),
            );
        }
    }

    async fn setup_inner(
        &self,
        mut session: InterviewSession,
        cover_letter: Option<UploadedFile>,
        portfolio: Option<UploadedFile>,
    ) -> Result<()> {
        let mut resume_text = String::new();
        let mut portfolio_text = String::new();

        if let Some(file) = cover_letter {
            let key = format!("coverLetter/{}/{}", session.id, file.filename);
            session.cover_letter_url =
                Some(self.storage.upload(&key, file.bytes.clone(), &file.content_type).await?);
            resume_text = self.ai.parse_pdf(file.bytes, &file.filename, session.id).await?;
        }
        if let Some(file) = portfolio {
            let key = format!("portfolio/{}/{}", session.id, file.filename);
            session.portfolio_url =
                Some(self.storage.upload(&key, file.bytes.clone(), &file.content_type).await?);
            portfolio_text = self.ai.parse_pdf(file.bytes, &file.filename, session.id).await?;
        }
        db::sessions::save_session(&self.db, &session).await?;

        let user_info = QuestionUserInfo {
            desired_role: session.job_title.clone(),
            company: session.company.clone(),
            core_values: session.ideal_talent.clone(),
            resume_text,
            portfolio_text,
        };
        let questions = self.ai.generate_questions(&user_info, session.id).await?;
        if questions.is_empty() {
            return Err(Error::Upstream("AI returned no questions".to_string()));
        }

        self.save_questions_and_notify(session, questions).await
    }

    /// Persist generated questions, move the session to READY, and announce
    /// the question set to the room.
    async fn save_questions_and_notify(
        &self,
        mut session: InterviewSession,
        questions: Vec<GeneratedQuestion>,
    ) -> Result<()> {
        let session_id = session.id;
        let result: Result<()> = async {
            let steps: Vec<InterviewStep> = questions
                .into_iter()
                .map(|q| main_step_from_question(session_id, q))
                .collect();
            db::steps::insert_steps(&self.db, &steps).await?;

            session.transition_to(SessionStatus::Ready)?;
            db::sessions::save_session(&self.db, &session).await?;

            let steps = db::steps::load_steps(&self.db, session_id).await?;
            info!(%session_id, count = steps.len(), "Question set persisted, session READY");
            let first_step = steps.first().cloned();
            self.rooms.broadcast(
                session_id,
                ServerEvent::QuestionsReady {
                    session_id,
                    elapsed_sec: session.total_time_sec,
                    steps,
                    answered_steps: Vec::new(),
                },
            );

            // Pre-synthesize audio for the first question so playback can
            // start as soon as the client is ready
            if let Some(first) = first_step {
                match self.tts.generate(&first.question).await {
                    Ok(audio_base64) => self.rooms.broadcast(
                        session_id,
                        ServerEvent::QuestionAudioReady { step_id: first.id, audio_base64 },
                    ),
                    Err(e) => warn!(%session_id, error = %e, "First-question TTS failed"),
                }
            }
            Ok(())
        }
        .await;

        if let Err(e) = &result {
            error!(%session_id, error = %e, "Failed to persist question set");
            self.rooms.broadcast(
                session_id,
                ServerEvent::error(ErrorCode::QuestionProcessingFailed, "Failed to process questions"),
            );
        }
        result
    }

    /// Process a submitted answer end to end: persist it, evaluate it, and
    /// advance the interview (follow-up or next main question).
    ///
    /// Answers for one session are serialized; a second submission for an
    /// already-answered step is rejected without side effects.
    pub async fn process_answer(
        &self,
        user_id: Uuid,
        step_id: Uuid,
        answer: &str,
        duration_sec: i64,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Result<()> {
        let step = db::steps::load_step(&self.db, step_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("step {}", step_id)))?;

        let lock = self.session_lock(step.interview_session_id);
        let _guard = lock.lock().await;

        // Load state under the lock; a concurrent submission may have
        // answered this step or advanced the question index
        let step = db::steps::load_step(&self.db, step_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("step {}", step_id)))?;
        let mut session = self.load_owned_session(step.interview_session_id, user_id).await?;
        if step.is_answered() {
            return Err(Error::InvalidInput(format!("step {} is already answered", step_id)));
        }

        if session.status == SessionStatus::Ready {
            session.transition_to(SessionStatus::InProgress)?;
            db::sessions::save_session(&self.db, &session).await?;
        } else if session.status != SessionStatus::InProgress {
            return Err(Error::InvalidTransition(format!(
                "cannot answer in status {:?}",
                session.status
            )));
        }

        db::steps::save_answer(&self.db, step_id, answer, duration_sec, started_at, ended_at).await?;

        // Memory logging is best effort; losing an entry degrades follow-up
        // quality but must not fail the answer
        self.log_shown_question(&step, session.id).await;
        let answer_log = AnswerReceivedLog {
            ai_question_id: step.ai_question_id.clone(),
            answer: answer.to_string(),
            answer_duration_sec: duration_sec,
        };
        if let Err(e) = self.ai.log_user_answer(&answer_log, session.id).await {
            warn!(session_id = %session.id, error = %e, "Failed to log answer to AI memory");
        }

        let evaluation_request = EvaluationRequest {
            ai_question_id: step.ai_question_id.clone(),
            step_type: type_name(step.step_type),
            criteria: step.criteria.clone(),
            skills: step.skills.clone(),
            question_text: step.question.clone(),
            user_answer: answer.to_string(),
            answer_duration_sec: duration_sec,
        };
        let evaluation = self.ai.evaluate_answer(&evaluation_request, session.id).await?;

        let step_evaluation = StepEvaluation {
            score: evaluation.overall_score,
            strengths: evaluation.strengths.clone(),
            improvements: evaluation.improvements.clone(),
            red_flags: evaluation.red_flags.clone(),
            feedback: evaluation.feedback.clone(),
            criterion_scores: evaluation
                .criterion_scores
                .iter()
                .map(|c| CriterionScore {
                    name: c.name.clone(),
                    score: c.score,
                    reason: c.reason.clone(),
                })
                .collect(),
        };
        db::steps::save_evaluation(&self.db, step_id, &step_evaluation).await?;

        // Follow-ups always chain off the root main step
        let root_step_id = step.parent_step_id.unwrap_or(step.id);
        if evaluation.tail_decision == TailDecision::Create {
            let existing = db::steps::count_follow_ups(&self.db, session.id, root_step_id).await?;
            if existing < MAX_FOLLOW_UPS {
                match self.create_follow_up(&session, &step, answer, &evaluation, root_step_id).await {
                    Ok(follow_up) => {
                        self.emit_question(&session, &follow_up, true).await;
                        return Ok(());
                    }
                    Err(e) => {
                        // A failed follow-up should not stall the interview
                        warn!(session_id = %session.id, error = %e, "Follow-up generation failed, advancing");
                    }
                }
            }
        }

        self.advance_main_question(&mut session).await
    }

    async fn create_follow_up(
        &self,
        session: &InterviewSession,
        answered: &InterviewStep,
        answer: &str,
        evaluation: &EvaluationResult,
        root_step_id: Uuid,
    ) -> Result<InterviewStep> {
        // The AI correlates follow-up chains by the root main question's id
        let root_ai_id = parent_ai_id(answered).unwrap_or_else(|| answered.ai_question_id.clone());
        let request = FollowUpRequest {
            ai_question_id: root_ai_id,
            step_type: type_name(answered.step_type),
            question_text: answered.question.clone(),
            criteria: answered.criteria.clone(),
            skills: answered.skills.clone(),
            user_answer: answer.to_string(),
            evaluation_summary: Some(format!(
                "Strengths: {}, Improvements: {}",
                evaluation.strengths.join(", "),
                evaluation.improvements.join(", ")
            )),
        };
        let follow_up = self.ai.generate_follow_up(&request, session.id).await?;

        let step = InterviewStep {
            id: Uuid::new_v4(),
            interview_session_id: session.id,
            ai_question_id: follow_up.followup_id,
            parent_step_id: Some(root_step_id),
            step_type: answered.step_type,
            question: follow_up.question,
            criteria: follow_up.focus_criteria,
            skills: answered.skills.clone(),
            rationale: follow_up.rationale,
            estimated_answer_time_sec: follow_up.expected_answer_time_sec,
            answer: None,
            answer_duration_sec: None,
            answer_started_at: None,
            answer_ended_at: None,
            evaluation: None,
            created_at: Utc::now(),
        };
        db::steps::insert_steps(&self.db, std::slice::from_ref(&step)).await?;
        self.log_shown_question(&step, session.id).await;
        info!(session_id = %session.id, ai_question_id = %step.ai_question_id, "Follow-up created");
        Ok(step)
    }

    /// Advance to the next main question, or finish the interview when the
    /// last one was just resolved.
    async fn advance_main_question(&self, session: &mut InterviewSession) -> Result<()> {
        let main_steps = db::steps::load_main_steps(&self.db, session.id).await?;
        let next_index = session.current_question_index + 1;

        if next_index as usize >= main_steps.len() {
            return self.finish_interview(session).await;
        }

        session.current_question_index = next_index;
        session.updated_at = Utc::now();
        db::sessions::save_session(&self.db, session).await?;

        let step = &main_steps[next_index as usize];
        self.log_shown_question(step, session.id).await;
        self.emit_question(session, step, false).await;
        Ok(())
    }

    /// Completion flow: announce the end, compute final feedback and average
    /// score, persist COMPLETED, reset AI memory, announce the evaluation.
    async fn finish_interview(&self, session: &mut InterviewSession) -> Result<()> {
        let session_id = session.id;
        self.rooms.broadcast(session_id, ServerEvent::InterviewFinished { session_id });

        let feedback = match self.ai.evaluate_session(session_id).await {
            Ok(evaluation) => evaluation.session_feedback,
            Err(e) => {
                warn!(%session_id, error = %e, "Session evaluation failed, using fallback feedback");
                "Session evaluation is unavailable for this interview.".to_string()
            }
        };

        let average = db::steps::average_score(&self.db, session_id)
            .await?
            .map(|avg| (avg * 10.0).round() / 10.0);

        session.final_feedback = Some(feedback);
        session.average_score = average;
        session.transition_to(SessionStatus::Completed)?;
        db::sessions::save_session(&self.db, session).await?;
        info!(%session_id, average_score = ?average, "Interview completed");

        if let Err(e) = self.ai.reset_memory(session_id).await {
            warn!(%session_id, error = %e, "Failed to reset AI session memory");
        }

        self.rooms.broadcast(session_id, ServerEvent::EvaluationFinished { session_id });
        Ok(())
    }

    /// Event replayed to a connection that joins after the session already
    /// has state, covering clients that connect after generation finished.
    pub async fn replay_event(&self, session: &InterviewSession) -> Option<ServerEvent> {
        match session.status {
            SessionStatus::Pending => None,
            SessionStatus::Ready | SessionStatus::InProgress | SessionStatus::Completed => {
                match db::steps::load_steps(&self.db, session.id).await {
                    Ok(all_steps) => {
                        let (answered, unanswered): (Vec<_>, Vec<_>) =
                            all_steps.into_iter().partition(InterviewStep::is_answered);
                        Some(ServerEvent::QuestionsReady {
                            session_id: session.id,
                            elapsed_sec: session.total_time_sec,
                            steps: unanswered,
                            answered_steps: answered,
                        })
                    }
                    Err(e) => {
                        warn!(session_id = %session.id, error = %e, "Failed to load steps for replay");
                        Some(ServerEvent::error(
                            ErrorCode::QuestionProcessingFailed,
                            "Failed to load questions",
                        ))
                    }
                }
            }
            SessionStatus::Failed => Some(ServerEvent::error(
                ErrorCode::InterviewSetupFailed,
                "Interview setup failed",
            )),
        }
    }

    /// First unanswered step in creation order, if the interview has one left
    pub async fn current_question(&self, session_id: Uuid) -> Result<Option<InterviewStep>> {
        let steps = db::steps::load_steps(&self.db, session_id).await?;
        Ok(steps.into_iter().find(|s| !s.is_answered()))
    }

    /// Build a `server:next-question` payload for `step`.
    ///
    /// Audio synthesis and transcription-token issuance degrade to empty
    /// strings rather than blocking the question.
    pub async fn next_question_event(
        &self,
        session: &InterviewSession,
        step: InterviewStep,
        is_follow_up: bool,
    ) -> ServerEvent {
        let audio_base64 = match self.tts.generate(&step.question).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "TTS synthesis failed");
                String::new()
            }
        };
        let stt_token = match self.stt.issue(session.id, session.user_id).await {
            Ok(token) => token,
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "STT token issuance failed");
                String::new()
            }
        };
        ServerEvent::NextQuestion {
            step,
            is_follow_up,
            audio_base64,
            stt_token,
        }
    }

    async fn emit_question(&self, session: &InterviewSession, step: &InterviewStep, is_follow_up: bool) {
        let event = self.next_question_event(session, step.clone(), is_follow_up).await;
        self.rooms.broadcast(session.id, event);
    }

    /// Record a question shown to the candidate in AI session memory
    pub async fn log_shown_question(&self, step: &InterviewStep, session_id: Uuid) {
        let entry = QuestionAskedLog {
            ai_question_id: step.ai_question_id.clone(),
            question: step.question.clone(),
            step_type: type_name(step.step_type),
            criteria: step.criteria.clone(),
            skills: step.skills.clone(),
            rationale: Some(step.rationale.clone()),
            estimated_answer_time_sec: Some(step.estimated_answer_time_sec),
            parent_question_id: parent_ai_id(step),
        };
        if let Err(e) = self.ai.log_shown_question(&entry, session_id).await {
            warn!(%session_id, error = %e, "Failed to log question to AI memory");
        }
    }

    /// Rebuild AI session memory from persisted steps, best effort
    pub async fn restore_memory(&self, session_id: Uuid) -> Result<()> {
        let steps = db::steps::load_steps(&self.db, session_id).await?;
        let restore: Vec<StepRestoreData> = steps
            .iter()
            .map(|s| StepRestoreData {
                ai_question_id: s.ai_question_id.clone(),
                step_type: type_name(s.step_type),
                question: s.question.clone(),
                criteria: s.criteria.clone(),
                skills: s.skills.clone(),
                rationale: Some(s.rationale.clone()),
                estimated_answer_time_sec: Some(s.estimated_answer_time_sec),
                parent_question_id: parent_ai_id(s),
                answer: s.answer.clone(),
                answer_duration_sec: s.answer_duration_sec,
            })
            .collect();
        self.ai.restore_memory(&restore, session_id).await
    }

    /// Upstream TTL keep-alive passthrough
    pub async fn refresh_ttl(&self, session_id: Uuid) -> Result<()> {
        self.ai.refresh_ttl(session_id).await
    }

    /// Best-effort persistence of client-reported elapsed time
    pub async fn update_elapsed(&self, user_id: Uuid, session_id: Uuid, elapsed_sec: i64) -> Result<()> {
        self.load_owned_session(session_id, user_id).await?;
        db::sessions::update_total_time(&self.db, session_id, elapsed_sec).await
    }

    /// Analyze an uploaded recording and attach the results to the step.
    ///
    /// Video blobs go through emotion analysis; audio blobs are only stored.
    pub async fn record_upload(
        &self,
        user_id: Uuid,
        step_id: Uuid,
        kind: UploadKind,
        blob: Vec<u8>,
    ) -> Result<()> {
        let step = db::steps::load_step(&self.db, step_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("step {}", step_id)))?;
        let session = self.load_owned_session(step.interview_session_id, user_id).await?;

        match kind {
            UploadKind::Video => {
                let filename = format!("{}.webm", step_id);
                let frames = self.ai.analyze_emotion(blob, &filename, session.id).await?;
                db::steps::insert_emotion_frames(&self.db, step_id, &frames).await?;
                info!(session_id = %session.id, %step_id, frames = frames.len(), "Emotion analysis stored");
            }
            UploadKind::Audio => {
                let key = format!("answerAudio/{}/{}.webm", session.id, step_id);
                self.storage.upload(&key, blob, "audio/webm").await?;
            }
        }
        Ok(())
    }

    /// Load a session and verify it belongs to `user_id`
    pub async fn load_owned_session(&self, session_id: Uuid, user_id: Uuid) -> Result<InterviewSession> {
        let session = db::sessions::load_session(&self.db, session_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("session {}", session_id)))?;
        if session.user_id != user_id {
            return Err(Error::Forbidden(format!("session {}", session_id)));
        }
        Ok(session)
    }

    async fn mark_failed(&self, session_id: Uuid) {
        let result: Result<()> = async {
            if let Some(mut session) = db::sessions::load_session(&self.db, session_id).await? {
                if !session.status.is_terminal() {
                    session.transition_to(SessionStatus::Failed)?;
                    db::sessions::save_session(&self.db, &session).await?;
                }
            }
            Ok(())
        }
        .await;
        if let Err(e) = result {
            error!(%session_id, error = %e, "Failed to mark session FAILED");
        }
    }

    fn session_lock(&self, session_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.answer_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(session_id).or_default().clone()
    }
}

fn main_step_from_question(session_id: Uuid, q: GeneratedQuestion) -> InterviewStep {
    InterviewStep {
        id: Uuid::new_v4(),
        interview_session_id: session_id,
        ai_question_id: q.main_question_id,
        parent_step_id: None,
        step_type: step_type_from_category(q.category),
        question: q.question,
        criteria: q.criteria,
        skills: q.skills,
        rationale: q.rationale,
        estimated_answer_time_sec: q.estimated_answer_time_sec,
        answer: None,
        answer_duration_sec: None,
        answer_started_at: None,
        answer_ended_at: None,
        evaluation: None,
        created_at: Utc::now(),
    }
}

fn step_type_from_category(category: AiQuestionCategory) -> StepType {
    match category {
        AiQuestionCategory::Behavioral => StepType::Personality,
        AiQuestionCategory::Technical => StepType::Technical,
        AiQuestionCategory::Tailored => StepType::Tailored,
    }
}

fn type_name(step_type: StepType) -> String {
    serde_json::to_string(&step_type)
        .unwrap_or_default()
        .trim_matches('"')
        .to_string()
}

/// AI-side parent id of a follow-up (`q1-fu2` → `q1`)
fn parent_ai_id(step: &InterviewStep) -> Option<String> {
    if step.is_follow_up() {
        step.ai_question_id.split('-').next().map(str::to_string)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_mapping_folds_behavioral_into_personality() {
        assert_eq!(step_type_from_category(AiQuestionCategory::Behavioral), StepType::Personality);
        assert_eq!(step_type_from_category(AiQuestionCategory::Technical), StepType::Technical);
        assert_eq!(step_type_from_category(AiQuestionCategory::Tailored), StepType::Tailored);
    }

    #[test]
    fn type_name_matches_wire_format() {
        assert_eq!(type_name(StepType::Personality), "PERSONALITY");
        assert_eq!(type_name(StepType::Technical), "TECHNICAL");
    }

    #[test]
    fn parent_ai_id_derives_root_from_follow_up_id() {
        let mut step = InterviewStep {
            id: Uuid::new_v4(),
            interview_session_id: Uuid::new_v4(),
            ai_question_id: "q3-fu2".to_string(),
            parent_step_id: Some(Uuid::new_v4()),
            step_type: StepType::Technical,
            question: String::new(),
            criteria: Vec::new(),
            skills: Vec::new(),
            rationale: String::new(),
            estimated_answer_time_sec: 60,
            answer: None,
            answer_duration_sec: None,
            answer_started_at: None,
            answer_ended_at: None,
            evaluation: None,
            created_at: Utc::now(),
        };
        assert_eq!(parent_ai_id(&step), Some("q3".to_string()));

        step.parent_step_id = None;
        step.ai_question_id = "q3".to_string();
        assert_eq!(parent_ai_id(&step), None);
    }
}
