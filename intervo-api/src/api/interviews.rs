//! Interview session REST endpoints
//!
//! Creation accepts a multipart form so the cover letter and portfolio PDFs
//! arrive with the text fields. The response returns as soon as the PENDING
//! row is persisted; the setup pipeline (upload, parse, question generation)
//! runs in a background task and announces its outcome over the session room.

use crate::auth::authenticate;
use crate::error::{ApiError, ApiResult};
use crate::orchestrator::{NewInterviewParams, UploadedFile};
use crate::{db, AppState};
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

fn cookie_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::COOKIE).and_then(|v| v.to_str().ok())
}

/// POST /api/v1/interviews
///
/// Multipart fields: `company`, `jobTitle`, `jobSpec`, `idealTalent`, plus
/// optional `coverLetter` and `portfolio` PDF files.
pub async fn create_interview(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let user = authenticate(state.orchestrator.db(), &state.config.shared_secret, cookie_header(&headers)).await?;

    let mut company = String::new();
    let mut job_title = String::new();
    let mut job_spec = String::new();
    let mut ideal_talent = String::new();
    let mut cover_letter: Option<UploadedFile> = None;
    let mut portfolio: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "company" => company = field.text().await.map_err(bad_field)?,
            "jobTitle" => job_title = field.text().await.map_err(bad_field)?,
            "jobSpec" => job_spec = field.text().await.map_err(bad_field)?,
            "idealTalent" => ideal_talent = field.text().await.map_err(bad_field)?,
            "coverLetter" | "portfolio" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::BadRequest(format!("{} is missing a filename", name)))?;
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(bad_field)?.to_vec();
                let file = UploadedFile { filename, content_type, bytes };
                if name == "coverLetter" {
                    cover_letter = Some(file);
                } else {
                    portfolio = Some(file);
                }
            }
            other => {
                return Err(ApiError::BadRequest(format!("Unexpected field: {}", other)));
            }
        }
    }

    let session = state
        .orchestrator
        .initialize_session(
            user.id,
            NewInterviewParams { company, job_title, job_spec, ideal_talent },
        )
        .await?;
    info!(session_id = %session.id, user_id = %user.id, "Interview creation accepted");

    let orchestrator = state.orchestrator.clone();
    let background_session = session.clone();
    tokio::spawn(async move {
        orchestrator.run_setup(background_session, cover_letter, portfolio).await;
    });

    Ok((StatusCode::CREATED, Json(json!({ "sessionId": session.id }))))
}

/// GET /api/v1/interviews/{session_id}
pub async fn get_interview(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let user = authenticate(state.orchestrator.db(), &state.config.shared_secret, cookie_header(&headers)).await?;
    let session = state.orchestrator.load_owned_session(session_id, user.id).await?;
    let steps = db::steps::load_steps(state.orchestrator.db(), session_id).await?;

    Ok(Json(json!({
        "session": session,
        "steps": steps,
    })))
}

fn bad_field(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Malformed multipart field: {}", e))
}
