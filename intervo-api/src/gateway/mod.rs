//! WebSocket gateway
//!
//! One task per connection. The read half dispatches client events against
//! the connection's `ConnCtx`; a writer task drains the outbound channel the
//! room registry fans events into. Authentication happens during the HTTP
//! handshake, but failures are reported as a `server:error` frame after the
//! upgrade so browser clients can read the reason.

pub mod context;

use crate::auth::authenticate;
use crate::orchestrator::Orchestrator;
use crate::rooms::{ConnId, RoomSink};
use crate::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use base64::Engine;
use context::ConnCtx;
use futures::{SinkExt, StreamExt};
use intervo_common::events::{ClientEvent, ErrorCode, ServerEvent};
use intervo_common::models::SessionStatus;
use intervo_common::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// GET /ws upgrade handler
pub async fn ws_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    headers: HeaderMap,
) -> Response {
    let cookie = headers
        .get(axum::http::header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    ws.on_upgrade(move |socket| handle_socket(state, socket, cookie))
}

async fn handle_socket(state: AppState, socket: WebSocket, cookie: Option<String>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ServerEvent>();

    // Writer task: serialize outbound events onto the socket
    let writer = tokio::spawn(async move {
        while let Some(event) = out_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(text) => {
                    if ws_tx.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "Failed to serialize outbound event"),
            }
        }
        let _ = ws_tx.close().await;
    });

    let user = match authenticate(state.orchestrator.db(), &state.config.shared_secret, cookie.as_deref()).await {
        Ok(user) => user,
        Err(e) => {
            debug!(error = %e, "WebSocket handshake rejected");
            let _ = out_tx.send(ServerEvent::error(ErrorCode::AuthError, "Authentication failed"));
            drop(out_tx);
            let _ = writer.await;
            return;
        }
    };

    let conn_id: ConnId = Uuid::new_v4();
    state.rooms.register(conn_id, out_tx.clone());
    info!(%conn_id, user_id = %user.id, "WebSocket connected");

    let mut ctx = ConnCtx::new(
        conn_id,
        user,
        Duration::from_secs(state.config.ttl_refresh_interval_secs),
    );

    while let Some(message) = ws_rx.next().await {
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => handle_event(&state, &mut ctx, event).await,
                Err(e) => debug!(%conn_id, error = %e, "Ignoring unparseable client event"),
            },
            // Protocol-level pings count as heartbeats too
            Ok(Message::Ping(_)) => heartbeat(&state, &mut ctx),
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    state.rooms.unregister(conn_id);
    info!(%conn_id, "WebSocket disconnected");
    drop(out_tx);
    let _ = writer.await;
}

async fn handle_event(state: &AppState, ctx: &mut ConnCtx, event: ClientEvent) {
    match event {
        ClientEvent::JoinRoom { session_id } => join_room(state, ctx, session_id).await,
        ClientEvent::Ready { session_id } => ready(state, ctx, session_id).await,
        ClientEvent::SubmitAnswer {
            step_id,
            answer,
            duration,
            start_at,
            end_at,
        } => {
            let result = state
                .orchestrator
                .process_answer(ctx.user.id, step_id, &answer, duration, start_at, end_at)
                .await;
            if let Err(e) = result {
                warn!(conn_id = %ctx.conn_id, %step_id, error = %e, "Answer processing failed");
                state.rooms.emit_to(ctx.conn_id, error_event(&e, ErrorCode::AnswerProcessingFailed));
            }
        }
        ClientEvent::SubmitElapsedSec { session_id, elapsed_sec } => {
            if let Err(e) = state.orchestrator.update_elapsed(ctx.user.id, session_id, elapsed_sec).await {
                debug!(%session_id, error = %e, "Elapsed-time update dropped");
            }
        }
        ClientEvent::UploadChunk { index, chunk } => upload_chunk(state, ctx, index, &chunk),
        ClientEvent::UploadFinish { kind, step_id } => {
            let blob = ctx.take_upload();
            if blob.is_empty() {
                state.rooms.emit_to(
                    ctx.conn_id,
                    ServerEvent::error(ErrorCode::EmotionAnalysisFailed, "No upload data received"),
                );
                return;
            }
            if let Err(e) = state.orchestrator.record_upload(ctx.user.id, step_id, kind, blob).await {
                warn!(conn_id = %ctx.conn_id, %step_id, error = %e, "Upload processing failed");
                state.rooms.emit_to(ctx.conn_id, error_event(&e, ErrorCode::EmotionAnalysisFailed));
            }
        }
        ClientEvent::Ping => heartbeat(state, ctx),
    }
}

/// Feed the TTL throttle; refreshes fire at most once per interval
fn heartbeat(state: &AppState, ctx: &mut ConnCtx) {
    if let Some(session_id) = ctx.session_id {
        if ctx.ttl.try_trigger() {
            spawn_ttl_refresh(state.orchestrator.clone(), session_id);
        }
    }
}

async fn join_room(state: &AppState, ctx: &mut ConnCtx, session_id: Uuid) {
    let session = match state.orchestrator.load_owned_session(session_id, ctx.user.id).await {
        Ok(session) => session,
        Err(e) => {
            debug!(conn_id = %ctx.conn_id, %session_id, error = %e, "Join rejected");
            state.rooms.emit_to(
                ctx.conn_id,
                ServerEvent::error(ErrorCode::UnauthorizedOrNotFound, "Session not found"),
            );
            return;
        }
    };

    state.rooms.join(ctx.conn_id, session_id);
    ctx.session_id = Some(session_id);

    // Leading edge: the join itself refreshes upstream memory TTL
    if ctx.ttl.try_trigger() {
        spawn_ttl_refresh(state.orchestrator.clone(), session_id);
    }

    state.rooms.emit_to(ctx.conn_id, ServerEvent::RoomJoined { session_id });

    // Replay current state so a late or reconnecting client can resume
    if let Some(event) = state.orchestrator.replay_event(&session).await {
        state.rooms.emit_to(ctx.conn_id, event);
    }
}

async fn ready(state: &AppState, ctx: &mut ConnCtx, session_id: Uuid) {
    let session = match state.orchestrator.load_owned_session(session_id, ctx.user.id).await {
        Ok(session) => session,
        Err(_) => {
            state.rooms.emit_to(
                ctx.conn_id,
                ServerEvent::error(ErrorCode::UnauthorizedOrNotFound, "Session not found"),
            );
            return;
        }
    };
    if !matches!(session.status, SessionStatus::Ready | SessionStatus::InProgress) {
        state.rooms.emit_to(
            ctx.conn_id,
            ServerEvent::error(ErrorCode::QuestionProcessingFailed, "Interview is not ready"),
        );
        return;
    }

    // Rebuild AI memory in the background; a reconnect should not wait on it
    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        if let Err(e) = orchestrator.restore_memory(session_id).await {
            warn!(%session_id, error = %e, "AI memory restore failed");
        }
    });

    match state.orchestrator.current_question(session_id).await {
        Ok(Some(step)) => {
            state.orchestrator.log_shown_question(&step, session_id).await;
            let is_follow_up = step.is_follow_up();
            let event = state.orchestrator.next_question_event(&session, step, is_follow_up).await;
            state.rooms.emit_to(ctx.conn_id, event);
        }
        Ok(None) => {
            debug!(%session_id, "Ready received but no unanswered question remains");
        }
        Err(e) => {
            warn!(%session_id, error = %e, "Failed to resolve current question");
            state.rooms.emit_to(
                ctx.conn_id,
                ServerEvent::error(ErrorCode::QuestionProcessingFailed, "Failed to load question"),
            );
        }
    }
}

fn upload_chunk(state: &AppState, ctx: &mut ConnCtx, index: u32, chunk: &str) {
    if chunk.is_empty() {
        state.rooms.emit_to(
            ctx.conn_id,
            ServerEvent::error(ErrorCode::EmotionAnalysisFailed, "Empty upload chunk"),
        );
        return;
    }
    match base64::engine::general_purpose::STANDARD.decode(chunk) {
        Ok(bytes) => ctx.buffer_chunk(index, bytes),
        Err(e) => {
            debug!(conn_id = %ctx.conn_id, index, error = %e, "Rejected malformed upload chunk");
            state.rooms.emit_to(
                ctx.conn_id,
                ServerEvent::error(ErrorCode::EmotionAnalysisFailed, "Malformed upload chunk"),
            );
        }
    }
}

fn spawn_ttl_refresh(orchestrator: Arc<Orchestrator>, session_id: Uuid) {
    tokio::spawn(async move {
        if let Err(e) = orchestrator.refresh_ttl(session_id).await {
            debug!(%session_id, error = %e, "Upstream TTL refresh failed");
        }
    });
}

/// Ownership failures surface as UNAUTHORIZED_OR_NOT_FOUND; everything else
/// keeps the operation-specific code
fn error_event(error: &Error, default_code: ErrorCode) -> ServerEvent {
    let code = match error {
        Error::NotFound(_) | Error::Forbidden(_) => ErrorCode::UnauthorizedOrNotFound,
        _ => default_code,
    };
    let message = match code {
        ErrorCode::UnauthorizedOrNotFound => "Session not found".to_string(),
        ErrorCode::AnswerProcessingFailed => "Failed to process answer".to_string(),
        ErrorCode::EmotionAnalysisFailed => "Failed to process recording".to_string(),
        _ => "Request failed".to_string(),
    };
    ServerEvent::error(code, message)
}
