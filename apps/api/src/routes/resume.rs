//! Axum route handlers for the Résumé API.
//!
//! Every mutating handler locks the user's session and applies the change to a copy.
//! The copy replaces the live session only once its snapshot is stored, so a failed
//! write leaves both the store and memory on the previous state.

use std::time::Instant;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::ingest::{ingest_value, IngestOptions, NamedLink};
use crate::resume::commands::EditCommand;
use crate::resume::model::Project;
use crate::resume::reorder::DropPosition;
use crate::resume::scope::KnowledgeScope;
use crate::resume::session::{
    CloseMode, DragKey, DragView, DropResult, EditorSession, ReorderList,
};
use crate::resume::snapshot::{PageNavigation, Section, Snapshot};
use crate::state::AppState;
use crate::upstream::document::DocumentRequest;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeResponse {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    pub active_projects: Vec<Project>,
    pub dirty_sections: Vec<Section>,
    pub drag: Option<DragView>,
}

impl ResumeResponse {
    fn from_session(session: &EditorSession) -> Self {
        let snapshot = session.to_snapshot();
        let dirty_sections = snapshot
            .open_sections
            .iter()
            .copied()
            .filter(|s| session.is_dirty(*s))
            .collect();
        Self {
            snapshot,
            active_projects: session.active_projects(),
            dirty_sections,
            drag: session.drag_state(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub created_id: Option<Uuid>,
    pub resume: ResumeResponse,
}

#[derive(Debug, Deserialize)]
pub struct CloseSectionRequest {
    pub mode: CloseMode,
}

#[derive(Debug, Deserialize)]
pub struct DragStartRequest {
    #[serde(flatten)]
    pub list: ReorderList,
    pub key: DragKey,
}

#[derive(Debug, Deserialize)]
pub struct DragPointerRequest {
    #[serde(flatten)]
    pub list: ReorderList,
    pub target: DragKey,
    pub offset_y: f64,
    pub target_height: f64,
}

#[derive(Debug, Serialize)]
pub struct HoverResponse {
    pub position: Option<DropPosition>,
}

#[derive(Debug, Serialize)]
pub struct DropResponse {
    #[serde(flatten)]
    pub result: DropResult,
    pub resume: ResumeResponse,
}

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub payload: serde_json::Value,
    #[serde(default)]
    pub links: Vec<NamedLink>,
}

#[derive(Debug, Deserialize)]
pub struct CraftRequest {
    pub job_description: String,
    #[serde(default)]
    pub links: Vec<NamedLink>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/resumes/:user_id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ResumeResponse>, AppError> {
    let session = state.sessions.session(user_id).await?;
    let session = session.lock().await;
    Ok(Json(ResumeResponse::from_session(&session)))
}

/// DELETE /api/v1/resumes/:user_id
pub async fn handle_reset_resume(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.reset(user_id).await?;
    info!("Reset résumé for user {user_id}");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/resumes/:user_id/commands
pub async fn handle_command(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(command): Json<EditCommand>,
) -> Result<Json<CommandResponse>, AppError> {
    let session = state.sessions.session(user_id).await?;
    let mut session = session.lock().await;
    let section = command.section();
    let created_id = commit(&state, user_id, &mut session, |next| {
        next.apply(command).map_err(|e| {
            warn!("Rejected {section:?} edit for user {user_id}: {e}");
            AppError::from(e)
        })
    })
    .await?;
    Ok(Json(CommandResponse {
        created_id,
        resume: ResumeResponse::from_session(&session),
    }))
}

/// POST /api/v1/resumes/:user_id/sections/:section/open
pub async fn handle_open_section(
    State(state): State<AppState>,
    Path((user_id, section)): Path<(Uuid, Section)>,
) -> Result<Json<ResumeResponse>, AppError> {
    let session = state.sessions.session(user_id).await?;
    let mut session = session.lock().await;
    commit(&state, user_id, &mut session, |next| {
        next.open_section(section);
        Ok(())
    })
    .await?;
    Ok(Json(ResumeResponse::from_session(&session)))
}

/// POST /api/v1/resumes/:user_id/sections/:section/close
pub async fn handle_close_section(
    State(state): State<AppState>,
    Path((user_id, section)): Path<(Uuid, Section)>,
    Json(req): Json<CloseSectionRequest>,
) -> Result<Json<ResumeResponse>, AppError> {
    let session = state.sessions.session(user_id).await?;
    let mut session = session.lock().await;
    commit(&state, user_id, &mut session, |next| {
        next.close_section(section, req.mode);
        Ok(())
    })
    .await?;
    Ok(Json(ResumeResponse::from_session(&session)))
}

/// PUT /api/v1/resumes/:user_id/scope
pub async fn handle_set_scope(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(scope): Json<KnowledgeScope>,
) -> Result<Json<ResumeResponse>, AppError> {
    let session = state.sessions.session(user_id).await?;
    let mut session = session.lock().await;
    commit(&state, user_id, &mut session, |next| {
        next.set_scope(scope);
        Ok(())
    })
    .await?;
    Ok(Json(ResumeResponse::from_session(&session)))
}

/// PUT /api/v1/resumes/:user_id/navigation
pub async fn handle_set_navigation(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(navigation): Json<PageNavigation>,
) -> Result<Json<ResumeResponse>, AppError> {
    let session = state.sessions.session(user_id).await?;
    let mut session = session.lock().await;
    commit(&state, user_id, &mut session, |next| {
        next.set_navigation(navigation);
        Ok(())
    })
    .await?;
    Ok(Json(ResumeResponse::from_session(&session)))
}

/// POST /api/v1/resumes/:user_id/drag/start
pub async fn handle_drag_start(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<DragStartRequest>,
) -> Result<StatusCode, AppError> {
    let session = state.sessions.session(user_id).await?;
    session.lock().await.drag_start(req.list, req.key)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/resumes/:user_id/drag/hover
pub async fn handle_drag_hover(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<DragPointerRequest>,
) -> Result<Json<HoverResponse>, AppError> {
    let session = state.sessions.session(user_id).await?;
    let position = session.lock().await.drag_hover(
        req.list,
        req.target,
        req.offset_y,
        req.target_height,
        Instant::now(),
    );
    Ok(Json(HoverResponse { position }))
}

/// POST /api/v1/resumes/:user_id/drag/drop
pub async fn handle_drag_drop(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<DragPointerRequest>,
) -> Result<Json<DropResponse>, AppError> {
    let session = state.sessions.session(user_id).await?;
    let mut session = session.lock().await;
    let result = commit(&state, user_id, &mut session, |next| {
        Ok(next.drag_drop(req.list, req.target, req.offset_y, req.target_height)?)
    })
    .await?;
    Ok(Json(DropResponse {
        result,
        resume: ResumeResponse::from_session(&session),
    }))
}

/// POST /api/v1/resumes/:user_id/drag/cancel
pub async fn handle_drag_cancel(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let session = state.sessions.session(user_id).await?;
    session.lock().await.drag_cancel();
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/resumes/:user_id/ingest
pub async fn handle_ingest(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<ResumeResponse>, AppError> {
    let session = state.sessions.session(user_id).await?;
    let mut session = session.lock().await;
    ingest_into(&state, user_id, &mut session, req.payload, &req.links).await?;
    Ok(Json(ResumeResponse::from_session(&session)))
}

/// POST /api/v1/resumes/:user_id/craft
///
/// Sends the job description to the crafting service and ingests whatever comes back.
pub async fn handle_craft(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<CraftRequest>,
) -> Result<Json<ResumeResponse>, AppError> {
    if req.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description must not be empty".to_string(),
        ));
    }
    let session = state.sessions.session(user_id).await?;
    let scope = session.lock().await.scope();
    let payload = state.craft.craft(&req.job_description, scope).await?;

    let mut session = session.lock().await;
    ingest_into(&state, user_id, &mut session, payload, &req.links).await?;
    Ok(Json(ResumeResponse::from_session(&session)))
}

/// POST /api/v1/resumes/:user_id/document
pub async fn handle_generate_document(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let session = state.sessions.session(user_id).await?;
    let request = DocumentRequest::from_session(&*session.lock().await);
    let document = state.documents.generate(&request).await?;

    if let Some(archive) = &state.archive {
        archive.store(user_id, &document).await?;
    }

    let disposition = content_disposition(&document.filename);
    Ok((
        [
            (header::CONTENT_TYPE, document.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(document.bytes),
    )
        .into_response())
}

async fn ingest_into(
    state: &AppState,
    user_id: Uuid,
    session: &mut EditorSession,
    payload: serde_json::Value,
    links: &[NamedLink],
) -> Result<(), AppError> {
    let options = IngestOptions {
        placement: state.config.both_scopes_placement,
    };
    let saved = ingest_value(payload, links, session.scope(), options)?;
    commit(state, user_id, session, |next| {
        next.replace_saved(saved);
        Ok(())
    })
    .await?;
    info!("Ingested crafted résumé for user {user_id}");
    Ok(())
}

/// Applies `change` to a copy of `session`, persists the copy, then swaps it in.
async fn commit<T>(
    state: &AppState,
    user_id: Uuid,
    session: &mut EditorSession,
    change: impl FnOnce(&mut EditorSession) -> Result<T, AppError>,
) -> Result<T, AppError> {
    let mut next = session.clone();
    let output = change(&mut next)?;
    state.sessions.persist(user_id, &next).await?;
    *session = next;
    Ok(output)
}

/// `attachment` disposition restricted to printable ASCII, without quotes or backslashes.
fn content_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_control() || !c.is_ascii() => '_',
            c => c,
        })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_escapes_quotes_and_controls() {
        assert_eq!(
            content_disposition("Ada_Resume.pdf"),
            "attachment; filename=\"Ada_Resume.pdf\""
        );
        let header = content_disposition("Ada \"The\" L\novelace\\.pdf");
        assert_eq!(header, "attachment; filename=\"Ada _The_ L_ovelace_.pdf\"");
        assert!(axum::http::HeaderValue::from_str(&header).is_ok());

        let header = content_disposition("José_Resume.pdf");
        assert_eq!(header, "attachment; filename=\"Jos__Resume.pdf\"");
        assert!(axum::http::HeaderValue::from_str(&header).is_ok());
    }
}
