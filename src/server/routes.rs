//! REST endpoint handlers
//!
//! Each handler resolves the session, builds the GTP command, runs one
//! turn, parses the reply, and shapes the JSON envelope. An engine `?`
//! reply becomes [`FastGtpError::Engine`]; all other failures propagate
//! from the layer that produced them (see `server::types` for the HTTP
//! mapping).

use std::io::Write;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::{FastGtpError, Result};
use crate::gtp;
use crate::server::types::{
    validate_vertex, BoardsizeRequest, CommandList, Detail, EngineName, EngineVersion,
    GeneratedMove, GenmoveRequest, Health, KomiRequest, KomiValue, LoadSgfRequest, PlayRequest,
    ProtocolVersion, RawCommandRequest, SessionClosed, SessionOpened, SgfText, ValidatedJson,
};
use crate::server::AppState;

/// Run one GTP turn for a session and return the success payload.
async fn run_command(
    state: &AppState,
    session_id: &str,
    name: &str,
    arguments: &[&str],
) -> Result<String> {
    let transport = state.manager.get_transport(session_id).await?;
    let command = gtp::build_command(name, arguments, None)?;
    let raw = transport.send_command(&command).await?;
    let response = gtp::parse_response(&raw, None)?;
    if response.success {
        Ok(response.payload)
    } else {
        Err(FastGtpError::Engine(
            response
                .error
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| "Unknown GTP error".to_string()),
        ))
    }
}

pub(crate) async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub(crate) async fn open_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionOpened>)> {
    let session_id = state.manager.open_session().await?;
    Ok((StatusCode::CREATED, Json(SessionOpened { session_id })))
}

pub(crate) async fn quit_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionClosed>> {
    if state.manager.close_session(&session_id).await {
        Ok(Json(SessionClosed { closed: true }))
    } else {
        Err(FastGtpError::SessionNotFound(session_id))
    }
}

pub(crate) async fn engine_name(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<EngineName>> {
    let payload = run_command(&state, &session_id, "name", &[]).await?;
    Ok(Json(EngineName { name: payload }))
}

pub(crate) async fn engine_version(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<EngineVersion>> {
    let payload = run_command(&state, &session_id, "version", &[]).await?;
    Ok(Json(EngineVersion { version: payload }))
}

pub(crate) async fn protocol_version(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ProtocolVersion>> {
    let payload = run_command(&state, &session_id, "protocol_version", &[]).await?;
    Ok(Json(ProtocolVersion {
        protocol_version: payload,
    }))
}

pub(crate) async fn list_commands(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<CommandList>> {
    let payload = run_command(&state, &session_id, "list_commands", &[]).await?;
    let commands = payload
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    Ok(Json(CommandList { commands }))
}

pub(crate) async fn set_boardsize(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    ValidatedJson(body): ValidatedJson<BoardsizeRequest>,
) -> Result<Json<Detail>> {
    let x = body.x.to_string();
    let mut arguments = vec![x.as_str()];
    let y = body.y.map(|y| y.to_string());
    if let Some(y) = y.as_deref() {
        arguments.push(y);
    }
    let payload = run_command(&state, &session_id, "boardsize", &arguments).await?;
    Ok(Json(Detail { detail: payload }))
}

pub(crate) async fn set_komi(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    ValidatedJson(body): ValidatedJson<KomiRequest>,
) -> Result<Json<Detail>> {
    let value = body.value.to_string();
    let payload = run_command(&state, &session_id, "komi", &[value.as_str()]).await?;
    Ok(Json(Detail { detail: payload }))
}

pub(crate) async fn get_komi(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<KomiValue>> {
    let payload = run_command(&state, &session_id, "get_komi", &[]).await?;
    let komi = payload.trim().parse::<f64>().map_err(|_| {
        FastGtpError::MalformedResponse(format!("engine returned a non-numeric komi: {payload:?}"))
    })?;
    Ok(Json(KomiValue { komi }))
}

pub(crate) async fn clear_board(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Detail>> {
    let payload = run_command(&state, &session_id, "clear_board", &[]).await?;
    Ok(Json(Detail { detail: payload }))
}

pub(crate) async fn play_move(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    ValidatedJson(body): ValidatedJson<PlayRequest>,
) -> Result<Json<Detail>> {
    let vertex = validate_vertex(&body.vertex)?;
    let payload = run_command(
        &state,
        &session_id,
        "play",
        &[body.color.as_str(), vertex.as_str()],
    )
    .await?;
    Ok(Json(Detail { detail: payload }))
}

pub(crate) async fn generate_move(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    ValidatedJson(body): ValidatedJson<GenmoveRequest>,
) -> Result<Json<GeneratedMove>> {
    let payload = run_command(&state, &session_id, "genmove", &[body.color.as_str()]).await?;
    Ok(Json(GeneratedMove {
        vertex: payload.trim().to_string(),
    }))
}

pub(crate) async fn get_sgf(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SgfText>> {
    let payload = run_command(&state, &session_id, "printsgf", &[]).await?;
    Ok(Json(SgfText { sgf: payload }))
}

/// Write inline SGF content to a temp file the engine can `loadsgf`.
fn stage_sgf_content(content: &str) -> Result<tempfile::NamedTempFile> {
    let staged = (|| -> std::io::Result<tempfile::NamedTempFile> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        Ok(file)
    })();
    staged.map_err(|e| FastGtpError::TransportBroken(format!("failed to stage SGF content: {e}")))
}

pub(crate) async fn load_sgf(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    ValidatedJson(body): ValidatedJson<LoadSgfRequest>,
) -> Result<Json<Detail>> {
    // The temp file must outlive the turn, hence the binding up here.
    let mut temp_file = None;

    let filename = match (body.filename, body.content) {
        (Some(filename), None) => filename,
        (None, Some(content)) => {
            let file = stage_sgf_content(&content)?;
            let path = file.path().to_string_lossy().into_owned();
            temp_file = Some(file);
            path
        }
        _ => {
            return Err(FastGtpError::InvalidArgument(
                "exactly one of `filename` or `content` is required".to_string(),
            ));
        }
    };

    let move_number = body.move_number.map(|n| n.to_string());
    let mut arguments = vec![filename.as_str()];
    if let Some(move_number) = move_number.as_deref() {
        arguments.push(move_number);
    }

    let payload = run_command(&state, &session_id, "loadsgf", &arguments).await?;
    drop(temp_file);
    Ok(Json(Detail { detail: payload }))
}

pub(crate) async fn send_raw_command(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    ValidatedJson(body): ValidatedJson<RawCommandRequest>,
) -> Result<Json<Detail>> {
    let command = body.command.trim();
    if command.is_empty() {
        return Err(FastGtpError::InvalidArgument(
            "command cannot be empty".to_string(),
        ));
    }

    let transport = state.manager.get_transport(&session_id).await?;
    let raw = transport.send_command(command).await?;
    let response = gtp::parse_response(&raw, None)?;
    if response.success {
        Ok(Json(Detail {
            detail: response.payload,
        }))
    } else {
        Err(FastGtpError::Engine(
            response
                .error
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| "Unknown GTP error".to_string()),
        ))
    }
}
