//! JSON envelopes and error mapping for the REST adapter
//!
//! Request bodies are deserialized into the structs below; invalid bodies
//! are rejected by axum's `Json` extractor before any engine traffic.
//! Core errors map onto HTTP statuses here, in one place.

use std::sync::OnceLock;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{FastGtpError, Result};

/// `axum::Json` with rejections folded into the crate's error envelope.
///
/// The built-in `Json` extractor answers undeserializable bodies with a
/// plain-text rejection. Every non-2xx reply of this service carries a
/// `{"detail": ...}` JSON body, so request DTOs are extracted through this
/// wrapper instead: a rejection becomes
/// [`FastGtpError::InvalidArgument`] and goes through the same
/// [`IntoResponse`] mapping as every other error.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = FastGtpError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(FastGtpError::InvalidArgument(rejection.body_text())),
        }
    }
}

/// Error envelope used for every non-2xx reply.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub detail: String,
}

/// `POST /open_session` reply.
#[derive(Debug, Serialize)]
pub struct SessionOpened {
    pub session_id: String,
}

/// `POST /{sid}/quit` reply.
#[derive(Debug, Serialize)]
pub struct SessionClosed {
    pub closed: bool,
}

/// Generic reply carrying the engine payload verbatim.
#[derive(Debug, Serialize)]
pub struct Detail {
    pub detail: String,
}

/// `GET /{sid}/name` reply.
#[derive(Debug, Serialize)]
pub struct EngineName {
    pub name: String,
}

/// `GET /{sid}/version` reply.
#[derive(Debug, Serialize)]
pub struct EngineVersion {
    pub version: String,
}

/// `GET /{sid}/protocol_version` reply.
#[derive(Debug, Serialize)]
pub struct ProtocolVersion {
    pub protocol_version: String,
}

/// `GET /{sid}/commands` reply.
#[derive(Debug, Serialize)]
pub struct CommandList {
    pub commands: Vec<String>,
}

/// `GET /{sid}/komi` reply.
#[derive(Debug, Serialize)]
pub struct KomiValue {
    pub komi: f64,
}

/// `POST /{sid}/genmove` reply.
#[derive(Debug, Serialize)]
pub struct GeneratedMove {
    #[serde(rename = "move")]
    pub vertex: String,
}

/// `GET /{sid}/sgf` reply.
#[derive(Debug, Serialize)]
pub struct SgfText {
    pub sgf: String,
}

/// `GET /health` reply.
#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
}

/// Stone color as accepted on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Color {
    B,
    W,
}

impl Color {
    pub fn as_str(self) -> &'static str {
        match self {
            Color::B => "B",
            Color::W => "W",
        }
    }
}

/// `POST /{sid}/boardsize` body.
#[derive(Debug, Deserialize)]
pub struct BoardsizeRequest {
    pub x: u32,
    pub y: Option<u32>,
}

/// `POST /{sid}/komi` body.
#[derive(Debug, Deserialize)]
pub struct KomiRequest {
    pub value: f64,
}

/// `POST /{sid}/play` body.
#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    pub color: Color,
    pub vertex: String,
}

/// `POST /{sid}/genmove` body.
#[derive(Debug, Deserialize)]
pub struct GenmoveRequest {
    pub color: Color,
}

/// `POST /{sid}/sgf` body. Exactly one of `filename`/`content` is required.
#[derive(Debug, Deserialize)]
pub struct LoadSgfRequest {
    pub filename: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "move")]
    pub move_number: Option<u32>,
}

/// `POST /{sid}/command` body.
#[derive(Debug, Deserialize)]
pub struct RawCommandRequest {
    pub command: String,
}

fn vertex_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("^[A-Za-z][0-9]+$").expect("hard-coded pattern"))
}

/// Validate a board vertex and normalize it to uppercase.
///
/// # Errors
///
/// Returns [`FastGtpError::InvalidArgument`] when the vertex is not a
/// letter followed by digits.
pub fn validate_vertex(vertex: &str) -> Result<String> {
    if vertex_pattern().is_match(vertex) {
        Ok(vertex.to_ascii_uppercase())
    } else {
        Err(FastGtpError::InvalidArgument(format!(
            "vertex must be a letter followed by digits, got {vertex:?}"
        )))
    }
}

impl FastGtpError {
    /// HTTP status for this error.
    fn status(&self) -> StatusCode {
        match self {
            FastGtpError::InvalidArgument(_) => StatusCode::UNPROCESSABLE_ENTITY,
            FastGtpError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            FastGtpError::MalformedResponse(_)
            | FastGtpError::Engine(_)
            | FastGtpError::EngineExited(_)
            | FastGtpError::TransportBroken(_)
            | FastGtpError::IdentifierMismatch { .. } => StatusCode::BAD_GATEWAY,
            FastGtpError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            // 499 is nginx's "client closed request"; axum has no constant.
            FastGtpError::Cancelled => {
                StatusCode::from_u16(499).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Human-readable detail carried in the error envelope.
    ///
    /// Engine failures surface the engine's own message so that clients
    /// see exactly what the engine said.
    fn detail(&self) -> String {
        match self {
            FastGtpError::Engine(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for FastGtpError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = %status, error = %self, "request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "request rejected");
        }
        let body = Json(ErrorDetail {
            detail: self.detail(),
        });
        (status, body).into_response()
    }
}
