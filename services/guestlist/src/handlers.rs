//! Guestlist REST API Handlers

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use guestlist::{
    CreateGuestResponse, ErrorCode, ErrorResponse, GuestRecord, GuestSubmission, GuestlistError,
    HealthResponse, MessageResponse, ReadyResponse, RegistrationService,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Longest store failure reason reported by `/readyz`.
pub const MAX_READY_REASON_LEN: usize = 128;

/// Shared application state
pub struct AppState {
    pub registrations: RegistrationService,
}

// ==================== Error Handling ====================

pub struct ApiError(pub StatusCode, pub Json<ErrorResponse>);

impl ApiError {
    fn new(status: StatusCode, code: ErrorCode, msg: impl Into<String>) -> Self {
        ApiError(
            status,
            Json(ErrorResponse {
                error: msg.into(),
                code,
                field: None,
            }),
        )
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, msg)
    }

    pub fn invalid_field(field: &str, msg: impl Into<String>) -> Self {
        let mut err = Self::bad_request(msg);
        err.1.field = Some(field.to_string());
        err
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorCode::NotFound, msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, ErrorCode::Conflict, msg)
    }

    /// Generic 500. Details stay in the server log.
    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalError,
            "Internal server error",
        )
    }
}

impl From<GuestlistError> for ApiError {
    fn from(e: GuestlistError) -> Self {
        match e {
            GuestlistError::Validation(v) => ApiError::invalid_field(v.field(), v.to_string()),
            GuestlistError::DuplicatePerson(_) => ApiError::conflict("Guest already exists"),
            GuestlistError::IdentifierCollision(_) => {
                ApiError::conflict("Sequence id collision, please retry")
            }
            GuestlistError::NotFound(_) => ApiError::not_found("Guest not found"),
            GuestlistError::Store(err) => {
                tracing::error!("Store failure: {}", err);
                ApiError::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

// ==================== Service Endpoints ====================

pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        msg: "root endpoint not supported".to_string(),
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// 503 with a shortened reason while the record store is unreachable.
pub async fn ready(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ReadyResponse>) {
    match state.registrations.ready().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadyResponse {
                ready: true,
                reason: None,
            }),
        ),
        Err(e) => {
            tracing::warn!("Readiness check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse {
                    ready: false,
                    reason: Some(truncate_reason(&e.to_string())),
                }),
            )
        }
    }
}

fn truncate_reason(reason: &str) -> String {
    reason.chars().take(MAX_READY_REASON_LEN).collect()
}

// ==================== Guest Handlers ====================

pub async fn list_guests(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HashMap<String, GuestRecord>>, ApiError> {
    let guests = state.registrations.list().await?;
    Ok(Json(guests))
}

pub async fn create_guest(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GuestSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateGuestResponse>), ApiError> {
    let Json(submission) = payload.map_err(|rejection| {
        tracing::debug!("Rejected guest payload: {}", rejection.body_text());
        ApiError::bad_request(format!("Invalid JSON body: {}", rejection.body_text()))
    })?;

    let guest = state.registrations.create(&submission).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateGuestResponse {
            message: "Guest created successfully".to_string(),
            guest,
        }),
    ))
}

pub async fn get_guest(
    State(state): State<Arc<AppState>>,
    Path(sequence_id): Path<String>,
) -> Result<Json<GuestRecord>, ApiError> {
    let guest = state.registrations.get(&sequence_id).await?;
    Ok(Json(guest))
}

pub async fn delete_guest(
    State(state): State<Arc<AppState>>,
    Path(sequence_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.registrations.delete(&sequence_id).await?;
    Ok(Json(MessageResponse {
        msg: "deleted".to_string(),
    }))
}
