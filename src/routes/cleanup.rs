//! HTTP trigger for the cleanup run.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::{AppState, cleanup::CleanupEngine};

/// Fatal precondition failures for the trigger endpoint. Phase- and
/// candidate-level failures do not surface here; they ride along in the run
/// report's `errors` array with a 200.
#[derive(Debug, Error)]
pub enum CleanupApiError {
    #[error("Invalid or missing cleanup trigger secret")]
    Unauthorized,

    #[error("A cleanup run is already in progress")]
    RunInProgress,

    #[error("Cleanup trigger secret is not configured")]
    SecretNotConfigured,

    #[error("Email transport is not configured")]
    EmailNotConfigured,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for CleanupApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            CleanupApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            CleanupApiError::RunInProgress => StatusCode::CONFLICT,
            CleanupApiError::SecretNotConfigured | CleanupApiError::EmailNotConfigured => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Extract the caller-supplied secret from `x-cleanup-secret` or
/// `Authorization: Bearer`.
fn extract_secret(headers: &HeaderMap) -> Option<&str> {
    if let Some(value) = headers.get("x-cleanup-secret") {
        return value.to_str().ok();
    }
    headers
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// `POST /jobs/account-cleanup`
///
/// Authorizes the caller, checks preconditions, and runs one cleanup pass.
/// Responds 200 with the run report, 401 on a bad secret, 409 if a run is
/// already in flight, or 500 if a required collaborator is unconfigured
/// (fails closed before any side effect).
#[tracing::instrument(name = "jobs.account_cleanup", skip_all)]
pub async fn trigger_cleanup(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, CleanupApiError> {
    let expected = state
        .config
        .cleanup
        .trigger_secret
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(CleanupApiError::SecretNotConfigured)?;

    // Constant-time comparison to prevent timing attacks
    let provided = extract_secret(&headers).ok_or(CleanupApiError::Unauthorized)?;
    let secrets_match: bool = provided.as_bytes().ct_eq(expected.as_bytes()).into();
    if !secrets_match {
        tracing::warn!("Rejected cleanup trigger with invalid secret");
        return Err(CleanupApiError::Unauthorized);
    }

    let mailer = state
        .mailer
        .clone()
        .ok_or(CleanupApiError::EmailNotConfigured)?;

    // Single-flight guard: a second trigger while a run is in flight gets a
    // 409 without side effects.
    let _guard = state
        .run_lock
        .try_lock()
        .map_err(|_| CleanupApiError::RunInProgress)?;

    let engine = CleanupEngine::new(
        state.db.accounts(),
        state.db.reminders(),
        mailer,
        state.billing.clone(),
        state.config.cleanup.clone(),
    );
    let report = engine.run().await;

    Ok(Json(report).into_response())
}
