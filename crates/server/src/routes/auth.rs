//! Login, logout and identity routes.

use axum::{Json, extract::State, http::StatusCode};
use practice_shop_core::{BehaviorType, Identity, Role, SessionToken};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{ApiJson, AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: SessionToken,
    pub username: String,
    pub role: Role,
    pub behavior_type: BehaviorType,
}

/// Verify credentials and open a session.
///
/// Password verification runs on the blocking pool; slow identities wait out
/// their login delay before the token is issued.
#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let verifier = state.clone();
    let identity = tokio::task::spawn_blocking(move || {
        verifier
            .users()
            .authenticate(form.username.trim(), &form.password)
    })
    .await
    .map_err(|e| AppError::Internal(format!("login task failed: {e}")))??;

    let session = state.shop().open_session(identity).await;
    set_sentry_user(&session.identity().username);

    let identity = session.identity();
    Ok(Json(LoginResponse {
        token: session.token().clone(),
        username: identity.username.clone(),
        role: identity.role,
        behavior_type: identity.behavior_type,
    }))
}

/// End the caller's session.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> StatusCode {
    state.shop().close_session(&caller.token).await;
    clear_sentry_user();
    StatusCode::NO_CONTENT
}

/// The caller's identity.
pub async fn me(RequireAuth(caller): RequireAuth) -> Json<Identity> {
    Json(caller.identity)
}
