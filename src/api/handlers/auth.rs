/*
 * Responsibility
 * - POST /auth/login: 資格情報を検証し、access token を発行する
 * - 失敗理由 (ユーザー不在 / パスワード不一致) は区別しない → AUTH_FAILED
 */
use axum::{Json, extract::State};

use crate::api::dto::auth::{LoginRequest, LoginResponse};
use crate::api::extractors::ApiJson;
use crate::error::AppError;
use crate::state::AppState;

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let principal = state
        .login
        .authenticate(req.username.trim(), &req.password)
        .await?;

    let issued = state.tokens.issue(&principal).map_err(|e| {
        AppError::internal(format!("token issue failed for {}: {e}", principal.subject))
    })?;

    Ok(Json(LoginResponse {
        token_type: "Bearer",
        access_token: issued.token,
        username: principal.subject.clone(),
        roles: principal.role_list(),
        expires_in: state.tokens.ttl_seconds(),
    }))
}
