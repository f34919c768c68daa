// handlers/public/auth.rs - POST /api/auth handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::database::StoreError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /api/auth - Exchange username and password for a bearer token
///
/// Expected Input:
/// ```json
/// { "username": "alice", "password": "pw1" }
/// ```
///
/// Expected Output (Success):
/// ```json
/// { "token": "eyJhbGciOiJIUzI1NiI..." }
/// ```
///
/// Unknown user and wrong password both answer 400 `login failed`.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<TokenResponse> {
    let Json(request) = payload?;

    let user = match state.credentials.find_by_username(&request.username).await {
        Ok(user) => user,
        Err(StoreError::NotFound(_)) => {
            tracing::warn!(username = %request.username, "API login for unknown user");
            return Err(ApiError::bad_request("login failed"));
        }
        Err(e) => return Err(e.into()),
    };

    if !state.credentials.verify_password(&user, &request.password) {
        tracing::warn!(username = %user.username, "API login with wrong password");
        return Err(ApiError::bad_request("login failed"));
    }

    let token = state.tokens.issue_for_user(&user.username)?;
    tracing::info!(username = %user.username, "Issued API token");

    Ok(ApiResponse::success(TokenResponse { token }))
}
