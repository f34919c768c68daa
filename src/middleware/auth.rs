use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::token::active_user;
use crate::database::models::User;
use crate::database::StoreError;
use crate::error::ApiError;
use crate::state::AppState;

/// Identity a guard resolved and re-checked against the credential store
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub display_name: String,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
        }
    }
}

/// Bearer-token guard for the API write routes.
///
/// Malformed header or bad token: 400 with an error body. Valid token for a user that no
/// longer exists: 401 with an empty body. Otherwise the request is forwarded with the
/// resolved `AuthUser` in its extensions.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let username = match username_from_headers(&state, &headers) {
        Ok(username) => username,
        Err(api_error) => {
            tracing::warn!("Token guard rejected request: {}", api_error);
            return api_error.into_response();
        }
    };

    // Checked on every request so a removed user loses access before the token expires
    match state.credentials.find_by_username(&username).await {
        Ok(user) => {
            request.extensions_mut().insert(AuthUser::from(user));
            next.run(request).await
        }
        Err(StoreError::NotFound(_)) => {
            tracing::warn!(username = %username, "Token names a user that no longer exists");
            StatusCode::UNAUTHORIZED.into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

fn username_from_headers(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    let token = extract_bearer(headers)?;
    let claims = state.tokens.parse(token)?;

    active_user(&claims)
        .map(str::to_string)
        .ok_or_else(|| ApiError::bad_request("invalid value"))
}

/// Expects exactly `<scheme> <token>` with a case-insensitive `bearer` scheme
fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let auth_str = headers
        .get(AUTHORIZATION)
        .map(|value| value.to_str())
        .transpose()
        .map_err(|_| ApiError::bad_request("invalid header"))?
        .unwrap_or_default();

    let parts: Vec<&str> = auth_str.split(' ').collect();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(ApiError::bad_request("invalid header")),
    }
}
