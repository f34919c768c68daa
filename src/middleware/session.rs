use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::Session;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::found;
use crate::state::AppState;

/// Session guard for the web write routes. Anything short of a logged-in user who still
/// exists in the store is sent back to `/`.
///
/// The loaded session rides along in the request extensions so the handler reuses it
/// instead of decoding the cookie a second time.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let session = state.sessions.load(&headers);

    let Some(username) = session.active_user().map(str::to_string) else {
        tracing::debug!("No active user in session, redirecting");
        return found("/");
    };

    match state.credentials.find_by_username(&username).await {
        Ok(user) => {
            request.extensions_mut().insert(AuthUser::from(user));
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(username = %username, "Session user rejected: {}", e);
            found("/")
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.remove::<Session>() {
            return Ok(session);
        }
        Ok(state.sessions.load(&parts.headers))
    }
}
