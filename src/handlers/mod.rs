// handlers/mod.rs - Two-tier handler layout
//
// Public (no identity needed) → Protected (session guard for pages, bearer guard for /api).
// Both tiers serve the HTML pages and the JSON API side by side.
pub mod protected;
pub mod public;

use axum::response::{Html, IntoResponse, Response};
use serde_json::json;

use crate::auth::Session;
use crate::error::PageError;
use crate::middleware::found;
use crate::render::{Page, PageData};
use crate::state::AppState;

/// Renders a page with the per-request extras every page gets: the pending flashes
/// (consumed here) and the logged-in username. Writes the cookie back only if the
/// session changed.
pub(crate) fn render_page(
    state: &AppState,
    page: Page,
    mut data: PageData,
    mut session: Session,
) -> Result<Response, PageError> {
    let flashes = session.consume_flashes();
    if !flashes.is_empty() {
        data.insert("Flashes".to_string(), json!(flashes));
    }
    if let Some(username) = session.active_user() {
        data.insert("ActiveUser".to_string(), json!(username));
    }

    let html = Html(state.renderer.render(page, &data)?);

    if session.is_dirty() {
        let jar = state.sessions.save(&session)?;
        return Ok((jar, html).into_response());
    }
    Ok(html.into_response())
}

/// Saves the session and redirects, the tail of every form submission.
pub(crate) fn redirect_with(
    state: &AppState,
    session: &Session,
    location: &str,
) -> Result<Response, PageError> {
    let jar = state.sessions.save(session)?;
    Ok((jar, found(location)).into_response())
}
