// handlers/protected/pages.rs - Session-guarded pages

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Extension, Form,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{FormState, Session, SessionError};
use crate::database::models::{Post, PostDraft};
use crate::database::StoreError;
use crate::error::PageError;
use crate::handlers::{redirect_with, render_page};
use crate::middleware::{found, AuthUser};
use crate::render::{Page, PageData};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub slug: String,
    pub title: String,
    pub body: String,
}

/// GET /new - New post form, refilled with the last rejected draft
pub async fn new_post_form(
    State(state): State<AppState>,
    mut session: Session,
) -> Result<Response, PageError> {
    let mut data = PageData::new();
    if let Some(FormState::Post(draft)) = session.take_form_state() {
        data.insert("CurrentPost".to_string(), json!(draft));
    }
    render_page(&state, Page::NewPost, data, session)
}

/// POST /new - Publish as the logged-in user, then show the post
pub async fn create_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    mut session: Session,
    Form(form): Form<PostForm>,
) -> Result<Response, PageError> {
    let post = Post {
        slug: form.slug,
        user_id: user.id,
        title: form.title,
        body: form.body,
        ..Post::default()
    };

    if let Err(e) = post.validate() {
        return reject_draft(&state, session, &post, e.to_string());
    }

    match state.repo.save_post(post.clone()).await {
        Ok(saved) => {
            tracing::info!(slug = %saved.slug, username = %user.username, "Post saved");
            redirect_with(&state, &session, &format!("/{}", saved.slug))
        }
        Err(StoreError::Validation(v)) => reject_draft(&state, session, &post, v.to_string()),
        Err(e) => {
            tracing::error!(slug = %post.slug, "Saving post failed: {}", e);
            reject_draft(&state, session, &post, "could not save post".to_string())
        }
    }
}

/// Flashes `message` and remembers the draft for the form. A body too large for the
/// cookie is left out so the flash still gets through.
fn reject_draft(
    state: &AppState,
    mut session: Session,
    post: &Post,
    message: String,
) -> Result<Response, PageError> {
    let mut draft = PostDraft::from(post);
    session.add_flash(message);
    session.set_form_state(FormState::Post(draft.clone()));

    match state.sessions.save(&session) {
        Ok(jar) => Ok((jar, found("/new")).into_response()),
        Err(SessionError::TooLarge(size)) => {
            tracing::warn!(slug = %draft.slug, size, "Draft too large for the session, dropping body");
            draft.body.clear();
            session.set_form_state(FormState::Post(draft));
            redirect_with(state, &session, "/new")
        }
        Err(e) => Err(e.into()),
    }
}

/// ANY /logout - Drop the identity from the session
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    mut session: Session,
) -> Result<Response, PageError> {
    tracing::info!(username = %user.username, "User logged out");
    session.clear_active_user();
    redirect_with(&state, &session, "/")
}
