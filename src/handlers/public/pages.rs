// handlers/public/pages.rs - Browsable pages plus the register and login forms

use axum::{
    extract::{Path, State},
    response::Response,
    Form,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{FormState, Session};
use crate::database::models::{User, UserDraft};
use crate::database::StoreError;
use crate::error::PageError;
use crate::handlers::{redirect_with, render_page};
use crate::render::{Page, PageData};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub name: String,
    pub password: String,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// GET / - All posts, newest first
pub async fn index(State(state): State<AppState>, session: Session) -> Result<Response, PageError> {
    let posts = state.repo.get_all_posts().await?;

    let mut data = PageData::new();
    data.insert("Posts".to_string(), json!(posts));
    render_page(&state, Page::Index, data, session)
}

/// GET /:slug - One post, or the 404 page
pub async fn show_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    session: Session,
) -> Result<Response, PageError> {
    let post = state.repo.get_post_by_slug(&slug).await?;

    let mut data = PageData::new();
    data.insert("Post".to_string(), json!(post));
    render_page(&state, Page::Post, data, session)
}

/// GET /register - Registration form, refilled after a failed attempt
pub async fn register_form(
    State(state): State<AppState>,
    mut session: Session,
) -> Result<Response, PageError> {
    let mut data = PageData::new();
    if let Some(FormState::User(draft)) = session.take_form_state() {
        data.insert("CurrentUser".to_string(), json!(draft));
    }
    render_page(&state, Page::Register, data, session)
}

/// POST /register - Create an account, then back to `/`
///
/// Failures flash the reason, remember what was typed (never the passwords) and
/// redirect back to the form.
pub async fn register(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response, PageError> {
    let user = User::new(form.username, form.name);

    match try_register(&state, &user, &form.password, &form.confirm_password).await {
        Ok(created) => {
            tracing::info!(username = %created.username, "Registered user");
            redirect_with(&state, &session, "/")
        }
        Err(message) => {
            session.add_flash(message);
            session.set_form_state(FormState::User(UserDraft::from(&user)));
            redirect_with(&state, &session, "/register")
        }
    }
}

/// Returns the flash message on failure.
async fn try_register(
    state: &AppState,
    user: &User,
    password: &str,
    confirm_password: &str,
) -> Result<User, String> {
    user.validate().map_err(|e| e.to_string())?;

    if password != confirm_password {
        return Err("passwords don't match".to_string());
    }

    match state.credentials.register(user.clone(), password).await {
        Ok(created) => Ok(created),
        Err(StoreError::AlreadyExists(_)) => Err("username already taken".to_string()),
        Err(StoreError::Validation(v)) => Err(v.to_string()),
        Err(e) => {
            tracing::error!("Registration failed: {}", e);
            Err("could not save user".to_string())
        }
    }
}

/// GET /login - Login form
pub async fn login_form(State(state): State<AppState>, session: Session) -> Result<Response, PageError> {
    render_page(&state, Page::Login, PageData::new(), session)
}

/// POST /login - Check credentials and put the identity into the session
///
/// Every failure looks the same to the client: a `login failed` flash and a redirect
/// back to `/login`.
pub async fn login(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, PageError> {
    let user = match state.credentials.find_by_username(&form.username).await {
        Ok(user) if state.credentials.verify_password(&user, &form.password) => user,
        Ok(_) => {
            tracing::warn!(username = %form.username, "Web login with wrong password");
            session.add_flash("login failed");
            return redirect_with(&state, &session, "/login");
        }
        Err(e) => {
            tracing::warn!(username = %form.username, "Web login failed: {}", e);
            session.add_flash("login failed");
            return redirect_with(&state, &session, "/login");
        }
    };

    tracing::info!(username = %user.username, "User logged in");
    session.set_active_user(user.username, user.id);
    redirect_with(&state, &session, "/")
}
