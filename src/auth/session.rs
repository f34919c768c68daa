use axum::http::{header::SET_COOKIE, HeaderMap};
use axum::response::IntoResponse;
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use thiserror::Error;

use crate::database::models::{PostDraft, UserDraft};

/// Browsers drop larger `Set-Cookie` headers without telling anyone.
pub const MAX_COOKIE_BYTES: usize = 4096;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("session cookie too large: {0} bytes")]
    TooLarge(usize),
}

/// A form submission kept across the redirect back to the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "form", content = "values")]
pub enum FormState {
    Post(PostDraft),
    User(UserDraft),
}

/// Everything the session cookie carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active_user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    flashes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    form: Option<FormState>,
}

/// Per-request session. Tracks whether it changed so handlers only write the cookie when needed.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: SessionState,
    dirty: bool,
}

impl Session {
    pub fn active_user(&self) -> Option<&str> {
        self.state.active_user.as_deref()
    }

    pub fn active_user_id(&self) -> Option<i64> {
        self.state.active_user_id
    }

    pub fn set_active_user(&mut self, username: impl Into<String>, user_id: i64) {
        self.state.active_user = Some(username.into());
        self.state.active_user_id = Some(user_id);
        self.dirty = true;
    }

    pub fn clear_active_user(&mut self) {
        self.state.active_user = None;
        self.state.active_user_id = None;
        self.dirty = true;
    }

    pub fn add_flash(&mut self, message: impl Into<String>) {
        self.state.flashes.push(message.into());
        self.dirty = true;
    }

    /// Returns the pending flashes in insertion order and clears them.
    pub fn consume_flashes(&mut self) -> Vec<String> {
        if self.state.flashes.is_empty() {
            return Vec::new();
        }
        self.dirty = true;
        std::mem::take(&mut self.state.flashes)
    }

    pub fn set_form_state(&mut self, form: FormState) {
        self.state.form = Some(form);
        self.dirty = true;
    }

    /// Returns the remembered form and clears it.
    pub fn take_form_state(&mut self) -> Option<FormState> {
        let form = self.state.form.take();
        if form.is_some() {
            self.dirty = true;
        }
        form
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Reads and writes the encrypted, authenticated session cookie.
#[derive(Clone)]
pub struct SessionManager {
    key: Key,
    cookie_name: String,
    secure: bool,
}

impl SessionManager {
    /// The secret is stretched through SHA-512 into the 64 bytes the cookie key needs.
    pub fn new(secret: &[u8], cookie_name: impl Into<String>, secure: bool) -> Self {
        let digest = Sha512::digest(secret);
        Self {
            key: Key::from(digest.as_slice()),
            cookie_name: cookie_name.into(),
            secure,
        }
    }

    /// Never fails: a missing, forged, or unreadable cookie yields a fresh session.
    pub fn load(&self, headers: &HeaderMap) -> Session {
        let jar = PrivateCookieJar::from_headers(headers, self.key.clone());

        let Some(cookie) = jar.get(&self.cookie_name) else {
            return Session::default();
        };

        match serde_json::from_str::<SessionState>(cookie.value()) {
            Ok(state) => Session { state, dirty: false },
            Err(e) => {
                // Authentic but unreadable, e.g. written by an older schema
                tracing::warn!("Discarding corrupt session: {}", e);
                Session::default()
            }
        }
    }

    /// A jar holding the re-encrypted cookie, to be returned as part of the response.
    pub fn save(&self, session: &Session) -> Result<PrivateCookieJar, SessionError> {
        let value = serde_json::to_string(&session.state)?;

        let cookie = Cookie::build((self.cookie_name.clone(), value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .build();

        let jar = PrivateCookieJar::new(self.key.clone()).add(cookie);

        let size = set_cookie_len(&jar);
        if size > MAX_COOKIE_BYTES {
            return Err(SessionError::TooLarge(size));
        }

        Ok(jar)
    }
}

/// Size of the sealed, encoded `Set-Cookie` value the jar will emit.
fn set_cookie_len(jar: &PrivateCookieJar) -> usize {
    jar.clone()
        .into_response()
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|value| value.len())
        .max()
        .unwrap_or(0)
}
