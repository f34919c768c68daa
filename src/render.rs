//! Page rendering seam. Handlers hand over a page name and a data map using the keys
//! `Posts`, `Post`, `ActiveUser`, `Flashes`, `CurrentPost` and `CurrentUser`; the renderer
//! turns that into an HTML document.

use askama::Template;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::database::models::{Post, PostDraft, UserDraft};

pub type PageData = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Index,
    Post,
    NewPost,
    Register,
    Login,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("missing template data: {0}")]
    MissingData(&'static str),

    #[error("bad template data: {0}")]
    BadData(#[from] serde_json::Error),

    #[error("template execution failed: {0}")]
    Template(#[from] askama::Error),
}

pub trait Renderer: Send + Sync {
    fn render(&self, page: Page, data: &PageData) -> Result<String, RenderError>;
}

#[derive(Template)]
#[template(path = "pages/index.html")]
pub struct IndexPageTemplate {
    pub active_user: Option<String>,
    pub flashes: Vec<String>,
    pub posts: Vec<Post>,
}

#[derive(Template)]
#[template(path = "pages/post.html")]
pub struct PostPageTemplate {
    pub active_user: Option<String>,
    pub flashes: Vec<String>,
    pub post: Post,
}

#[derive(Template)]
#[template(path = "pages/new_post.html")]
pub struct NewPostPageTemplate {
    pub active_user: Option<String>,
    pub flashes: Vec<String>,
    pub current_post: PostDraft,
}

#[derive(Template)]
#[template(path = "pages/register.html")]
pub struct RegisterPageTemplate {
    pub active_user: Option<String>,
    pub flashes: Vec<String>,
    pub current_user: UserDraft,
}

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginPageTemplate {
    pub active_user: Option<String>,
    pub flashes: Vec<String>,
}

/// Renders the askama templates under `templates/pages`. Everything is escaped except
/// the post body, which is trusted HTML.
#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    fn render(&self, page: Page, data: &PageData) -> Result<String, RenderError> {
        let active_user: Option<String> = optional(data, "ActiveUser")?;
        let flashes: Vec<String> = optional(data, "Flashes")?.unwrap_or_default();

        let html = match page {
            Page::Index => IndexPageTemplate {
                active_user,
                flashes,
                posts: required(data, "Posts")?,
            }
            .render()?,
            Page::Post => PostPageTemplate {
                active_user,
                flashes,
                post: required(data, "Post")?,
            }
            .render()?,
            Page::NewPost => NewPostPageTemplate {
                active_user,
                flashes,
                current_post: optional(data, "CurrentPost")?.unwrap_or_default(),
            }
            .render()?,
            Page::Register => RegisterPageTemplate {
                active_user,
                flashes,
                current_user: optional(data, "CurrentUser")?.unwrap_or_default(),
            }
            .render()?,
            Page::Login => LoginPageTemplate {
                active_user,
                flashes,
            }
            .render()?,
        };

        Ok(html)
    }
}

fn optional<T: DeserializeOwned>(data: &PageData, key: &'static str) -> Result<Option<T>, RenderError> {
    match data.get(key) {
        Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
        None => Ok(None),
    }
}

fn required<T: DeserializeOwned>(data: &PageData, key: &'static str) -> Result<T, RenderError> {
    optional(data, key)?.ok_or(RenderError::MissingData(key))
}
