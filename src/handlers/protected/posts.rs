// handlers/protected/posts.rs - Write side of the post API

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::database::models::{Post, ValidationError};
use crate::handlers::public::posts::PostResponse;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostRequest {
    pub slug: String,
    pub title: String,
    pub body: String,
}

impl PostRequest {
    fn into_post(self, author: &AuthUser) -> Post {
        Post {
            slug: self.slug,
            user_id: author.id,
            title: self.title,
            body: self.body,
            ..Post::default()
        }
    }
}

/// POST /api/post - Create or replace a post authored by the token's user
///
/// Expected Input:
/// ```json
/// { "slug": "hello", "title": "Hello", "body": "<p>hi</p>" }
/// ```
///
/// Expected Output (201):
/// ```json
/// { "post": { "slug": "hello", "author": "Alice", "title": "Hello", "body": "<p>hi</p>",
///             "created": "...", "modified": "..." } }
/// ```
pub async fn create_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<PostRequest>, JsonRejection>,
) -> ApiResult<PostResponse> {
    let Json(request) = payload?;

    let post = request.into_post(&user);
    post.validate()?;

    let post = state.repo.save_post(post).await?;
    tracing::info!(slug = %post.slug, username = %user.username, "Post created via API");

    Ok(ApiResponse::created(PostResponse { post }))
}

/// PUT /api/post/:slug - Replace the post at `slug`
///
/// The path decides which post is written. A body may repeat the slug or leave it out,
/// but may not name a different one.
pub async fn update_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(slug): Path<String>,
    payload: Result<Json<PostRequest>, JsonRejection>,
) -> ApiResult<PostResponse> {
    let Json(mut request) = payload?;

    if !request.slug.is_empty() && request.slug != slug {
        return Err(ValidationError::new("slug", "does not match path").into());
    }
    request.slug = slug;

    let post = request.into_post(&user);
    post.validate()?;

    let post = state.repo.save_post(post).await?;
    tracing::info!(slug = %post.slug, username = %user.username, "Post updated via API");

    Ok(ApiResponse::success(PostResponse { post }))
}
