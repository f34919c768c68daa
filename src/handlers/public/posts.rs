// handlers/public/posts.rs - Read side of the post API

use axum::extract::{Path, State};
use serde::Serialize;

use crate::database::models::Post;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub posts: Vec<Post>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub post: Post,
}

/// GET /api/post - All posts, newest first. No posts is an empty list.
pub async fn list_posts(State(state): State<AppState>) -> ApiResult<PostsResponse> {
    let posts = state.repo.get_all_posts().await?;
    Ok(ApiResponse::success(PostsResponse { posts }))
}

/// GET /api/post/:slug - One post, 404 when the slug is unknown
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<PostResponse> {
    let post = state.repo.get_post_by_slug(&slug).await?;
    Ok(ApiResponse::success(PostResponse { post }))
}
