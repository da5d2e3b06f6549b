use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{dto::MessageResponse, extractors::AuthUser},
    error::{AppError, AppResult},
    policy,
    posts::{
        dto::PostInput,
        repo::{self, normalize_tag_names},
        repo_types::{Post, Tag},
    },
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/:id", get(get_post))
        .route("/posts/tag/:name", get(posts_by_tag))
        .route("/tags", get(list_tags))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", axum::routing::post(create_post))
        .route(
            "/posts/:id",
            axum::routing::put(update_post).delete(delete_post),
        )
}

fn post_not_found() -> AppError {
    AppError::NotFound("Post not found".into())
}

#[instrument(skip(state))]
pub async fn list_posts(State(state): State<AppState>) -> AppResult<Json<Vec<Post>>> {
    Ok(Json(repo::list_posts(&state.db).await?))
}

#[instrument(skip(state, id))]
pub async fn get_post(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Post>> {
    let Path(id) = id?;
    let post = repo::get_post(&state.db, id).await?.ok_or_else(post_not_found)?;
    Ok(Json(post))
}

#[instrument(skip_all, fields(user_id = claims.user_id))]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    payload: Result<Json<PostInput>, JsonRejection>,
) -> AppResult<Json<Post>> {
    let Json(mut input) = payload?;
    input.validate()?;

    let tags = std::mem::take(&mut input.tags);
    let post = repo::create_post(&state.db, input.into_new_post(&claims), &tags).await?;

    info!(post_id = post.id, weight = post.weight, tags = ?normalize_tag_names(&tags), "post created");
    Ok(Json(post))
}

#[instrument(skip_all, fields(user_id = claims.user_id))]
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<PostInput>, JsonRejection>,
) -> AppResult<Json<Post>> {
    let Path(id) = id?;
    let existing = repo::get_post(&state.db, id).await?.ok_or_else(post_not_found)?;

    if !policy::can_modify_post(claims.user_id, claims.role, existing.user_id) {
        warn!(post_id = id, owner_id = existing.user_id, "update denied");
        return Err(AppError::Forbidden("You are not allowed to edit this post".into()));
    }

    let Json(mut input) = payload?;
    input.validate()?;

    let tags = std::mem::take(&mut input.tags);
    let changes = input.into_changes(&claims, &existing);
    // Last write wins if the post is edited concurrently.
    let post = repo::update_post(&state.db, id, changes, &tags)
        .await?
        .ok_or_else(post_not_found)?;

    info!(post_id = id, "post updated");
    Ok(Json(post))
}

#[instrument(skip_all, fields(user_id = claims.user_id))]
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Path(id) = id?;
    let existing = repo::get_post(&state.db, id).await?.ok_or_else(post_not_found)?;

    if !policy::can_modify_post(claims.user_id, claims.role, existing.user_id) {
        warn!(post_id = id, owner_id = existing.user_id, "delete denied");
        return Err(AppError::Forbidden("You are not allowed to delete this post".into()));
    }

    if !repo::delete_post(&state.db, id).await? {
        return Err(post_not_found());
    }

    info!(post_id = id, "post deleted");
    Ok(Json(MessageResponse::new("Post deleted")))
}

#[instrument(skip(state))]
pub async fn list_tags(State(state): State<AppState>) -> AppResult<Json<Vec<Tag>>> {
    Ok(Json(repo::list_tags(&state.db).await?))
}

#[instrument(skip(state, name))]
pub async fn posts_by_tag(
    State(state): State<AppState>,
    name: Result<Path<String>, PathRejection>,
) -> AppResult<Json<Vec<Post>>> {
    let Path(name) = name?;
    let posts = repo::posts_for_tag(&state.db, &name)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".into()))?;
    Ok(Json(posts))
}
