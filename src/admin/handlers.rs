use axum::{
    extract::{rejection::PathRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        extractors::AdminUser,
        repo_types::{Role, User},
    },
    error::{AppError, AppResult},
    policy::{self, DemoteDenied},
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id/promote", post(promote_user))
        .route("/admin/users/:id/demote", post(demote_user))
}

impl From<DemoteDenied> for AppError {
    fn from(denied: DemoteDenied) -> Self {
        match denied {
            DemoteDenied::NotSuperadmin => {
                AppError::Forbidden("Only the superadmin may demote users".into())
            }
            DemoteDenied::SelfDemotion => {
                AppError::Validation("The superadmin cannot be demoted".into())
            }
        }
    }
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".into())
}

#[instrument(skip_all, fields(admin_id = admin.user_id))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(User::list_all(&state.db).await?))
}

#[instrument(skip_all, fields(admin_id = admin.user_id))]
pub async fn promote_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<User>> {
    let Path(id) = id.map_err(|_| AppError::Validation("Invalid user id".into()))?;
    if !policy::can_promote(admin.role) {
        return Err(AppError::Forbidden("Admin privileges required".into()));
    }

    let user = User::set_role(&state.db, id, Role::Admin)
        .await?
        .ok_or_else(user_not_found)?;

    info!(target_id = user.id, username = %user.username, "user promoted");
    Ok(Json(user))
}

/// Only the superadmin may demote, and never itself. Existing tokens of the
/// demoted user keep their admin claim until they expire.
#[instrument(skip_all, fields(admin_id = admin.user_id))]
pub async fn demote_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<User>> {
    let superadmin_id = state.config.superadmin_id;
    if !policy::is_superadmin(admin.user_id, superadmin_id) {
        warn!(superadmin_id, "demote denied: not superadmin");
        return Err(DemoteDenied::NotSuperadmin.into());
    }

    let Path(id) = id.map_err(|_| AppError::Validation("Invalid user id".into()))?;
    policy::check_demote(admin.user_id, id, superadmin_id)?;

    let user = User::set_role(&state.db, id, Role::User)
        .await?
        .ok_or_else(user_not_found)?;

    info!(target_id = user.id, username = %user.username, "user demoted");
    Ok(Json(user))
}
