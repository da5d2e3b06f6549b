use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{Credentials, LoginResponse, MessageResponse, PublicUser},
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password_blocking, verify_dummy_blocking, verify_password_blocking},
        repo_types::User,
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Json(mut payload) = payload?;
    payload.validate_new().map_err(|e| {
        warn!(username = %payload.username, error = %e, "registration rejected");
        e
    })?;

    let hash = hash_password_blocking(payload.password).await?;

    let user = match User::create(&state.db, &payload.username, &hash).await {
        Ok(u) => u,
        Err(e) => {
            warn!(username = %payload.username, error = %e, "registration failed");
            return Err(e);
        }
    };

    info!(user_id = user.id, username = %user.username, role = %user.role, "user registered");
    Ok(Json(MessageResponse::new("Registration successful")))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> AppResult<Json<LoginResponse>> {
    let Json(mut payload) = payload?;
    payload.validate_login()?;

    let invalid = || AppError::Unauthorized("Invalid credentials".into());

    let Some(user) = User::find_by_username(&state.db, &payload.username).await? else {
        verify_dummy_blocking(payload.password).await;
        warn!(username = %payload.username, "login unknown username");
        return Err(invalid());
    };

    if !verify_password_blocking(payload.password, user.password_hash.clone()).await? {
        warn!(user_id = user.id, "login invalid password");
        return Err(invalid());
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.username, user.role)?;

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(Json(LoginResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

/// Current account as stored, which may differ from the role in the token.
#[instrument(skip_all, fields(user_id = claims.user_id))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = User::find_by_id(&state.db, claims.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
    Ok(Json(PublicUser::from(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::Role;

    #[test]
    fn public_user_serialization() {
        let response = PublicUser {
            id: 1,
            username: "alice".into(),
            role: Role::Admin,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["role"], "admin");
        assert_eq!(json["id"], 1);
    }
}
