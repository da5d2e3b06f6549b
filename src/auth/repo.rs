use crate::auth::repo_types::{Role, User};
use crate::error::AppError;
use crate::policy;
use sqlx::SqlitePool;
use time::OffsetDateTime;

const USER_COLUMNS: &str = "id, username, password_hash, role, created_at, updated_at";

impl User {
    pub async fn count(db: &SqlitePool) -> Result<i64, AppError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(db)
            .await?;
        Ok(n)
    }

    /// Insert a new user. The role is picked by the same write statement, so
    /// concurrent registrations yield exactly one admin. A taken username
    /// surfaces as `Conflict`.
    pub async fn create(
        db: &SqlitePool,
        username: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let now = OffsetDateTime::now_utc();
        let sql = format!(
            "INSERT INTO users (username, password_hash, role, created_at, updated_at) \
             SELECT ?, ?, CASE WHEN EXISTS (SELECT 1 FROM users) THEN ? ELSE ? END, ?, ? \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .bind(password_hash)
            .bind(policy::initial_role_for(1).as_str())
            .bind(policy::initial_role_for(0).as_str())
            .bind(now)
            .bind(now)
            .fetch_one(db)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    AppError::Conflict("Username already exists".into())
                }
                other => other.into(),
            })
    }

    pub async fn find_by_username(db: &SqlitePool, username: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &SqlitePool, id: i64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn list_all(db: &SqlitePool) -> Result<Vec<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(db).await?;
        Ok(users)
    }

    /// Persist a role change. Returns `None` when the user does not exist.
    pub async fn set_role(db: &SqlitePool, id: i64, role: Role) -> Result<Option<User>, AppError> {
        let sql = format!(
            "UPDATE users SET role = ?, updated_at = ? WHERE id = ? RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(role.as_str())
            .bind(OffsetDateTime::now_utc())
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    #[tokio::test]
    async fn duplicate_username_is_conflict() {
        let state = AppState::in_memory().await.unwrap();
        User::create(&state.db, "alice", "hash").await.unwrap();
        let err = User::create(&state.db, "alice", "hash").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(User::count(&state.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn only_the_first_account_is_admin() {
        let state = AppState::in_memory().await.unwrap();
        let first = User::create(&state.db, "first", "hash").await.unwrap();
        let second = User::create(&state.db, "second", "hash").await.unwrap();
        assert_eq!(first.role, Role::Admin);
        assert_eq!(second.role, Role::User);
    }

    #[tokio::test]
    async fn set_role_updates_and_reports_missing() {
        let state = AppState::in_memory().await.unwrap();
        User::create(&state.db, "admin", "hash").await.unwrap();
        let bob = User::create(&state.db, "bob", "hash").await.unwrap();
        assert_eq!(bob.role, Role::User);

        let promoted = User::set_role(&state.db, bob.id, Role::Admin)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(promoted.role, Role::Admin);

        let stored = User::find_by_username(&state.db, "bob").await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Admin);

        assert!(User::set_role(&state.db, 999, Role::User).await.unwrap().is_none());
    }
}
