use serde::{Deserialize, Serialize};

use crate::auth::repo_types::Role;

/// JWT payload. The role is trusted until `exp`, even if it changes server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub iat: usize, // issued at (unix timestamp)
    pub exp: usize, // expires at (unix timestamp)
}
