use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: i64,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A `posts` row without its tags.
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub user_id: i64,
    pub author: String,
    pub image: Option<String>,
    pub weight: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// A post with its tags loaded, as served to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub user_id: i64,
    pub author: String,
    pub image: Option<String>,
    pub weight: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub tags: Vec<Tag>,
}

impl Post {
    pub fn from_row(r: PostRow, tags: Vec<Tag>) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            content: r.content,
            user_id: r.user_id,
            author: r.author,
            image: r.image,
            weight: r.weight,
            created_at: r.created_at,
            updated_at: r.updated_at,
            tags,
        }
    }
}

/// Join row used to preload tags for a batch of posts.
#[derive(Debug, FromRow)]
pub struct PostTagRow {
    pub post_id: i64,
    #[sqlx(flatten)]
    pub tag: Tag,
}

/// Fields of a post about to be inserted, already filtered by policy.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub user_id: i64,
    pub author: String,
    pub image: Option<String>,
    pub weight: i64,
}

/// Scalar fields written by an update, already filtered by policy.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub image: Option<String>,
    pub author: String,
    pub weight: i64,
}
