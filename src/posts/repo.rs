use std::collections::{HashMap, HashSet};

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use time::OffsetDateTime;

use crate::error::AppError;
use crate::posts::repo_types::{NewPost, Post, PostChanges, PostRow, PostTagRow, Tag};

const POST_COLUMNS: &str =
    "id, title, description, content, user_id, author, image, weight, created_at, updated_at";
const TAG_COLUMNS: &str = "id, name, created_at, updated_at";
// Heaviest first, then newest; id breaks exact ties.
const RANKING: &str = "ORDER BY weight DESC, julianday(created_at) DESC, id DESC";
// Stay well under SQLite's bound-parameter limit when preloading tags.
const TAG_PRELOAD_CHUNK: usize = 500;

/// Trim names, drop blanks and collapse duplicates, keeping first-seen order.
pub fn normalize_tag_names(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .filter(|n| seen.insert(n.to_string()))
        .map(str::to_string)
        .collect()
}

pub async fn list_posts(db: &SqlitePool) -> Result<Vec<Post>, AppError> {
    let mut conn = db.acquire().await?;
    let sql = format!("SELECT {POST_COLUMNS} FROM posts {RANKING}");
    let rows = sqlx::query_as::<_, PostRow>(&sql)
        .fetch_all(&mut *conn)
        .await?;
    with_tags(&mut conn, rows).await
}

pub async fn get_post(db: &SqlitePool, id: i64) -> Result<Option<Post>, AppError> {
    let mut conn = db.acquire().await?;
    load_post(&mut conn, id).await
}

/// Insert the post and link its tags in one transaction.
pub async fn create_post(db: &SqlitePool, new: NewPost, tag_names: &[String]) -> Result<Post, AppError> {
    let now = OffsetDateTime::now_utc();
    let mut tx = db.begin().await?;

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO posts (title, description, content, user_id, author, image, weight, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&new.title)
    .bind(&new.description)
    .bind(&new.content)
    .bind(new.user_id)
    .bind(&new.author)
    .bind(&new.image)
    .bind(new.weight)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    attach_tags(&mut tx, id, tag_names).await?;
    let post = load_post(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("post {id} vanished after insert")))?;
    tx.commit().await?;
    Ok(post)
}

/// Overwrite the scalar fields and replace the whole tag set. `None` if the post is gone.
pub async fn update_post(
    db: &SqlitePool,
    id: i64,
    changes: PostChanges,
    tag_names: &[String],
) -> Result<Option<Post>, AppError> {
    let mut tx = db.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE posts
           SET title = ?, description = ?, content = ?, image = ?, author = ?, weight = ?, updated_at = ?
         WHERE id = ?
        "#,
    )
    .bind(&changes.title)
    .bind(&changes.description)
    .bind(&changes.content)
    .bind(&changes.image)
    .bind(&changes.author)
    .bind(changes.weight)
    .bind(OffsetDateTime::now_utc())
    .bind(id)
    .execute(&mut *tx)
    .await?;
    if updated.rows_affected() == 0 {
        return Ok(None);
    }

    sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    attach_tags(&mut tx, id, tag_names).await?;

    let post = load_post(&mut tx, id).await?;
    tx.commit().await?;
    Ok(post)
}

/// Clear the post's tag links, then remove it. Returns whether a post was deleted.
pub async fn delete_post(db: &SqlitePool, id: i64) -> Result<bool, AppError> {
    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let deleted = sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    tx.commit().await?;
    Ok(deleted > 0)
}

/// Existing tag with exactly this name, or a new one. The UNIQUE(name)
/// constraint settles concurrent creators; both end up with the same row.
pub async fn find_or_create_tag(conn: &mut SqliteConnection, name: &str) -> Result<Tag, AppError> {
    let now = OffsetDateTime::now_utc();
    sqlx::query(
        "INSERT INTO tags (name, created_at, updated_at) VALUES (?, ?, ?) ON CONFLICT(name) DO NOTHING",
    )
    .bind(name)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let sql = format!("SELECT {TAG_COLUMNS} FROM tags WHERE name = ?");
    let tag = sqlx::query_as::<_, Tag>(&sql)
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;
    Ok(tag)
}

pub async fn list_tags(db: &SqlitePool) -> Result<Vec<Tag>, AppError> {
    let sql = format!("SELECT {TAG_COLUMNS} FROM tags ORDER BY name");
    let tags = sqlx::query_as::<_, Tag>(&sql).fetch_all(db).await?;
    Ok(tags)
}

/// Posts carrying the named tag, ranked like [`list_posts`]. `None` if no such tag exists.
pub async fn posts_for_tag(db: &SqlitePool, name: &str) -> Result<Option<Vec<Post>>, AppError> {
    let mut conn = db.acquire().await?;

    let sql = format!("SELECT {TAG_COLUMNS} FROM tags WHERE name = ?");
    let Some(tag) = sqlx::query_as::<_, Tag>(&sql)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let sql = format!(
        "SELECT {POST_COLUMNS} FROM posts \
         WHERE id IN (SELECT post_id FROM post_tags WHERE tag_id = ?) {RANKING}"
    );
    let rows = sqlx::query_as::<_, PostRow>(&sql)
        .bind(tag.id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(Some(with_tags(&mut conn, rows).await?))
}

async fn attach_tags(conn: &mut SqliteConnection, post_id: i64, tag_names: &[String]) -> Result<(), AppError> {
    for name in normalize_tag_names(tag_names) {
        let tag = find_or_create_tag(&mut *conn, &name).await?;
        sqlx::query("INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(tag.id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn load_post(conn: &mut SqliteConnection, id: i64) -> Result<Option<Post>, AppError> {
    let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?");
    let Some(row) = sqlx::query_as::<_, PostRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };
    Ok(with_tags(conn, vec![row]).await?.pop())
}

/// Preload tags for `rows`, preserving their order.
async fn with_tags(conn: &mut SqliteConnection, rows: Vec<PostRow>) -> Result<Vec<Post>, AppError> {
    let mut by_post: HashMap<i64, Vec<Tag>> = HashMap::new();

    for chunk in rows.chunks(TAG_PRELOAD_CHUNK) {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT pt.post_id AS post_id, t.id AS id, t.name AS name, \
             t.created_at AS created_at, t.updated_at AS updated_at \
             FROM post_tags pt JOIN tags t ON t.id = pt.tag_id \
             WHERE pt.post_id IN (",
        );
        let mut ids = qb.separated(", ");
        for row in chunk {
            ids.push_bind(row.id);
        }
        ids.push_unseparated(") ORDER BY t.name");

        let links = qb
            .build_query_as::<PostTagRow>()
            .fetch_all(&mut *conn)
            .await?;
        for link in links {
            by_post.entry(link.post_id).or_default().push(link.tag);
        }
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let tags = by_post.remove(&row.id).unwrap_or_default();
            Post::from_row(row, tags)
        })
        .collect())
}
