use serde::Deserialize;

use crate::auth::claims::Claims;
use crate::error::AppError;
use crate::policy;
use crate::posts::repo_types::{NewPost, Post, PostChanges};

/// Body of `POST /posts` and `PUT /posts/{id}`.
#[derive(Debug, Deserialize)]
pub struct PostInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub weight: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl PostInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("Title is required".into()));
        }
        if self.content.trim().is_empty() {
            return Err(AppError::Validation("Content is required".into()));
        }
        Ok(())
    }

    /// Fields for a new post owned by the requester. Non-admins get their own
    /// username as author and weight 0, whatever they sent.
    pub fn into_new_post(self, requester: &Claims) -> NewPost {
        let privileged = policy::can_write_owner_fields(requester.role);
        let author = self
            .author
            .filter(|a| privileged && !a.trim().is_empty())
            .unwrap_or_else(|| requester.username.clone());
        let weight = if privileged { self.weight.unwrap_or(0) } else { 0 };
        NewPost {
            title: self.title,
            description: self.description,
            content: self.content,
            user_id: requester.user_id,
            author,
            image: self.image,
            weight,
        }
    }

    /// Changes to apply to `existing`. Non-admins cannot touch author or weight;
    /// admins overwrite whichever of the two they send.
    pub fn into_changes(self, requester: &Claims, existing: &Post) -> PostChanges {
        let privileged = policy::can_write_owner_fields(requester.role);
        let (author, weight) = if privileged {
            (
                self.author.unwrap_or_else(|| existing.author.clone()),
                self.weight.unwrap_or(existing.weight),
            )
        } else {
            (existing.author.clone(), existing.weight)
        };
        PostChanges {
            title: self.title,
            description: self.description,
            content: self.content,
            image: self.image,
            author,
            weight,
        }
    }
}
