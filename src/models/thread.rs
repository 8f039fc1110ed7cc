// src/models/thread.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

pub const ANONYMOUS_NAME: &str = "anonymous";

/// Name shown for an author who may have chosen to stay anonymous.
pub fn creator_name(anonymous: bool, username: &str) -> String {
    if anonymous {
        ANONYMOUS_NAME.to_string()
    } else {
        username.to_string()
    }
}

/// Row of the 'threads' table joined with its creator's username.
#[derive(Debug, Clone, FromRow)]
pub struct ThreadRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub creator_id: i64,
    pub creator_username: String,
    pub created_on: Option<chrono::DateTime<chrono::Utc>>,
    pub views: i32,
    pub slug: String,
    pub last_post: Option<chrono::DateTime<chrono::Utc>>,
    pub anonymous: bool,
    pub replies: i32,
}

/// Thread as returned to clients; the creator's identity is masked when anonymous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub creator_name: String,
    pub created_on: Option<chrono::DateTime<chrono::Utc>>,
    pub views: i32,
    pub slug: String,
    pub last_post: Option<chrono::DateTime<chrono::Utc>>,
    pub anonymous: bool,
    pub replies: i32,
}

impl From<ThreadRow> for Thread {
    fn from(row: ThreadRow) -> Self {
        Self {
            creator_name: creator_name(row.anonymous, &row.creator_username),
            id: row.id,
            title: row.title,
            content: row.content,
            created_on: row.created_on,
            views: row.views,
            slug: row.slug,
            last_post: row.last_post,
            anonymous: row.anonymous,
            replies: row.replies,
        }
    }
}

/// Row of the 'posts' table joined with its creator's username.
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: i64,
    pub thread_id: i64,
    pub content: String,
    pub creator_id: i64,
    pub creator_username: String,
    pub last_touch: Option<chrono::DateTime<chrono::Utc>>,
    pub rank: i32,
    pub anonymous: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub thread_id: i64,
    pub content: String,
    pub creator_name: String,
    pub last_touch: Option<chrono::DateTime<chrono::Utc>>,
    /// Position of the post within its thread.
    pub rank: i32,
    pub anonymous: bool,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            creator_name: creator_name(row.anonymous, &row.creator_username),
            id: row.id,
            thread_id: row.thread_id,
            content: row.content,
            last_touch: row.last_touch,
            rank: row.rank,
            anonymous: row.anonymous,
        }
    }
}

/// A thread page: the thread head followed by its posts in rank order.
#[derive(Debug, Serialize)]
pub struct ThreadDetail {
    pub thread: Thread,
    pub posts: Vec<Post>,
}

fn default_anonymous() -> bool {
    true
}

/// DTO for creating a new thread.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateThreadRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title length must be between 1 and 200 chars"
    ))]
    pub title: String,

    #[validate(length(
        min = 1,
        max = 10000,
        message = "Content length must be between 1 and 10000 chars"
    ))]
    pub content: String,

    #[serde(default = "default_anonymous")]
    pub anonymous: bool,
}

/// DTO for replying to a thread.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(
        min = 1,
        max = 10000,
        message = "Content length must be between 1 and 10000 chars"
    ))]
    pub content: String,

    #[serde(default = "default_anonymous")]
    pub anonymous: bool,
}
