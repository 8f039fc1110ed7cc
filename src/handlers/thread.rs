// src/handlers/thread.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    cache::{Cache, CacheKey, Entity, Mutation},
    error::AppError,
    models::thread::{
        CreatePostRequest, CreateThreadRequest, Post, PostRow, Thread, ThreadDetail, ThreadRow,
    },
    utils::{html::clean_html, jwt::Claims, slug::slugify},
};

const THREAD_COLUMNS: &str = r#"
    t.id, t.title, t.content, t.creator_id, u.username AS creator_username,
    t.created_on, t.views, t.slug, t.last_post, t.anonymous, t.replies
"#;

async fn fetch_thread(pool: &PgPool, id: i64) -> Result<Thread, AppError> {
    let sql = format!(
        "SELECT {} FROM threads t JOIN users u ON u.id = t.creator_id WHERE t.id = $1",
        THREAD_COLUMNS
    );
    let row = sqlx::query_as::<_, ThreadRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Thread not found".to_string()))?;
    Ok(row.into())
}

/// Posts of a thread in rank order. Served from the thread's `post_list` cache.
async fn post_list(pool: &PgPool, cache: &Cache, thread_id: i64) -> Result<Vec<Post>, AppError> {
    cache
        .get_or_compute(&CacheKey::PostList(thread_id), || async move {
            let rows = sqlx::query_as::<_, PostRow>(
                r#"
                SELECT
                    p.id, p.thread_id, p.content, p.creator_id, u.username AS creator_username,
                    p.last_touch, p.rank, p.anonymous
                FROM posts p
                JOIN users u ON u.id = p.creator_id
                WHERE p.thread_id = $1
                ORDER BY p.rank
                "#,
            )
            .bind(thread_id)
            .fetch_all(pool)
            .await?;
            Ok::<_, AppError>(rows.into_iter().map(Post::from).collect::<Vec<_>>())
        })
        .await
}

/// Lists all threads, most recently active first. Served from the `thread_list` cache.
pub async fn list_threads(
    State(pool): State<PgPool>,
    State(cache): State<Cache>,
) -> Result<impl IntoResponse, AppError> {
    let threads = cache
        .get_or_compute(&CacheKey::ThreadList, || async move {
            let sql = format!(
                "SELECT {} FROM threads t JOIN users u ON u.id = t.creator_id ORDER BY t.last_post DESC, t.id DESC",
                THREAD_COLUMNS
            );
            let rows = sqlx::query_as::<_, ThreadRow>(&sql).fetch_all(&pool).await?;
            Ok::<_, AppError>(rows.into_iter().map(Thread::from).collect::<Vec<_>>())
        })
        .await?;

    Ok(Json(threads))
}

/// Starts a new thread.
pub async fn create_thread(
    State(pool): State<PgPool>,
    State(cache): State<Cache>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateThreadRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO threads (title, content, creator_id, slug, anonymous)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(&payload.title)
    .bind(clean_html(&payload.content))
    .bind(user_id)
    .bind(slugify(&payload.title))
    .bind(payload.anonymous)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create thread: {:?}", e);
        AppError::from(e)
    })?;

    cache.on_write(Entity::Thread, Mutation::Create).await;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Opens a thread: counts the view and returns the thread with its posts.
///
/// The view bump leaves the cached thread list alone.
pub async fn view_thread(
    State(pool): State<PgPool>,
    State(cache): State<Cache>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let bumped = sqlx::query("UPDATE threads SET views = views + 1 WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if bumped.rows_affected() == 0 {
        return Err(AppError::NotFound("Thread not found".to_string()));
    }
    cache.on_write(Entity::Thread, Mutation::IncrementViews).await;

    let thread = fetch_thread(&pool, id).await?;
    let posts = post_list(&pool, &cache, id).await?;

    Ok(Json(ThreadDetail { thread, posts }))
}

/// Replies to a thread.
///
/// * The post is ranked after every existing post.
/// * The thread's reply count and last-post time are updated in the same transaction.
pub async fn create_post(
    State(pool): State<PgPool>,
    State(cache): State<Cache>,
    Extension(claims): Extension<Claims>,
    Path(thread_id): Path<i64>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let mut tx = pool.begin().await?;

    // Row lock serializes concurrent replies so ranks stay unique.
    let locked: Option<i64> = sqlx::query_scalar("SELECT id FROM threads WHERE id = $1 FOR UPDATE")
        .bind(thread_id)
        .fetch_optional(&mut *tx)
        .await?;
    if locked.is_none() {
        return Err(AppError::NotFound("Thread not found".to_string()));
    }

    let post_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO posts (thread_id, content, creator_id, rank, anonymous)
        VALUES ($1, $2, $3, (SELECT COALESCE(MAX(rank), 0) + 1 FROM posts WHERE thread_id = $1), $4)
        RETURNING id
        "#,
    )
    .bind(thread_id)
    .bind(clean_html(&payload.content))
    .bind(user_id)
    .bind(payload.anonymous)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE threads SET replies = replies + 1, last_post = NOW() WHERE id = $1")
        .bind(thread_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to reply to thread {}: {:?}", thread_id, e);
        AppError::from(e)
    })?;

    cache.on_write(Entity::Post { thread_id }, Mutation::Create).await;
    cache.on_write(Entity::Thread, Mutation::Update).await;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": post_id}))))
}
