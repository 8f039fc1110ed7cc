// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, Transaction};
use validator::Validate;

use crate::{
    cache::{Cache, Entity, Mutation},
    config::{Config, DEFAULT_SYNTAX},
    error::AppError,
    handlers::lecture::fetch_lecture,
    models::{
        code_snippet::{CodeSnippet, CodeSnippetResponse, CreateSnippetRequest},
        lecture::{
            CreateLectureRequest, CreateMaterialRequest, Lecture, LectureMaterial, MaterialResponse,
            UpdateLectureRequest, unused_collab_doc,
        },
        quiz::{ChoiceInput, CreateQuizRequest, Quiz, UpdateQuizRequest},
    },
    utils::slug::slugify,
};

fn conflict_on_title(title: &str) -> impl FnOnce(sqlx::Error) -> AppError + '_ {
    move |e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict(format!("Lecture '{}' already exists", title)),
        other => {
            tracing::error!("Failed to save lecture: {:?}", other);
            other
        }
    }
}

/// Creates a lecture.
///
/// Without an explicit collaboration doc, the first pooled doc no other
/// lecture uses is assigned (empty when the pool is exhausted).
pub async fn create_lecture(
    State(pool): State<PgPool>,
    State(cache): State<Cache>,
    State(config): State<Config>,
    Json(payload): Json<CreateLectureRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = pool.begin().await?;

    // Serializes concurrent creates so two lectures never draw the same pooled doc.
    sqlx::query("LOCK TABLE lectures IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await?;

    let collab_doc = match payload.collab_doc {
        Some(doc) => doc,
        None => {
            let in_use: Vec<String> = sqlx::query_scalar(
                "SELECT collab_doc FROM lectures WHERE collab_doc IS NOT NULL",
            )
            .fetch_all(&mut *tx)
            .await?;
            unused_collab_doc(&config.collab_doc_pool, &in_use)
        }
    };

    let lecture = sqlx::query_as::<_, Lecture>(
        r#"
        INSERT INTO lectures (title, slug, collab_doc)
        VALUES ($1, $2, $3)
        RETURNING id, title, slug, collab_doc, created_at
        "#,
    )
    .bind(&payload.title)
    .bind(slugify(&payload.title))
    .bind(&collab_doc)
    .fetch_one(&mut *tx)
    .await
    .map_err(conflict_on_title(&payload.title))?;

    tx.commit().await?;

    cache.on_write(Entity::Lecture, Mutation::Create).await;
    tracing::info!("Created lecture {} ({})", lecture.id, lecture.title);

    Ok((StatusCode::CREATED, Json(lecture)))
}

/// Updates a lecture's title or collaboration doc. The slug is kept.
pub async fn update_lecture(
    State(pool): State<PgPool>,
    State(cache): State<Cache>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateLectureRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let title = payload.title.clone().unwrap_or_default();

    let lecture = sqlx::query_as::<_, Lecture>(
        r#"
        UPDATE lectures SET
            title = COALESCE($1, title),
            collab_doc = COALESCE($2, collab_doc)
        WHERE id = $3
        RETURNING id, title, slug, collab_doc, created_at
        "#,
    )
    .bind(payload.title)
    .bind(payload.collab_doc)
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(conflict_on_title(&title))?
    .ok_or(AppError::NotFound("Lecture not found".to_string()))?;

    cache.on_write(Entity::Lecture, Mutation::Update).await;

    Ok(Json(lecture))
}

/// Deletes a lecture and, by cascade, its quizzes, materials and snippets.
pub async fn delete_lecture(
    State(pool): State<PgPool>,
    State(cache): State<Cache>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM lectures WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete lecture: {:?}", e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Lecture not found".to_string()));
    }

    cache.on_write(Entity::Lecture, Mutation::Delete).await;
    cache.on_write(Entity::Quiz, Mutation::Delete).await;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_material(
    State(pool): State<PgPool>,
    Path(lecture_id): Path<i64>,
    Json(payload): Json<CreateMaterialRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    fetch_lecture(&pool, lecture_id).await?;

    let material = sqlx::query_as::<_, LectureMaterial>(
        r#"
        INSERT INTO lecture_materials (lecture_id, local_lecture_material, online_lecture_material)
        VALUES ($1, $2, $3)
        RETURNING id, lecture_id, local_lecture_material, online_lecture_material
        "#,
    )
    .bind(lecture_id)
    .bind(payload.local_lecture_material)
    .bind(payload.online_lecture_material)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(MaterialResponse::from(material))))
}

pub async fn delete_material(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM lecture_materials WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Material not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_snippet(
    State(pool): State<PgPool>,
    Path(lecture_id): Path<i64>,
    Json(payload): Json<CreateSnippetRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    fetch_lecture(&pool, lecture_id).await?;

    let snippet = sqlx::query_as::<_, CodeSnippet>(
        r#"
        INSERT INTO code_snippets (lecture_id, syntax, code)
        VALUES ($1, $2, $3)
        RETURNING id, lecture_id, syntax, code
        "#,
    )
    .bind(lecture_id)
    .bind(payload.syntax.as_deref().unwrap_or(DEFAULT_SYNTAX))
    .bind(&payload.code)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(CodeSnippetResponse::from(snippet))))
}

pub async fn delete_snippet(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM code_snippets WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Snippet not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn insert_choices(
    tx: &mut Transaction<'_, Postgres>,
    quiz_id: i64,
    choices: &[ChoiceInput],
) -> Result<(), AppError> {
    for c in choices {
        sqlx::query("INSERT INTO quiz_choices (quiz_id, choice, correct) VALUES ($1, $2, $3)")
            .bind(quiz_id)
            .bind(&c.choice)
            .bind(c.correct)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

/// Creates a quiz together with its choices.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    State(cache): State<Cache>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    fetch_lecture(&pool, payload.lecture_id).await?;

    let mut tx = pool.begin().await?;

    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
        INSERT INTO quizzes (lecture_id, question, visible, slug, syntax, code, answer)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, lecture_id, question, visible, slug, syntax, code, answer, last_touch
        "#,
    )
    .bind(payload.lecture_id)
    .bind(&payload.question)
    .bind(payload.visible)
    .bind(slugify(&payload.question))
    .bind(payload.syntax.as_deref().unwrap_or(DEFAULT_SYNTAX))
    .bind(&payload.code)
    .bind(&payload.answer)
    .fetch_one(&mut *tx)
    .await?;

    insert_choices(&mut tx, quiz.id, &payload.choices).await?;

    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to create quiz: {:?}", e);
        AppError::from(e)
    })?;

    cache.on_write(Entity::Quiz, Mutation::Create).await;

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Updates a quiz. A `choices` list replaces the existing choices and,
/// by cascade, the answers that referenced them.
pub async fn update_quiz(
    State(pool): State<PgPool>,
    State(cache): State<Cache>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = pool.begin().await?;

    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
        UPDATE quizzes SET
            question = COALESCE($1, question),
            visible = COALESCE($2, visible),
            syntax = COALESCE($3, syntax),
            code = COALESCE($4, code),
            answer = COALESCE($5, answer),
            last_touch = NOW()
        WHERE id = $6
        RETURNING id, lecture_id, question, visible, slug, syntax, code, answer, last_touch
        "#,
    )
    .bind(&payload.question)
    .bind(payload.visible)
    .bind(&payload.syntax)
    .bind(&payload.code)
    .bind(&payload.answer)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    if let Some(choices) = &payload.choices {
        sqlx::query("DELETE FROM quiz_choices WHERE quiz_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_choices(&mut tx, id, choices).await?;
    }

    tx.commit().await?;

    cache.on_write(Entity::Quiz, Mutation::Update).await;

    Ok(Json(quiz))
}

pub async fn delete_quiz(
    State(pool): State<PgPool>,
    State(cache): State<Cache>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete quiz: {:?}", e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    cache.on_write(Entity::Quiz, Mutation::Delete).await;

    Ok(StatusCode::NO_CONTENT)
}

/// Deletes a thread and its posts.
pub async fn delete_thread(
    State(pool): State<PgPool>,
    State(cache): State<Cache>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM threads WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Thread not found".to_string()));
    }

    cache.on_write(Entity::Thread, Mutation::Delete).await;
    cache.on_write(Entity::Post { thread_id: id }, Mutation::Delete).await;

    Ok(StatusCode::NO_CONTENT)
}

/// Deletes a single post and decrements its thread's reply count.
pub async fn delete_post(
    State(pool): State<PgPool>,
    State(cache): State<Cache>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;

    let thread_id: i64 = sqlx::query_scalar("DELETE FROM posts WHERE id = $1 RETURNING thread_id")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    sqlx::query("UPDATE threads SET replies = GREATEST(0, replies - 1) WHERE id = $1")
        .bind(thread_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    cache.on_write(Entity::Post { thread_id }, Mutation::Delete).await;
    cache.on_write(Entity::Thread, Mutation::Update).await;

    Ok(StatusCode::NO_CONTENT)
}
