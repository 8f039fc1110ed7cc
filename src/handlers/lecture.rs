// src/handlers/lecture.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    cache::{Cache, CacheKey},
    error::AppError,
    models::{
        code_snippet::{CodeSnippet, CodeSnippetResponse},
        lecture::{Lecture, LectureMaterial, MaterialResponse},
        quiz::QuizSummary,
    },
};

pub(crate) async fn fetch_lecture(pool: &PgPool, id: i64) -> Result<Lecture, AppError> {
    sqlx::query_as::<_, Lecture>(
        "SELECT id, title, slug, collab_doc, created_at FROM lectures WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Lecture not found".to_string()))
}

/// Every lecture, oldest first. Served from the `lecture_list` cache.
pub(crate) async fn lecture_list(pool: &PgPool, cache: &Cache) -> Result<Vec<Lecture>, AppError> {
    cache
        .get_or_compute(&CacheKey::LectureList, || async move {
            let lectures = sqlx::query_as::<_, Lecture>(
                "SELECT id, title, slug, collab_doc, created_at FROM lectures ORDER BY id",
            )
            .fetch_all(pool)
            .await?;
            Ok::<_, AppError>(lectures)
        })
        .await
}

/// Every visible quiz. Served from the `current_quiz_list` cache.
pub(crate) async fn current_quiz_list(
    pool: &PgPool,
    cache: &Cache,
) -> Result<Vec<QuizSummary>, AppError> {
    cache
        .get_or_compute(&CacheKey::CurrentQuizList, || async move {
            let quizzes = sqlx::query_as::<_, QuizSummary>(
                r#"
                SELECT id, lecture_id, question, slug
                FROM quizzes
                WHERE visible = TRUE
                ORDER BY id
                "#,
            )
            .fetch_all(pool)
            .await?;
            Ok::<_, AppError>(quizzes)
        })
        .await
}

/// Lists all lectures.
pub async fn list_lectures(
    State(pool): State<PgPool>,
    State(cache): State<Cache>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(lecture_list(&pool, &cache).await?))
}

/// The most recently created lecture, where students land after login.
pub async fn latest_lecture(
    State(pool): State<PgPool>,
    State(cache): State<Cache>,
) -> Result<impl IntoResponse, AppError> {
    let lecture = lecture_list(&pool, &cache)
        .await?
        .into_iter()
        .max_by_key(|l| l.id)
        .ok_or(AppError::NotFound("No lectures yet".to_string()))?;

    Ok(Json(serde_json::json!({
        "lecture": lecture,
        "url": lecture.absolute_url(),
    })))
}

pub async fn get_lecture(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(fetch_lecture(&pool, id).await?))
}

/// Lists the slides and handouts of a lecture.
pub async fn list_materials(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    fetch_lecture(&pool, id).await?;

    let materials = sqlx::query_as::<_, LectureMaterial>(
        r#"
        SELECT id, lecture_id, local_lecture_material, online_lecture_material
        FROM lecture_materials
        WHERE lecture_id = $1
        ORDER BY id
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    let materials: Vec<MaterialResponse> = materials.into_iter().map(Into::into).collect();
    Ok(Json(materials))
}

/// Lists the visible quizzes of a lecture.
pub async fn list_quizzes(
    State(pool): State<PgPool>,
    State(cache): State<Cache>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    fetch_lecture(&pool, id).await?;

    let quizzes: Vec<QuizSummary> = current_quiz_list(&pool, &cache)
        .await?
        .into_iter()
        .filter(|q| q.lecture_id == id)
        .collect();

    Ok(Json(quizzes))
}

/// Lists the code snippets of a lecture with their display markup.
pub async fn list_snippets(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    fetch_lecture(&pool, id).await?;

    let snippets = sqlx::query_as::<_, CodeSnippet>(
        "SELECT id, lecture_id, syntax, code FROM code_snippets WHERE lecture_id = $1 ORDER BY id",
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    let snippets: Vec<CodeSnippetResponse> = snippets.into_iter().map(Into::into).collect();
    Ok(Json(snippets))
}
