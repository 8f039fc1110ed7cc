// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::DEFAULT_SYNTAX,
    error::AppError,
    models::quiz::{
        PublicChoice, PublicQuiz, Quiz, QuizChoice, Submission, SubmitQuizRequest, check_submission,
        classify_quiz,
    },
    utils::{html::render_code, jwt::Claims},
};

pub(crate) async fn fetch_quiz(pool: &PgPool, id: i64) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, lecture_id, question, visible, slug, syntax, code, answer, last_touch
        FROM quizzes
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

pub(crate) async fn fetch_choices(pool: &PgPool, quiz_id: i64) -> Result<Vec<QuizChoice>, AppError> {
    let choices = sqlx::query_as::<_, QuizChoice>(
        "SELECT id, quiz_id, choice, correct FROM quiz_choices WHERE quiz_id = $1 ORDER BY id",
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;
    Ok(choices)
}

/// Display markup for the quiz's code, empty when it has none.
pub(crate) fn quiz_code_snippet(quiz: &Quiz) -> String {
    match quiz.code.as_deref() {
        Some(code) => render_code(quiz.syntax.as_deref().unwrap_or(DEFAULT_SYNTAX), code),
        None => String::new(),
    }
}

/// Hidden quizzes only exist for admins.
async fn fetch_quiz_for(pool: &PgPool, id: i64, claims: &Claims) -> Result<Quiz, AppError> {
    let quiz = fetch_quiz(pool, id).await?;
    if !quiz.visible && !claims.is_admin() {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }
    Ok(quiz)
}

/// Returns a quiz for answering: its type, choices without correctness and code.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz_for(&pool, id, &claims).await?;
    let choices = fetch_choices(&pool, quiz.id).await?;

    Ok(Json(PublicQuiz {
        quiz_type: classify_quiz(&choices, quiz.answer.as_deref()),
        choices: choices.iter().map(PublicChoice::from).collect(),
        code_snippet: quiz_code_snippet(&quiz),
        id: quiz.id,
        lecture_id: quiz.lecture_id,
        question: quiz.question,
        slug: quiz.slug,
    }))
}

/// Stores the current user's answer to a quiz.
///
/// * Checks the submission against the quiz type.
/// * Replaces any earlier answer of the same user (one transaction).
pub async fn submit_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let user_id = claims.user_id()?;

    let quiz = fetch_quiz_for(&pool, id, &claims).await?;
    let choices = fetch_choices(&pool, quiz.id).await?;
    let quiz_type = classify_quiz(&choices, quiz.answer.as_deref());

    let submission = check_submission(quiz_type, &choices, &req).map_err(AppError::BadRequest)?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM quiz_choice_selected WHERE user_id = $1 AND quiz_id = $2")
        .bind(user_id)
        .bind(quiz.id)
        .execute(&mut *tx)
        .await?;

    let stored = match &submission {
        Submission::Choices(choice_ids) => {
            for choice_id in choice_ids {
                sqlx::query(
                    "INSERT INTO quiz_choice_selected (user_id, quiz_id, quiz_choice_id) VALUES ($1, $2, $3)",
                )
                .bind(user_id)
                .bind(quiz.id)
                .bind(*choice_id)
                .execute(&mut *tx)
                .await?;
            }
            choice_ids.len()
        }
        Submission::Freeform(answer) => {
            sqlx::query("INSERT INTO quiz_choice_selected (user_id, quiz_id, answer) VALUES ($1, $2, $3)")
                .bind(user_id)
                .bind(quiz.id)
                .bind(answer)
                .execute(&mut *tx)
                .await?;
            1
        }
    };

    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to store answer for quiz {}: {:?}", quiz.id, e);
        AppError::from(e)
    })?;

    tracing::debug!("User {} answered quiz {} ({:?})", user_id, quiz.id, quiz_type);

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "quiz_id": quiz.id,
            "type": quiz_type,
            "stored": stored,
        })),
    ))
}
