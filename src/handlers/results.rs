// src/handlers/results.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    handlers::quiz::{fetch_choices, fetch_quiz, quiz_code_snippet},
    models::{
        quiz::{Quiz, QuizChoiceSelected, QuizType, classify_quiz},
        quiz_result::{
            FreeformAnswer, QuizResultsResponse, ResultBreakdown, SelectionEntry, aggregate_results,
        },
    },
};

/// Lists every quiz, hidden ones included, for the results dashboard.
pub async fn list_quiz_results(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let quizzes = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, lecture_id, question, visible, slug, syntax, code, answer, last_touch
        FROM quizzes
        ORDER BY lecture_id, id
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list quizzes: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(quizzes))
}

/// Results of a single quiz.
///
/// * Freeform quizzes list every submitted answer.
/// * Choice quizzes tally each choice and scale it against the most chosen one.
pub async fn quiz_results_detail(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, id).await?;
    let choices = fetch_choices(&pool, quiz.id).await?;
    let quiz_type = classify_quiz(&choices, quiz.answer.as_deref());

    let (submission_count, breakdown) = if quiz_type == QuizType::Freeform {
        let answers = sqlx::query_as::<_, FreeformAnswer>(
            r#"
            SELECT u.username, s.answer
            FROM quiz_choice_selected s
            JOIN users u ON u.id = s.user_id
            WHERE s.quiz_id = $1 AND s.quiz_choice_id IS NULL
            ORDER BY s.id
            "#,
        )
        .bind(quiz.id)
        .fetch_all(&pool)
        .await?;

        (answers.len(), ResultBreakdown::Freeform { answers })
    } else {
        let selected = sqlx::query_as::<_, QuizChoiceSelected>(
            r#"
            SELECT s.id, s.user_id, s.quiz_id, s.quiz_choice_id, s.answer
            FROM quiz_choice_selected s
            JOIN quiz_choices c ON c.id = s.quiz_choice_id
            WHERE c.quiz_id = $1
            ORDER BY s.id
            "#,
        )
        .bind(quiz.id)
        .fetch_all(&pool)
        .await?;

        let selections = sqlx::query_as::<_, SelectionEntry>(
            r#"
            SELECT u.username, c.id AS quiz_choice_id, c.choice
            FROM quiz_choice_selected s
            JOIN quiz_choices c ON c.id = s.quiz_choice_id
            JOIN users u ON u.id = s.user_id
            WHERE c.quiz_id = $1
            ORDER BY s.id
            "#,
        )
        .bind(quiz.id)
        .fetch_all(&pool)
        .await?;

        let (summary, total) = aggregate_results(&choices, &selected);
        let max_value = summary.iter().map(|row| row.times_chosen).max().unwrap_or(0);

        (
            total,
            ResultBreakdown::Choices {
                summary,
                max_value,
                selections,
            },
        )
    };

    Ok(Json(QuizResultsResponse {
        code_snippet: quiz_code_snippet(&quiz),
        quiz_type,
        submission_count,
        breakdown,
        quiz,
    }))
}
