// src/handlers/confidence.rs

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::confidence::{
        ConfidenceMessage, ConfidenceMeter, ConfidencePoll, NEUTRAL, VoteRequest,
        summarize_confidence,
    },
    utils::jwt::Claims,
};

/// Records the current user's confidence, replacing their previous vote.
pub async fn vote(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<VoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let meter = sqlx::query_as::<_, ConfidenceMeter>(
        r#"
        INSERT INTO confidence_meters (user_id, confidence)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE
        SET confidence = EXCLUDED.confidence, updated_at = NOW()
        RETURNING user_id, confidence, updated_at
        "#,
    )
    .bind(user_id)
    .bind(payload.confidence)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to record vote for user {}: {:?}", user_id, e);
        AppError::from(e)
    })?;

    Ok(Json(meter))
}

/// The current user's own vote; neutral if they never voted.
pub async fn student_poll(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let meter = sqlx::query_as::<_, ConfidenceMeter>(
        "SELECT user_id, confidence, updated_at FROM confidence_meters WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .unwrap_or(ConfidenceMeter {
        user_id,
        confidence: NEUTRAL,
        updated_at: None,
    });

    Ok(Json(meter))
}

/// Lecturer view: vote tally plus every non-empty confidence message.
pub async fn admin_poll(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let votes: Vec<i16> = sqlx::query_scalar("SELECT confidence FROM confidence_meters")
        .fetch_all(&pool)
        .await?;

    let messages = sqlx::query_as::<_, ConfidenceMessage>(
        r#"
        SELECT u.username, p.confidence_message
        FROM user_profiles p
        JOIN users u ON u.id = p.user_id
        WHERE p.confidence_message IS NOT NULL AND p.confidence_message <> ''
        ORDER BY u.username
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(ConfidencePoll {
        summary: summarize_confidence(&votes),
        messages,
    }))
}

/// Sets every vote back to neutral, e.g. at the start of a lecture.
pub async fn reset_poll(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let reset = sqlx::query("UPDATE confidence_meters SET confidence = $1, updated_at = NOW()")
        .bind(NEUTRAL)
        .execute(&pool)
        .await?;

    tracing::info!("Reset {} confidence votes", reset.rows_affected());

    Ok(StatusCode::NO_CONTENT)
}
