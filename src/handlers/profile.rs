// src/handlers/profile.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{ProfileResponse, UpdateProfileRequest},
    utils::jwt::Claims,
};

async fn fetch_profile(pool: &PgPool, user_id: i64) -> Result<ProfileResponse, AppError> {
    sqlx::query_as::<_, ProfileResponse>(
        r#"
        SELECT
            u.id, u.username, u.role,
            p.user_id, p.personal_collab_doc, p.confidence_message, p.seat_location
        FROM users u
        JOIN user_profiles p ON p.user_id = u.id
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Profile not found".to_string()))
}

/// Returns the current user's profile.
pub async fn get_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let profile = fetch_profile(&pool, claims.user_id()?).await?;
    Ok(Json(profile))
}

/// Updates the current user's profile. Absent fields are left unchanged.
pub async fn update_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let result = sqlx::query(
        r#"
        UPDATE user_profiles SET
            personal_collab_doc = COALESCE($1, personal_collab_doc),
            confidence_message = COALESCE($2, confidence_message),
            seat_location = COALESCE($3, seat_location)
        WHERE user_id = $4
        "#,
    )
    .bind(payload.personal_collab_doc)
    .bind(payload.confidence_message)
    .bind(payload.seat_location)
    .bind(user_id)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Profile not found".to_string()));
    }

    Ok(Json(fetch_profile(&pool, user_id).await?))
}
