// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::validate_url_string;

pub const SEAT_LEFT: i16 = 0;
pub const SEAT_MIDDLE: i16 = 1;
pub const SEAT_RIGHT: i16 = 2;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// User role: 'user' or 'admin'.
    pub role: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'user_profiles' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: i64,

    /// Overrides the lecture's collaboration doc, e.g. for a study group.
    pub personal_collab_doc: Option<String>,

    pub confidence_message: Option<String>,

    /// 0 = left, 1 = middle, 2 = right.
    pub seat_location: i16,
}

/// Profile joined with its owner for the current user.
#[derive(Debug, Serialize, FromRow)]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub role: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub profile: UserProfile,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
    #[validate(range(min = SEAT_LEFT, max = SEAT_RIGHT))]
    pub seat_location: Option<i16>,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for updating the current user's profile. Absent fields are kept.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub personal_collab_doc: Option<String>,
    #[validate(length(max = 50))]
    pub confidence_message: Option<String>,
    #[validate(range(min = SEAT_LEFT, max = SEAT_RIGHT))]
    pub seat_location: Option<i16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_location_must_be_known() {
        let req = CreateUserRequest {
            username: "student1".to_string(),
            password: "hunter22".to_string(),
            seat_location: Some(3),
        };
        assert!(req.validate().is_err());

        let req = CreateUserRequest {
            seat_location: Some(SEAT_MIDDLE),
            ..req
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn profile_doc_must_be_a_url() {
        let req = UpdateProfileRequest {
            personal_collab_doc: Some("not a url".to_string()),
            confidence_message: None,
            seat_location: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn profile_response_is_flat() {
        let response = ProfileResponse {
            id: 3,
            username: "z5012345".to_string(),
            role: "user".to_string(),
            profile: UserProfile {
                user_id: 3,
                personal_collab_doc: None,
                confidence_message: Some("lost at recursion".to_string()),
                seat_location: SEAT_LEFT,
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["username"], "z5012345");
        assert_eq!(json["confidence_message"], "lost at recursion");
        assert_eq!(json["seat_location"], 0);
        assert!(json.get("profile").is_none());
    }
}
