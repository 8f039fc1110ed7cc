// src/models/lecture.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use crate::{config::MEDIA_URL, models::validate_url_string};

/// Represents the 'lectures' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Lecture {
    pub id: i64,

    /// Unique title.
    pub title: String,

    /// Derived from the title when the lecture is created.
    pub slug: String,

    /// Shared document students collaborate in during the lecture.
    pub collab_doc: Option<String>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Lecture {
    pub fn absolute_url(&self) -> String {
        format!("{}/{}", self.id, self.slug)
    }
}

/// First document of `pool` that no lecture uses yet, or "" when all are taken.
pub fn unused_collab_doc(pool: &[String], in_use: &[String]) -> String {
    pool.iter()
        .find(|doc| !in_use.contains(doc))
        .cloned()
        .unwrap_or_default()
}

/// DTO for creating a lecture.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLectureRequest {
    #[validate(length(min = 1, max = 30, message = "Title length must be between 1 and 30 chars"))]
    pub title: String,

    /// Omit to take a document from the shared pool.
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub collab_doc: Option<String>,
}

/// DTO for updating a lecture. The slug keeps its original value.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLectureRequest {
    #[validate(length(min = 1, max = 30, message = "Title length must be between 1 and 30 chars"))]
    pub title: Option<String>,

    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub collab_doc: Option<String>,
}

/// Represents the 'lecture_materials' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LectureMaterial {
    pub id: i64,
    pub lecture_id: i64,

    /// Path relative to the media root.
    pub local_lecture_material: Option<String>,

    pub online_lecture_material: Option<String>,
}

impl LectureMaterial {
    /// Where the material can be fetched: the online copy if any, else the local file.
    pub fn serve_material(&self) -> Option<String> {
        match self.online_lecture_material.as_deref() {
            Some(url) if !url.is_empty() => Some(url.to_string()),
            _ => self
                .local_lecture_material
                .as_deref()
                .filter(|path| !path.is_empty())
                .map(|path| format!("{}/{}", MEDIA_URL, path.trim_start_matches('/'))),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MaterialResponse {
    pub id: i64,
    pub lecture_id: i64,
    pub url: Option<String>,
}

impl From<LectureMaterial> for MaterialResponse {
    fn from(m: LectureMaterial) -> Self {
        Self {
            url: m.serve_material(),
            id: m.id,
            lecture_id: m.lecture_id,
        }
    }
}

/// DTO for attaching material to a lecture. At least one location is required.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = validate_material_source))]
pub struct CreateMaterialRequest {
    #[validate(length(max = 255), custom(function = validate_media_path))]
    pub local_lecture_material: Option<String>,

    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub online_lecture_material: Option<String>,
}

fn validate_material_source(req: &CreateMaterialRequest) -> Result<(), ValidationError> {
    let has = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
    if !has(&req.local_lecture_material) && !has(&req.online_lecture_material) {
        return Err(ValidationError::new("material_location_required"));
    }
    Ok(())
}

/// Rejects paths that would escape the media root.
fn validate_media_path(path: &str) -> Result<(), ValidationError> {
    if path.split('/').any(|segment| segment == "..") {
        return Err(ValidationError::new("invalid_media_path"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<String> {
        vec![
            "https://docs.example/a".to_string(),
            "https://docs.example/b".to_string(),
        ]
    }

    #[test]
    fn first_free_doc_is_picked() {
        let in_use = vec!["https://docs.example/a".to_string()];
        assert_eq!(unused_collab_doc(&docs(), &in_use), "https://docs.example/b");
        assert_eq!(unused_collab_doc(&docs(), &[]), "https://docs.example/a");
    }

    #[test]
    fn exhausted_pool_gives_empty_doc() {
        assert_eq!(unused_collab_doc(&docs(), &docs()), "");
        assert_eq!(unused_collab_doc(&[], &[]), "");
    }

    #[test]
    fn online_material_wins_over_local_file() {
        let material = LectureMaterial {
            id: 1,
            lecture_id: 1,
            local_lecture_material: Some("lecture/week1.pdf".to_string()),
            online_lecture_material: Some("https://slides.example/week1".to_string()),
        };
        assert_eq!(
            material.serve_material().as_deref(),
            Some("https://slides.example/week1")
        );
    }

    #[test]
    fn empty_online_link_falls_back_to_media_url() {
        let material = LectureMaterial {
            id: 1,
            lecture_id: 1,
            local_lecture_material: Some("lecture/week1.pdf".to_string()),
            online_lecture_material: Some(String::new()),
        };
        assert_eq!(
            material.serve_material().as_deref(),
            Some("/media/lecture/week1.pdf")
        );
    }

    #[test]
    fn material_needs_a_location() {
        let req = CreateMaterialRequest {
            local_lecture_material: None,
            online_lecture_material: Some(String::new()),
        };
        assert!(req.validate().is_err());

        let req = CreateMaterialRequest {
            local_lecture_material: Some("../etc/passwd".to_string()),
            online_lecture_material: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn absolute_url_joins_id_and_slug() {
        let lecture = Lecture {
            id: 4,
            title: "Graphs".to_string(),
            slug: "graphs".to_string(),
            collab_doc: None,
            created_at: None,
        };
        assert_eq!(lecture.absolute_url(), "4/graphs");
    }
}
