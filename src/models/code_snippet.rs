// src/models/code_snippet.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{models::validate_syntax, utils::html::render_code};

/// Represents the 'code_snippets' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CodeSnippet {
    pub id: i64,
    pub lecture_id: i64,
    pub syntax: String,
    pub code: String,
}

/// Snippet with its display markup.
#[derive(Debug, Serialize)]
pub struct CodeSnippetResponse {
    pub id: i64,
    pub lecture_id: i64,
    pub syntax: String,
    pub code: String,
    pub rendered: String,
}

impl From<CodeSnippet> for CodeSnippetResponse {
    fn from(s: CodeSnippet) -> Self {
        Self {
            rendered: render_code(&s.syntax, &s.code),
            id: s.id,
            lecture_id: s.lecture_id,
            syntax: s.syntax,
            code: s.code,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSnippetRequest {
    #[validate(custom(function = validate_syntax))]
    pub syntax: Option<String>,
    #[validate(length(min = 1, max = 20000))]
    pub code: String,
}
