// src/models/quiz.rs

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::validate_syntax;

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub lecture_id: i64,
    pub question: String,

    /// Hidden quizzes are only reachable through the admin routes.
    pub visible: bool,

    pub slug: String,

    /// Optional code attached to the question.
    pub syntax: Option<String>,
    pub code: Option<String>,

    /// Expected answer of a freeform quiz.
    pub answer: Option<String>,

    pub last_touch: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'quiz_choices' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizChoice {
    pub id: i64,
    pub quiz_id: i64,
    pub choice: String,
    pub correct: bool,
}

/// Represents the 'quiz_choice_selected' table: one user's answer to one quiz.
/// Choice quizzes fill `quiz_choice_id`, freeform quizzes fill `answer`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizChoiceSelected {
    pub id: i64,
    pub user_id: i64,
    pub quiz_id: i64,
    pub quiz_choice_id: Option<i64>,
    pub answer: Option<String>,
}

/// How a quiz is answered. Derived from its choices, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizType {
    /// No correct choice and no freeform answer.
    NoChoices,
    SingleCorrect,
    MultipleCorrect,
    Freeform,
}

/// Derives the quiz type from its choices and freeform answer.
///
/// The number of correct choices is checked first, so choices marked correct
/// always win over a freeform answer. A quiz whose choices are all incorrect
/// and that has no freeform answer is `NoChoices`.
pub fn classify_quiz(choices: &[QuizChoice], freeform_answer: Option<&str>) -> QuizType {
    let num_correct = choices.iter().filter(|c| c.correct).count();

    match num_correct {
        1 => QuizType::SingleCorrect,
        n if n > 1 => QuizType::MultipleCorrect,
        _ if freeform_answer.is_some_and(|a| !a.is_empty()) => QuizType::Freeform,
        _ => QuizType::NoChoices,
    }
}

/// Choice as shown to students (correctness hidden).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicChoice {
    pub id: i64,
    pub choice: String,
}

impl From<&QuizChoice> for PublicChoice {
    fn from(c: &QuizChoice) -> Self {
        Self {
            id: c.id,
            choice: c.choice.clone(),
        }
    }
}

/// DTO for sending a quiz to a student (excludes correctness and the freeform answer).
#[derive(Debug, Serialize)]
pub struct PublicQuiz {
    pub id: i64,
    pub lecture_id: i64,
    pub question: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub quiz_type: QuizType,
    pub choices: Vec<PublicChoice>,
    pub code_snippet: String,
}

/// Entry of the current quiz list: a visible quiz without its choices.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizSummary {
    pub id: i64,
    pub lecture_id: i64,
    pub question: String,
    pub slug: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChoiceInput {
    #[validate(length(min = 1, max = 1000))]
    pub choice: String,
    #[serde(default)]
    pub correct: bool,
}

/// DTO for creating a quiz together with its choices.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    pub lecture_id: i64,
    #[validate(length(min = 1, max = 2000))]
    pub question: String,
    #[serde(default)]
    pub visible: bool,
    #[validate(custom(function = validate_syntax))]
    pub syntax: Option<String>,
    #[validate(length(max = 20000))]
    pub code: Option<String>,
    #[validate(length(max = 2000))]
    pub answer: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub choices: Vec<ChoiceInput>,
}

/// DTO for updating a quiz. `choices`, when present, replaces every existing choice.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 2000))]
    pub question: Option<String>,
    pub visible: Option<bool>,
    #[validate(custom(function = validate_syntax))]
    pub syntax: Option<String>,
    #[validate(length(max = 20000))]
    pub code: Option<String>,
    #[validate(length(max = 2000))]
    pub answer: Option<String>,
    #[validate(nested)]
    pub choices: Option<Vec<ChoiceInput>>,
}

/// DTO for answering a quiz.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SubmitQuizRequest {
    /// Selected choice ids (single or multiple choice quizzes).
    #[serde(default)]
    pub choice_ids: Vec<i64>,

    /// Freeform answer text.
    #[validate(length(max = 2000))]
    pub answer: Option<String>,
}

/// A checked submission, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Choices(Vec<i64>),
    Freeform(String),
}

/// Checks a submission against the quiz type and the quiz's own choices.
pub fn check_submission(
    quiz_type: QuizType,
    choices: &[QuizChoice],
    req: &SubmitQuizRequest,
) -> Result<Submission, String> {
    let known: HashSet<i64> = choices.iter().map(|c| c.id).collect();
    let mut picked = Vec::with_capacity(req.choice_ids.len());
    for id in &req.choice_ids {
        if !known.contains(id) {
            return Err(format!("Choice {} does not belong to this quiz", id));
        }
        if !picked.contains(id) {
            picked.push(*id);
        }
    }

    match quiz_type {
        QuizType::NoChoices => Err("This quiz does not accept answers".to_string()),
        QuizType::SingleCorrect if picked.len() != 1 => {
            Err("Exactly one choice must be selected".to_string())
        }
        QuizType::MultipleCorrect if picked.is_empty() => {
            Err("At least one choice must be selected".to_string())
        }
        QuizType::SingleCorrect | QuizType::MultipleCorrect => Ok(Submission::Choices(picked)),
        QuizType::Freeform => match req.answer.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(Submission::Freeform(text.to_string())),
            _ => Err("An answer is required".to_string()),
        },
    }
}
