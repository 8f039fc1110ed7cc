// src/models/quiz_result.rs

use serde::Serialize;
use sqlx::FromRow;

use crate::models::quiz::{Quiz, QuizChoice, QuizChoiceSelected, QuizType};

/// One bar of the results chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceSummary {
    pub choice_id: i64,
    pub choice: String,
    pub correct: bool,
    pub times_chosen: i64,
    /// `times_chosen` scaled against the most chosen choice, 0..=100.
    pub relative_percentage: i64,
}

/// Tallies selections per choice.
///
/// Rows follow the order of `choices`. The percentage is
/// `times_chosen * 100 / max_times_chosen` with integer division, and 0 for
/// every row when nothing was chosen. The returned count is the number of
/// selections that reference one of `choices`.
pub fn aggregate_results(
    choices: &[QuizChoice],
    selections: &[QuizChoiceSelected],
) -> (Vec<ChoiceSummary>, usize) {
    let counts: Vec<i64> = choices
        .iter()
        .map(|c| {
            selections
                .iter()
                .filter(|s| s.quiz_choice_id == Some(c.id))
                .count() as i64
        })
        .collect();

    let max_times_chosen = counts.iter().copied().max().unwrap_or(0);

    let rows = choices
        .iter()
        .zip(counts.iter().copied())
        .map(|(c, times_chosen)| ChoiceSummary {
            choice_id: c.id,
            choice: c.choice.clone(),
            correct: c.correct,
            times_chosen,
            relative_percentage: relative_percentage(times_chosen, max_times_chosen),
        })
        .collect();

    let total = counts.iter().sum::<i64>() as usize;

    (rows, total)
}

fn relative_percentage(times_chosen: i64, max_times_chosen: i64) -> i64 {
    if max_times_chosen == 0 {
        return 0;
    }
    times_chosen * 100 / max_times_chosen
}

/// A freeform answer joined with its author.
#[derive(Debug, Serialize, FromRow)]
pub struct FreeformAnswer {
    pub username: String,
    pub answer: Option<String>,
}

/// A choice selection joined with its author and choice text.
#[derive(Debug, Serialize, FromRow)]
pub struct SelectionEntry {
    pub username: String,
    pub quiz_choice_id: i64,
    pub choice: String,
}

/// Body of the admin results detail page.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultBreakdown {
    Freeform {
        answers: Vec<FreeformAnswer>,
    },
    Choices {
        summary: Vec<ChoiceSummary>,
        max_value: i64,
        selections: Vec<SelectionEntry>,
    },
}

#[derive(Debug, Serialize)]
pub struct QuizResultsResponse {
    pub quiz: Quiz,
    #[serde(rename = "type")]
    pub quiz_type: QuizType,
    pub code_snippet: String,
    pub submission_count: usize,
    #[serde(flatten)]
    pub breakdown: ResultBreakdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(id: i64, text: &str) -> QuizChoice {
        QuizChoice {
            id,
            quiz_id: 1,
            choice: text.to_string(),
            correct: id == 4,
        }
    }

    fn picks(choice_ids: &[i64]) -> Vec<QuizChoiceSelected> {
        choice_ids
            .iter()
            .enumerate()
            .map(|(i, &c)| QuizChoiceSelected {
                id: i as i64 + 1,
                user_id: i as i64 + 1,
                quiz_id: 1,
                quiz_choice_id: Some(c),
                answer: None,
            })
            .collect()
    }

    #[test]
    fn percentages_are_relative_to_the_most_chosen() {
        let choices = vec![choice(1, "A"), choice(2, "B"), choice(3, "C"), choice(4, "D")];
        let selections = picks(&[1, 1, 2, 3, 4, 3, 4, 3, 4, 4]);

        let (rows, total) = aggregate_results(&choices, &selections);

        let times: Vec<i64> = rows.iter().map(|r| r.times_chosen).collect();
        let pct: Vec<i64> = rows.iter().map(|r| r.relative_percentage).collect();
        assert_eq!(times, vec![2, 1, 3, 4]);
        assert_eq!(pct, vec![50, 25, 75, 100]);
        assert_eq!(total, 10);
    }

    #[test]
    fn no_selections_gives_zero_percentages() {
        let choices = vec![choice(1, "A"), choice(2, "B"), choice(3, "C")];

        let (rows, total) = aggregate_results(&choices, &[]);

        assert!(rows.iter().all(|r| r.times_chosen == 0 && r.relative_percentage == 0));
        assert_eq!(total, 0);
    }

    #[test]
    fn percentage_uses_integer_division() {
        let choices = vec![choice(1, "A"), choice(2, "B")];
        let selections = picks(&[1, 2, 2, 2]);

        let (rows, _) = aggregate_results(&choices, &selections);

        assert_eq!(rows[0].relative_percentage, 33);
        assert_eq!(rows[1].relative_percentage, 100);
    }

    #[test]
    fn selections_of_other_quizzes_are_ignored() {
        let choices = vec![choice(1, "A")];
        let mut selections = picks(&[1, 9]);
        selections.push(QuizChoiceSelected {
            id: 50,
            user_id: 3,
            quiz_id: 1,
            quiz_choice_id: None,
            answer: Some("free text".to_string()),
        });

        let (rows, total) = aggregate_results(&choices, &selections);

        assert_eq!(rows[0].times_chosen, 1);
        assert_eq!(total, 1);
    }

    #[test]
    fn rows_keep_choice_order() {
        let choices = vec![choice(3, "C"), choice(1, "A")];
        let (rows, _) = aggregate_results(&choices, &picks(&[1]));
        let order: Vec<&str> = rows.iter().map(|r| r.choice.as_str()).collect();
        assert_eq!(order, vec!["C", "A"]);
    }
}
