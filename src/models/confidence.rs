// src/models/confidence.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

pub const CONFUSED: i16 = -1;
pub const NEUTRAL: i16 = 0;
pub const CONFIDENT: i16 = 1;

/// Represents the 'confidence_meters' table: one live vote per student.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ConfidenceMeter {
    pub user_id: i64,
    /// -1 confused, 0 neutral, 1 confident.
    pub confidence: i16,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for a student's vote.
#[derive(Debug, Deserialize, Validate)]
pub struct VoteRequest {
    #[validate(range(min = CONFUSED, max = CONFIDENT))]
    pub confidence: i16,
}

/// Tally of the current votes.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ConfidenceSummary {
    pub confused: usize,
    pub neutral: usize,
    pub confident: usize,
    pub total: usize,
}

/// A student's note to the lecturer, from their profile.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ConfidenceMessage {
    pub username: String,
    pub confidence_message: String,
}

/// Lecturer view of the meter.
#[derive(Debug, Serialize)]
pub struct ConfidencePoll {
    #[serde(flatten)]
    pub summary: ConfidenceSummary,
    pub messages: Vec<ConfidenceMessage>,
}

/// Counts votes by sign.
pub fn summarize_confidence(votes: &[i16]) -> ConfidenceSummary {
    let mut summary = ConfidenceSummary::default();
    for vote in votes {
        match vote.signum() {
            -1 => summary.confused += 1,
            0 => summary.neutral += 1,
            _ => summary.confident += 1,
        }
    }
    summary.total = votes.len();
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn votes_are_tallied_by_kind() {
        let summary = summarize_confidence(&[CONFUSED, CONFIDENT, NEUTRAL, CONFUSED, CONFIDENT, CONFIDENT]);
        assert_eq!(
            summary,
            ConfidenceSummary {
                confused: 2,
                neutral: 1,
                confident: 3,
                total: 6,
            }
        );
    }

    #[test]
    fn empty_meter_is_all_zero() {
        assert_eq!(summarize_confidence(&[]), ConfidenceSummary::default());
    }

    #[test]
    fn vote_must_be_in_range() {
        assert!(VoteRequest { confidence: 2 }.validate().is_err());
        assert!(VoteRequest { confidence: -2 }.validate().is_err());
        assert!(VoteRequest { confidence: CONFUSED }.validate().is_ok());
    }

    #[test]
    fn poll_serializes_flat() {
        let poll = ConfidencePoll {
            summary: summarize_confidence(&[CONFIDENT]),
            messages: vec![ConfidenceMessage {
                username: "z5012345".to_string(),
                confidence_message: "slow down please".to_string(),
            }],
        };
        let json = serde_json::to_value(&poll).unwrap();
        assert_eq!(json["confident"], 1);
        assert_eq!(json["total"], 1);
        assert_eq!(json["messages"][0]["confidence_message"], "slow down please");
    }
}
