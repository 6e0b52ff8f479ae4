// src/models.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PollOption {
    pub id: i64,
    pub poll_id: i64,
    pub text: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A poll together with its eagerly loaded relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poll {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
    pub is_active: bool,
    pub is_anonymous: bool,
    pub category_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub category: Option<Category>,
    pub options: Vec<PollOption>,
}

/// The columns of a poll that an update may touch.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct EditablePoll {
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
    pub is_active: bool,
    pub is_anonymous: bool,
    pub category_id: Option<i64>,
}

impl EditablePoll {
    /// True when the stored dates violate the end-after-start ordering.
    pub fn has_inverted_dates(&self) -> bool {
        matches!(self.end_date, Some(end) if end <= self.start_date)
    }
}

// Reserved for vote casting. Tables exist, nothing reads or writes them yet.

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vote {
    pub id: i64,
    pub poll_id: i64,
    pub option_id: i64,
    pub voter: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PollStatistics {
    pub id: i64,
    pub poll_id: i64,
    pub total_votes: i64,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OptionStatistics {
    pub id: i64,
    pub option_id: i64,
    pub votes_count: i64,
    pub percentage: f64,
    pub updated_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn editable(start: NaiveDateTime, end: Option<NaiveDateTime>) -> EditablePoll {
        EditablePoll {
            title: "Lunch?".into(),
            description: None,
            start_date: start,
            end_date: end,
            is_active: true,
            is_anonymous: true,
            category_id: None,
        }
    }

    #[test]
    fn inverted_dates() {
        assert!(!editable(at(1), None).has_inverted_dates());
        assert!(!editable(at(1), Some(at(2))).has_inverted_dates());
        assert!(editable(at(2), Some(at(2))).has_inverted_dates());
        assert!(editable(at(3), Some(at(2))).has_inverted_dates());
    }

    #[test]
    fn option_deserializes_from_postgres_json() {
        let option: PollOption = serde_json::from_str(
            r#"{"id":1,"poll_id":7,"text":"Pizza","created_at":"2025-01-01T10:20:30.123456","updated_at":"2025-01-01T10:20:30"}"#,
        )
        .unwrap();
        assert_eq!(option.poll_id, 7);
        assert_eq!(option.text, "Pizza");
    }
}
