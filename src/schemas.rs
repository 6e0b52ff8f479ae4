// src/schemas.rs
// Requests are validated through Payload; responses are plain one-way
// mappings from stored entities and never re-check business rules.
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::{Category, Poll, PollOption};
use crate::validation::{Fields, Payload, ValidationErrors};

const TITLE_LEN: std::ops::RangeInclusive<usize> = 1..=255;
const OPTION_TEXT_LEN: std::ops::RangeInclusive<usize> = 1..=255;
const CATEGORY_NAME_LEN: std::ops::RangeInclusive<usize> = 0..=25;
const MIN_OPTIONS: usize = 2;

const END_BEFORE_START: &str = "Value error, end_date must be after start_date";

fn dates_out_of_order(start: NaiveDateTime, end: Option<NaiveDateTime>) -> bool {
    matches!(end, Some(end) if end <= start)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptionCreateRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollCreateRequest {
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
    pub is_active: bool,
    pub category_id: Option<i64>,
    pub is_anonymous: bool,
    pub options: Vec<PollOptionCreateRequest>,
}

impl Payload for PollCreateRequest {
    fn validate(object: &Map<String, Value>) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(object);

        let title = fields.string("title", TITLE_LEN);
        let description = fields.optional_string("description", None);
        let start_date = fields.datetime("start_date");
        let end_date = fields.optional_datetime("end_date");
        let is_active = fields.bool_or("is_active", true);
        let category_id = fields.optional_int("category_id");
        let is_anonymous = fields.bool_or("is_anonymous", true);
        let options = fields.list("options", MIN_OPTIONS, |item| {
            item.string("text", OPTION_TEXT_LEN)
                .map(|text| PollOptionCreateRequest { text })
        });

        if fields.is_valid()
            && start_date.is_some_and(|start| dates_out_of_order(start, end_date))
        {
            fields.reject(END_BEFORE_START, "value_error");
        }

        let request = match (title, start_date, options) {
            (Some(title), Some(start_date), Some(options)) => Some(Self {
                title,
                description,
                start_date,
                end_date,
                is_active,
                category_id,
                is_anonymous,
                options,
            }),
            _ => None,
        };
        fields.finish(request)
    }
}

/// Partial poll update. `None` means "leave the stored value alone".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub is_active: Option<bool>,
    pub category_id: Option<i64>,
    pub is_anonymous: Option<bool>,
}

impl Payload for PollUpdateRequest {
    fn validate(object: &Map<String, Value>) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(object);

        let update = Self {
            title: fields.optional_string("title", Some(TITLE_LEN)),
            description: fields.optional_string("description", None),
            start_date: fields.optional_datetime("start_date"),
            end_date: fields.optional_datetime("end_date"),
            is_active: fields.optional_bool("is_active"),
            category_id: fields.optional_int("category_id"),
            is_anonymous: fields.optional_bool("is_anonymous"),
        };

        // Only checked when both dates arrive in the same payload.
        if fields.is_valid()
            && update
                .start_date
                .is_some_and(|start| dates_out_of_order(start, update.end_date))
        {
            fields.reject(END_BEFORE_START, "value_error");
        }
        fields.finish(Some(update))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCreateUpdateDto {
    pub name: String,
}

impl Payload for CategoryCreateUpdateDto {
    fn validate(object: &Map<String, Value>) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(object);
        let name = fields.string("name", CATEGORY_NAME_LEN);
        fields.finish(name.map(|name| Self { name }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollOptionResponse {
    pub id: i64,
    pub poll_id: i64,
    pub text: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<PollOption> for PollOptionResponse {
    fn from(o: PollOption) -> Self {
        Self {
            id: o.id,
            poll_id: o.poll_id,
            text: o.text,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
    pub is_active: bool,
    pub is_anonymous: bool,
    pub category: Option<CategoryResponse>,
    pub options: Vec<PollOptionResponse>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<Poll> for PollResponse {
    fn from(p: Poll) -> Self {
        Self {
            id: p.id,
            title: p.title,
            description: p.description,
            start_date: p.start_date,
            end_date: p.end_date,
            is_active: p.is_active,
            is_anonymous: p.is_anonymous,
            category: p.category.map(CategoryResponse::from),
            options: p.options.into_iter().map(PollOptionResponse::from).collect(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validate<T: Payload>(value: Value) -> Result<T, ValidationErrors> {
        T::validate(value.as_object().unwrap())
    }

    fn kinds(errors: &ValidationErrors) -> Vec<&'static str> {
        errors.errors().iter().map(|e| e.kind).collect()
    }

    #[test]
    fn create_applies_defaults() {
        let req: PollCreateRequest = validate(json!({
            "title": "Lunch?",
            "start_date": "2025-01-01T00:00:00",
            "options": [{ "text": "Pizza" }, { "text": "Sushi" }]
        }))
        .unwrap();

        assert_eq!(req.title, "Lunch?");
        assert!(req.is_active);
        assert!(req.is_anonymous);
        assert_eq!(req.category_id, None);
        assert_eq!(req.end_date, None);
        assert_eq!(
            req.options,
            vec![
                PollOptionCreateRequest { text: "Pizza".into() },
                PollOptionCreateRequest { text: "Sushi".into() },
            ]
        );
    }

    #[test]
    fn create_needs_two_options() {
        let err = validate::<PollCreateRequest>(json!({
            "title": "X",
            "start_date": "2025-01-01T00:00:00",
            "options": [{ "text": "only one" }]
        }))
        .unwrap_err();
        assert_eq!(kinds(&err), ["too_short"]);
    }

    #[test]
    fn create_rejects_end_not_after_start() {
        for end in ["2025-01-01T00:00:00", "2024-12-31T23:59:59"] {
            let err = validate::<PollCreateRequest>(json!({
                "title": "X",
                "start_date": "2025-01-01T00:00:00",
                "end_date": end,
                "options": [{ "text": "a" }, { "text": "b" }]
            }))
            .unwrap_err();
            assert_eq!(kinds(&err), ["value_error"]);
        }
    }

    #[test]
    fn create_reports_every_bad_field() {
        let err = validate::<PollCreateRequest>(json!({
            "title": "",
            "is_active": "maybe",
            "options": "a, b"
        }))
        .unwrap_err();
        assert_eq!(
            kinds(&err),
            ["string_too_short", "missing", "bool_type", "list_type"]
        );
    }

    #[test]
    fn create_accepts_bare_dates_and_lax_scalars() {
        let req: PollCreateRequest = validate(json!({
            "title": "Lunch?",
            "start_date": "2025-01-01",
            "end_date": "2025-01-08 12:00",
            "is_active": "false",
            "category_id": "5",
            "options": [{ "text": "Pizza" }, { "text": "Sushi" }]
        }))
        .unwrap();

        assert_eq!(req.start_date.to_string(), "2025-01-01 00:00:00");
        assert_eq!(req.end_date.unwrap().to_string(), "2025-01-08 12:00:00");
        assert!(!req.is_active);
        assert_eq!(req.category_id, Some(5));
    }

    #[test]
    fn update_checks_dates_only_when_both_present() {
        let only_end: PollUpdateRequest =
            validate(json!({ "end_date": "2000-01-01T00:00:00" })).unwrap();
        assert!(only_end.end_date.is_some());
        assert!(only_end.start_date.is_none());

        let only_start: PollUpdateRequest =
            validate(json!({ "start_date": "2100-01-01T00:00:00" })).unwrap();
        assert!(only_start.start_date.is_some());

        let err = validate::<PollUpdateRequest>(json!({
            "start_date": "2025-02-01T00:00:00",
            "end_date": "2025-01-01T00:00:00"
        }))
        .unwrap_err();
        assert_eq!(kinds(&err), ["value_error"]);
    }

    #[test]
    fn update_treats_null_as_absent() {
        let req: PollUpdateRequest =
            validate(json!({ "is_active": false, "title": null, "description": null })).unwrap();
        assert_eq!(
            req,
            PollUpdateRequest {
                is_active: Some(false),
                ..Default::default()
            }
        );
    }

    #[test]
    fn category_name_is_capped() {
        let ok: CategoryCreateUpdateDto = validate(json!({ "name": "Food" })).unwrap();
        assert_eq!(ok.name, "Food");

        let err = validate::<CategoryCreateUpdateDto>(json!({ "name": "x".repeat(26) })).unwrap_err();
        assert_eq!(kinds(&err), ["string_too_long"]);
    }

    #[test]
    fn poll_response_shape() {
        let ts = crate::validation::parse_datetime("2025-01-01T00:00:00").unwrap();
        let poll = Poll {
            id: 3,
            title: "Lunch?".into(),
            description: None,
            start_date: ts,
            end_date: None,
            is_active: true,
            is_anonymous: true,
            category_id: None,
            created_at: ts,
            updated_at: ts,
            category: None,
            options: vec![PollOption {
                id: 9,
                poll_id: 3,
                text: "Pizza".into(),
                created_at: ts,
                updated_at: ts,
            }],
        };

        let json = serde_json::to_value(PollResponse::from(poll)).unwrap();
        assert_eq!(json["start_date"], "2025-01-01T00:00:00");
        assert_eq!(json["category"], Value::Null);
        assert_eq!(json["options"][0]["poll_id"], 3);
        assert_eq!(json["options"][0]["text"], "Pizza");
    }
}
