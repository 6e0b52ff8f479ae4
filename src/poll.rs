// src/poll.rs
use chrono::NaiveDateTime;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};

use crate::db::{rollback, DbError};
use crate::models::{Category, EditablePoll, Poll, PollOption};
use crate::schemas::{PollCreateRequest, PollUpdateRequest};

/// Polls with their category and options, loaded in a single statement.
const SELECT_POLLS: &str = r#"
    SELECT
        p.id, p.title, p.description, p.start_date, p.end_date,
        p.is_active, p.is_anonymous, p.category_id, p.created_at, p.updated_at,
        CASE WHEN c.id IS NULL THEN NULL
             ELSE json_build_object('id', c.id, 'name', c.name)
        END AS category,
        COALESCE(
            (SELECT json_agg(json_build_object(
                        'id', o.id,
                        'poll_id', o.poll_id,
                        'text', o.text,
                        'created_at', o.created_at,
                        'updated_at', o.updated_at
                    ) ORDER BY o.id)
             FROM poll_options o
             WHERE o.poll_id = p.id),
            '[]'::json
        ) AS options
    FROM polls p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

#[derive(sqlx::FromRow)]
struct PollRow {
    id: i64,
    title: String,
    description: Option<String>,
    start_date: NaiveDateTime,
    end_date: Option<NaiveDateTime>,
    is_active: bool,
    is_anonymous: bool,
    category_id: Option<i64>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    category: Option<Json<Category>>,
    options: Json<Vec<PollOption>>,
}

impl From<PollRow> for Poll {
    fn from(row: PollRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            start_date: row.start_date,
            end_date: row.end_date,
            is_active: row.is_active,
            is_anonymous: row.is_anonymous,
            category_id: row.category_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            category: row.category.map(|c| c.0),
            options: row.options.0,
        }
    }
}

pub async fn list_polls(pool: &PgPool) -> Result<Vec<Poll>, DbError> {
    let rows = sqlx::query_as::<_, PollRow>(&format!("{SELECT_POLLS} ORDER BY p.id"))
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Poll::from).collect())
}

pub async fn get_poll(pool: &PgPool, id: i64) -> Result<Poll, DbError> {
    sqlx::query_as::<_, PollRow>(&format!("{SELECT_POLLS} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(Poll::from)
        .ok_or(DbError::NotFound {
            resource: "Poll",
            id,
        })
}

/// Insert a poll and all of its options atomically, then reload it.
pub async fn create_poll(pool: &PgPool, data: &PollCreateRequest) -> Result<Poll, DbError> {
    let mut tx = pool.begin().await?;

    let id = match insert_poll(&mut tx, data).await {
        Ok(id) => id,
        Err(e) => {
            rollback(tx).await;
            return Err(e);
        }
    };
    tx.commit().await?;

    info!(poll_id = id, options = data.options.len(), "Poll created");
    get_poll(pool, id).await
}

async fn insert_poll(
    tx: &mut Transaction<'_, Postgres>,
    data: &PollCreateRequest,
) -> Result<i64, DbError> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO polls (title, description, start_date, end_date, is_active, category_id, is_anonymous)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(&data.title)
    .bind(&data.description)
    .bind(data.start_date)
    .bind(data.end_date)
    .bind(data.is_active)
    .bind(data.category_id)
    .bind(data.is_anonymous)
    .fetch_one(&mut **tx)
    .await?;

    for option in &data.options {
        sqlx::query("INSERT INTO poll_options (poll_id, text) VALUES ($1, $2)")
            .bind(id)
            .bind(&option.text)
            .execute(&mut **tx)
            .await?;
    }

    Ok(id)
}

/// Apply the fields present in `changes`, then reload the poll.
pub async fn update_poll(
    pool: &PgPool,
    id: i64,
    changes: &PollUpdateRequest,
) -> Result<Poll, DbError> {
    let mut tx = pool.begin().await?;

    if let Err(e) = write_changes(&mut tx, id, changes).await {
        rollback(tx).await;
        return Err(e);
    }
    tx.commit().await?;

    info!(poll_id = id, "Poll updated");
    get_poll(pool, id).await
}

async fn write_changes(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    changes: &PollUpdateRequest,
) -> Result<(), DbError> {
    let mut poll: EditablePoll = sqlx::query_as(
        r#"
        SELECT title, description, start_date, end_date, is_active, is_anonymous, category_id
        FROM polls
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(DbError::NotFound {
        resource: "Poll",
        id,
    })?;

    apply_changes(&mut poll, changes);

    // A one-sided date update can invert the stored dates. Flagged, not rejected.
    if poll.has_inverted_dates() {
        warn!(
            poll_id = id,
            start_date = %poll.start_date,
            end_date = ?poll.end_date,
            "Poll end_date is not after start_date after update"
        );
    }

    sqlx::query(
        r#"
        UPDATE polls
        SET title = $2,
            description = $3,
            start_date = $4,
            end_date = $5,
            is_active = $6,
            is_anonymous = $7,
            category_id = $8,
            updated_at = now() AT TIME ZONE 'utc'
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&poll.title)
    .bind(&poll.description)
    .bind(poll.start_date)
    .bind(poll.end_date)
    .bind(poll.is_active)
    .bind(poll.is_anonymous)
    .bind(poll.category_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Overwrite only the fields the update carries.
fn apply_changes(poll: &mut EditablePoll, changes: &PollUpdateRequest) {
    if let Some(title) = &changes.title {
        poll.title = title.clone();
    }
    if let Some(description) = &changes.description {
        poll.description = Some(description.clone());
    }
    if let Some(start_date) = changes.start_date {
        poll.start_date = start_date;
    }
    if let Some(end_date) = changes.end_date {
        poll.end_date = Some(end_date);
    }
    if let Some(is_active) = changes.is_active {
        poll.is_active = is_active;
    }
    if let Some(is_anonymous) = changes.is_anonymous {
        poll.is_anonymous = is_anonymous;
    }
    if let Some(category_id) = changes.category_id {
        poll.category_id = Some(category_id);
    }
}

/// Delete a poll; its options go with it through the cascading foreign key.
pub async fn delete_poll(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("DELETE FROM polls WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await;

    match result {
        Ok(done) if done.rows_affected() == 0 => {
            rollback(tx).await;
            Err(DbError::NotFound {
                resource: "Poll",
                id,
            })
        }
        Ok(_) => {
            tx.commit().await?;
            info!(poll_id = id, "Poll deleted");
            Ok(())
        }
        Err(e) => {
            rollback(tx).await;
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::parse_datetime;

    fn stored() -> EditablePoll {
        EditablePoll {
            title: "Lunch?".into(),
            description: Some("Friday".into()),
            start_date: parse_datetime("2025-01-01T00:00:00").unwrap(),
            end_date: Some(parse_datetime("2025-01-05T00:00:00").unwrap()),
            is_active: true,
            is_anonymous: true,
            category_id: Some(1),
        }
    }

    #[test]
    fn empty_update_changes_nothing() {
        let mut poll = stored();
        apply_changes(&mut poll, &PollUpdateRequest::default());
        assert_eq!(poll, stored());
    }

    #[test]
    fn update_touches_only_present_fields() {
        let mut poll = stored();
        apply_changes(
            &mut poll,
            &PollUpdateRequest {
                is_active: Some(false),
                title: Some("Dinner?".into()),
                ..Default::default()
            },
        );

        let expected = EditablePoll {
            is_active: false,
            title: "Dinner?".into(),
            ..stored()
        };
        assert_eq!(poll, expected);
    }

    #[test]
    fn one_sided_date_update_can_invert_stored_dates() {
        let mut poll = stored();
        apply_changes(
            &mut poll,
            &PollUpdateRequest {
                start_date: parse_datetime("2025-02-01T00:00:00"),
                ..Default::default()
            },
        );
        assert!(poll.has_inverted_dates());
    }
}
