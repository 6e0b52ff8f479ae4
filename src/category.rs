// src/category.rs
use sqlx::PgPool;
use tracing::info;

use crate::db::DbError;
use crate::models::Category;

pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>, DbError> {
    let categories = sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(categories)
}

pub async fn create_category(pool: &PgPool, name: &str) -> Result<Category, DbError> {
    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name) VALUES ($1) RETURNING id, name",
    )
    .bind(name)
    .fetch_one(pool)
    .await?;

    info!(category_id = category.id, "Category created");
    Ok(category)
}

pub async fn update_category(pool: &PgPool, id: i64, name: &str) -> Result<Category, DbError> {
    sqlx::query_as::<_, Category>(
        "UPDATE categories SET name = $2 WHERE id = $1 RETURNING id, name",
    )
    .bind(id)
    .bind(name)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound {
        resource: "Category",
        id,
    })
}
