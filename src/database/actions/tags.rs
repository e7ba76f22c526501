use sqlx::{Pool, Postgres};

use crate::{
    error::{Error, QueryError},
    schema::{Id, Tag},
};

pub async fn create_tag(name: &str, slug: &str, pool: &Pool<Postgres>) -> Result<Id, Error> {
    let row: Option<(Id,)> = sqlx::query_as(
        "INSERT INTO tags (name, slug) VALUES ($1, $2) ON CONFLICT DO NOTHING RETURNING id",
    )
    .bind(name)
    .bind(slug)
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    match row {
        Some((id,)) => Ok(id),
        None => Err(Error::AlreadyExists(String::from(
            "A tag with this name or slug already exists",
        ))),
    }
}

pub async fn get_tag(id: Id, pool: &Pool<Postgres>) -> Result<Option<Tag>, Error> {
    let row: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(row)
}

pub async fn find_tag(slug: &str, pool: &Pool<Postgres>) -> Result<Option<Id>, Error> {
    let row: Option<(Id,)> = sqlx::query_as("SELECT id FROM tags WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(row.map(|tag| tag.0))
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY name")
        .fetch_all(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(list)
}
