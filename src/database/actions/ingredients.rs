use sqlx::{Pool, Postgres};

use crate::{
    error::{Error, QueryError},
    schema::{Id, Ingredient},
};

pub async fn create_ingredient(
    name: &str,
    measurement_unit: &str,
    pool: &Pool<Postgres>,
) -> Result<Id, Error> {
    let row: Option<(Id,)> = sqlx::query_as(
        "
        INSERT INTO ingredients (name, measurement_unit)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING RETURNING id
    ",
    )
    .bind(name)
    .bind(measurement_unit)
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    match row {
        Some((id,)) => Ok(id),
        None => Err(Error::AlreadyExists(String::from(
            "This ingredient and unit already exist",
        ))),
    }
}

pub async fn get_ingredient(id: Id, pool: &Pool<Postgres>) -> Result<Option<Ingredient>, Error> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(row)
}

/// Catalog listing with an optional name-prefix search, unpaginated like the
/// catalog endpoint it backs.
pub async fn list_ingredients(
    search: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, Error> {
    let list: Vec<Ingredient> = match search {
        Some(search) => {
            sqlx::query_as("SELECT * FROM ingredients WHERE name ILIKE $1 ORDER BY name")
                .bind(format!("{search}%"))
                .fetch_all(pool)
                .await
                .map_err(|e| Error::from(QueryError::from(e)))?
        }
        None => sqlx::query_as("SELECT * FROM ingredients ORDER BY name")
            .fetch_all(pool)
            .await
            .map_err(|e| Error::from(QueryError::from(e)))?,
    };

    Ok(list)
}
