use sqlx::{Pool, Postgres};

use crate::{
    constants::Limits,
    error::{Error, QueryError},
    pagination::PageContext,
    schema::{Id, RecipeListRow, RelationKind},
};

/// Adds a membership edge. The unique (user_id, recipe_id) constraint plus
/// `ON CONFLICT DO NOTHING` resolves concurrent adds: the loser sees zero
/// affected rows and gets the domain error instead of a duplicate.
pub async fn add_relation(
    kind: RelationKind,
    user_id: Id,
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let result = sqlx::query(&format!(
        "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        kind.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(Error::AlreadyExists(String::from(
            kind.already_exists_message(),
        )));
    }

    Ok(())
}

/// Removes a membership edge; removing one that is not there is a domain
/// error, not a no-op.
pub async fn remove_relation(
    kind: RelationKind,
    user_id: Id,
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
        kind.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(String::from(kind.not_found_message())));
    }

    Ok(())
}

pub async fn has_relation(
    kind: RelationKind,
    user_id: Id,
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let result: Option<(Id,)> = sqlx::query_as(&format!(
        "SELECT recipe_id FROM {} WHERE user_id = $1 AND recipe_id = $2",
        kind.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(result.is_some())
}

/// Paginated recipes of one relation set, newest first.
pub async fn fetch_relation_recipes(
    kind: RelationKind,
    user_id: Id,
    offset: i64,
    limits: &Limits,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeListRow>, Error> {
    let rows: Vec<RecipeListRow> = sqlx::query_as(&format!(
        "
        SELECT r.id, r.name, r.image, r.cooking_time, COUNT(*) OVER() AS count
        FROM {} m
        INNER JOIN recipes r ON r.id = m.recipe_id
        WHERE m.user_id = $1
        ORDER BY r.id DESC LIMIT $2 OFFSET $3
    ",
        kind.table()
    ))
    .bind(user_id)
    .bind(limits.page_size)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, limits.page_size, offset);

    Ok(page)
}
