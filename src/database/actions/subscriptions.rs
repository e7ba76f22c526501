use sqlx::{Pool, Postgres};

use crate::{
    constants::Limits,
    error::{Error, QueryError},
    pagination::PageContext,
    schema::{AuthorRow, Id},
};

use super::users::get_user_by_id;

/// Follows an author. The self-reference check runs before any lookup, so
/// subscribing to oneself fails the same way whether or not a subscription
/// exists.
pub async fn subscribe(user_id: Id, author_id: Id, pool: &Pool<Postgres>) -> Result<(), Error> {
    if user_id == author_id {
        return Err(Error::SelfReference(String::from(
            "You cannot subscribe to yourself",
        )));
    }

    if get_user_by_id(pool, author_id).await?.is_none() {
        return Err(Error::not_found("User"));
    }

    let result = sqlx::query(
        "INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(author_id)
    .execute(pool)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(Error::AlreadyExists(String::from(
            "You are already subscribed to this user",
        )));
    }

    Ok(())
}

pub async fn unsubscribe(user_id: Id, author_id: Id, pool: &Pool<Postgres>) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
        .bind(user_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(String::from(
            "You are not subscribed to this user",
        )));
    }

    Ok(())
}

pub async fn is_subscribed(
    user_id: Id,
    author_id: Id,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let row: Option<(Id,)> =
        sqlx::query_as("SELECT author_id FROM subscriptions WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(row.is_some())
}

/// Followed authors with their published-recipe counts, paginated.
pub async fn fetch_subscriptions(
    user_id: Id,
    offset: i64,
    limits: &Limits,
    pool: &Pool<Postgres>,
) -> Result<PageContext<AuthorRow>, Error> {
    let rows: Vec<AuthorRow> = sqlx::query_as(
        "
        SELECT u.id, u.email, u.username, u.first_name, u.last_name, u.avatar,
            (SELECT COUNT(*) FROM recipes r WHERE r.author_id = u.id) AS recipes_count,
            COUNT(*) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.user_id = $1
        ORDER BY u.id LIMIT $2 OFFSET $3
    ",
    )
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
