use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    constants::{SHORT_CODE_ALPHABET, SHORT_CODE_LENGTH},
    error::{Error, QueryError},
    schema::{Id, ShortLink},
};

const CODE_ATTEMPTS: usize = 3;

/// Returns the recipe's short link, generating the code on first use. The
/// code is created once and reused for every later call.
pub async fn get_or_create_short_link(
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<ShortLink, Error> {
    if let Some(link) = get_short_link(recipe_id, pool).await? {
        return Ok(link);
    }

    for _ in 0..CODE_ATTEMPTS {
        let code = generate_short_code();
        let result = sqlx::query(
            "
            INSERT INTO short_links (recipe_id, short_code)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
        ",
        )
        .bind(recipe_id)
        .bind(&code)
        .execute(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

        if result.rows_affected() > 0 {
            return Ok(ShortLink {
                recipe_id,
                short_code: code,
            });
        }

        // Either another call won the one-per-recipe race, or the code
        // itself collided; re-read before retrying with a fresh code.
        if let Some(link) = get_short_link(recipe_id, pool).await? {
            return Ok(link);
        }
        log::warn!("short code collision for recipe {recipe_id}, retrying");
    }

    Err(Error::Storage(String::from(
        "Failed to allocate a short code",
    )))
}

pub async fn get_short_link(
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Option<ShortLink>, Error> {
    let row: Option<ShortLink> = sqlx::query_as("SELECT * FROM short_links WHERE recipe_id = $1")
        .bind(recipe_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(row)
}

/// Recipe id behind a short code, for the redirect handler.
pub async fn resolve_short_link(code: &str, pool: &Pool<Postgres>) -> Result<Option<Id>, Error> {
    let row: Option<(Id,)> = sqlx::query_as("SELECT recipe_id FROM short_links WHERE short_code = $1")
        .bind(code)
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(row.map(|r| r.0))
}

pub fn format_short_url(domain: &str, code: &str) -> String {
    format!("{}/s/{}", domain.trim_end_matches('/'), code)
}

/// Encodes a fresh UUID v4 over the lookalike-free alphabet, shortuuid
/// style.
pub fn generate_short_code() -> String {
    let base = SHORT_CODE_ALPHABET.len() as u128;
    let mut value = Uuid::new_v4().as_u128();

    let mut code = String::with_capacity(SHORT_CODE_LENGTH);
    for _ in 0..SHORT_CODE_LENGTH {
        let digit = (value % base) as usize;
        code.push(SHORT_CODE_ALPHABET[digit] as char);
        value /= base;
    }

    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_use_the_alphabet_at_fixed_length() {
        for _ in 0..100 {
            let code = generate_short_code();
            assert_eq!(code.len(), SHORT_CODE_LENGTH);
            assert!(code.bytes().all(|b| SHORT_CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn codes_are_distinct() {
        assert_ne!(generate_short_code(), generate_short_code());
    }

    #[test]
    fn short_url_joins_domain_and_code() {
        assert_eq!(
            format_short_url("https://foodgram.example/", "abcDEF"),
            "https://foodgram.example/s/abcDEF"
        );
        assert_eq!(
            format_short_url("https://foodgram.example", "abcDEF"),
            "https://foodgram.example/s/abcDEF"
        );
    }
}
