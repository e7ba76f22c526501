use sqlx::{Pool, Postgres};

use crate::{
    authentication::{cryptography::{hash_password, verify_password}, jwt::generate_jwt_session},
    error::{Error, QueryError},
    form::RegisterPayload,
    schema::{Id, User, UserRole},
};

pub async fn get_user(pool: &Pool<Postgres>, email: &str) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(row)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: Id) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(row)
}

/// Creates a user; the password is stored as an argon2 hash. Email and
/// username uniqueness comes from the table constraints.
pub async fn register_user(payload: &RegisterPayload, pool: &Pool<Postgres>) -> Result<User, Error> {
    payload.validate()?;

    let password = hash_password(&payload.password)?;

    let row: Option<User> = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password, role)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT DO NOTHING RETURNING *
    ",
    )
    .bind(&payload.email)
    .bind(&payload.username)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&password)
    .bind(UserRole::User)
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    match row {
        Some(user) => {
            log::info!("registered user {}", user.username);
            Ok(user)
        }
        None => Err(Error::AlreadyExists(String::from(
            "A user with this email or username already exists",
        ))),
    }
}

/// Verifies the credentials and issues a session token.
pub async fn login_user(
    email: &str,
    password: &str,
    secret: &[u8],
    pool: &Pool<Postgres>,
) -> Result<String, Error> {
    let user = match get_user(pool, email).await? {
        Some(user) => user,
        None => return Err(Error::Unauthorized(String::from("Invalid credentials"))),
    };

    if !verify_password(password, &user.password)? {
        return Err(Error::Unauthorized(String::from("Invalid credentials")));
    }

    generate_jwt_session(&user, secret)
}

/// Stores the avatar reference returned by the image store.
pub async fn set_avatar(user_id: Id, avatar: &str, pool: &Pool<Postgres>) -> Result<(), Error> {
    let result = sqlx::query("UPDATE users SET avatar = $1 WHERE id = $2")
        .bind(avatar)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("User"));
    }

    Ok(())
}

pub async fn remove_avatar(user_id: Id, pool: &Pool<Postgres>) -> Result<(), Error> {
    let result = sqlx::query("UPDATE users SET avatar = NULL WHERE id = $1 AND avatar IS NOT NULL")
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(String::from("No avatar is set")));
    }

    Ok(())
}
