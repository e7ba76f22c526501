use chrono::Duration;
use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::database::schema::{User, UserRole};
use crate::error::Error;

use super::permissions::ActionType;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: i32,
    pub username: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: i32, username: String, role: UserRole) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(1)).timestamp();

        Self {
            user_id: id,
            username,
            role,
            iat,
            exp,
        }
    }

    #[cfg(test)]
    fn expired(id: i32, username: String, role: UserRole) -> Self {
        let now = Local::now().timestamp();
        Self {
            user_id: id,
            username,
            role,
            iat: now - 7200,
            exp: now - 3600,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    pub user_id: i32,
    pub username: String,
    pub role: UserRole,
    pub is_admin: bool,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), Error> {
        if !action.authenticate(self) {
            return Err(Error::Unauthorized(String::from(
                "You don't have permission to perform this action",
            )));
        }
        Ok(())
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            user_id: value.user_id,
            username: value.username,
            is_admin: value.role == UserRole::Admin,
            role: value.role,
        }
    }
}

fn signing_key(secret: &[u8]) -> Result<Hmac<Sha256>, Error> {
    Hmac::new_from_slice(secret).map_err(|e| Error::Storage(format!("{e}")))
}

pub fn generate_jwt_session(user: &User, secret: &[u8]) -> Result<String, Error> {
    let key = signing_key(secret)?;
    let claims = JwtSessionData::new(user.id, user.username.to_owned(), user.role.to_owned());

    claims
        .sign_with_key(&key)
        .map_err(|e| Error::Storage(format!("{e}")))
}

pub fn verify_jwt_session(token: &str, secret: &[u8]) -> Result<JwtSessionData, Error> {
    let key = signing_key(secret)?;

    token
        .verify_with_key(&key)
        .map_err(|_| Error::InvalidSession(String::from("Invalid token")))
        .map(|session: JwtSessionData| {
            let now = Local::now().timestamp();

            if (session.exp - now).is_negative() {
                return Err(Error::InvalidSession(String::from("Token expired")));
            }
            Ok(session)
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    fn sign(claims: &JwtSessionData) -> String {
        claims.sign_with_key(&signing_key(SECRET).unwrap()).unwrap()
    }

    #[test]
    fn sign_then_verify_roundtrip() {
        let claims = JwtSessionData::new(7, String::from("cook"), UserRole::User);
        let token = sign(&claims);
        let verified = verify_jwt_session(&token, SECRET).unwrap();
        assert_eq!(verified.user_id, 7);
        assert_eq!(verified.username, "cook");
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = JwtSessionData::expired(7, String::from("cook"), UserRole::User);
        let token = sign(&claims);
        assert!(matches!(
            verify_jwt_session(&token, SECRET),
            Err(Error::InvalidSession(_))
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = JwtSessionData::new(7, String::from("cook"), UserRole::User);
        let token = sign(&claims);
        assert!(verify_jwt_session(&token, b"other-secret").is_err());
    }
}
