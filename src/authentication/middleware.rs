use std::convert::Infallible;

use warp::{
    reject::{self, Rejection},
    Filter,
};

use super::jwt::{verify_jwt_session, JwtSessionData};

#[derive(Debug)]
struct Unauthorized;

impl reject::Reject for Unauthorized {}

/// Requires a valid session cookie without extracting it.
pub fn with_auth(secret: Vec<u8>) -> impl Filter<Extract = ((),), Error = Rejection> + Clone {
    warp::cookie::<String>("session").and_then(move |session: String| {
        let secret = secret.clone();
        async move {
            if verify_jwt_session(&session, &secret).is_ok() {
                Ok(())
            } else {
                Err(warp::reject::custom(Unauthorized))
            }
        }
    })
}

pub fn with_session(
    secret: Vec<u8>,
) -> impl Filter<Extract = (JwtSessionData,), Error = Rejection> + Clone {
    warp::cookie::<String>("session").and_then(move |session: String| {
        let secret = secret.clone();
        async move {
            if let Ok(data) = verify_jwt_session(&session, &secret) {
                Ok(data)
            } else {
                Err(warp::reject::custom(Unauthorized))
            }
        }
    })
}

/// Anonymous access is allowed; the handler decides what the viewer sees.
pub fn with_possible_session(
    secret: Vec<u8>,
) -> impl Filter<Extract = (Option<JwtSessionData>,), Error = Infallible> + Clone {
    warp::filters::cookie::optional::<String>("session").map(move |session: Option<String>| {
        session.and_then(|session| verify_jwt_session(&session, &secret).ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::{User, UserRole};
    use crate::jwt::generate_jwt_session;

    const SECRET: &[u8] = b"test-secret";

    fn token() -> String {
        let user = User {
            id: 5,
            email: String::from("cook@example.com"),
            username: String::from("cook"),
            first_name: String::from("A"),
            last_name: String::from("B"),
            password: String::new(),
            avatar: None,
            role: UserRole::User,
        };
        generate_jwt_session(&user, SECRET).unwrap()
    }

    #[tokio::test]
    async fn session_cookie_is_extracted() {
        let filter = with_session(SECRET.to_vec());
        let session = warp::test::request()
            .header("cookie", format!("session={}", token()))
            .filter(&filter)
            .await
            .unwrap();
        assert_eq!(session.user_id, 5);
        assert_eq!(session.username, "cook");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let filter = with_auth(SECRET.to_vec());
        let result = warp::test::request()
            .header("cookie", "session=not-a-token")
            .filter(&filter)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn missing_cookie_falls_back_to_anonymous() {
        let filter = with_possible_session(SECRET.to_vec());
        let session = warp::test::request().filter(&filter).await.unwrap();
        assert!(session.is_none());
    }

    #[tokio::test]
    async fn possible_session_extracts_a_valid_cookie() {
        let filter = with_possible_session(SECRET.to_vec());
        let session = warp::test::request()
            .header("cookie", format!("session={}", token()))
            .filter(&filter)
            .await
            .unwrap();
        assert_eq!(session.map(|s| s.user_id), Some(5));
    }
}
