//! Password hashing, credential checks and bearer tokens.
//!
//! Tokens are HS256 JWTs carrying the username as `sub` and the user id as
//! `uid`. They are never stored; a token is valid as long as its signature
//! checks out against the configured secret and `exp` has not passed.

use crate::database::UserDb;
use crate::error::{log_error, ApiError};
use crate::model::User;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const HASH_COST: u32 = 10;

/// One lifetime for every token, whether minted at login or registration.
pub const TOKEN_LIFETIME: Duration = Duration::days(7);

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, HASH_COST)
}

// Verified against when the username is unknown, so a miss costs as much
// as a wrong password.
fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("not a real password").ok())
        .as_deref()
}

/// Looks the user up by exact username and checks `password` against the
/// stored hash. Unknown users and wrong passwords fail the same way.
pub fn verify_credentials<D>(
    db: &D,
    username: &str,
    password: &str,
) -> Result<(u64, User), ApiError>
where
    D: UserDb,
    D::Error: Into<ApiError>,
{
    let found = db
        .get_user_by_username(username)
        .map_err(Into::<ApiError>::into)?;
    match found {
        Some((id, user)) => {
            if bcrypt::verify(password, &user.password_hash)
                .map_err(|err| log_error(err, "Verification error"))?
            {
                Ok((id, user))
            } else {
                Err(ApiError::InvalidCredentials)
            }
        }
        None => {
            if let Some(hash) = dummy_hash() {
                let _ = bcrypt::verify(password, hash);
            }
            Err(ApiError::InvalidCredentials)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub uid: u64,
    pub iat: i64,
    pub exp: i64,
}

/// The authenticated caller, as resolved from a validated token.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user_id: u64,
    pub username: String,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Identity {
            user_id: claims.uid,
            username: claims.sub,
        }
    }
}

/// Signing and verification keys derived from one shared secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenKeys {
    pub fn from_secret(secret: &[u8], lifetime: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        TokenKeys {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            lifetime,
        }
    }

    pub fn issue(
        &self,
        user_id: u64,
        username: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_at(user_id, username, Utc::now())
    }

    fn issue_at(
        &self,
        user_id: u64,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: username.to_owned(),
            uid: user_id,
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tests::{temporary_db, user};
    use jsonwebtoken::errors::ErrorKind;

    fn keys() -> TokenKeys {
        TokenKeys::from_secret(b"test secret", TOKEN_LIFETIME)
    }

    #[test]
    fn issued_token_resolves_to_user() {
        let keys = keys();
        let token = keys.issue(42, "alice1").unwrap();
        let claims = keys.validate(&token).unwrap();
        assert_eq!(claims.sub, "alice1");
        assert_eq!(claims.exp - claims.iat, TOKEN_LIFETIME.num_seconds());
        assert_eq!(
            Identity::from(claims),
            Identity {
                user_id: 42,
                username: "alice1".to_owned()
            }
        );
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = keys();
        let issued = Utc::now() - TOKEN_LIFETIME - Duration::seconds(5);
        let token = keys.issue_at(42, "alice1", issued).unwrap();
        let err = keys.validate(&token).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let token = TokenKeys::from_secret(b"another secret", TOKEN_LIFETIME)
            .issue(42, "alice1")
            .unwrap();
        let err = keys().validate(&token).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidSignature));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(keys().validate("invalid.token.here").is_err());
        assert!(keys().validate("").is_err());
    }

    #[test]
    fn credentials() {
        let db = temporary_db();
        let mut alice = user("alice1");
        alice.password_hash = hash_password("Secr3t!").unwrap();
        let id = db.add_user(&alice).unwrap();

        let (found, _) = verify_credentials(&db, "alice1", "Secr3t!").unwrap();
        assert_eq!(found, id);

        let wrong = verify_credentials(&db, "alice1", "wrong").unwrap_err();
        let unknown = verify_credentials(&db, "nobody", "Secr3t!").unwrap_err();
        assert!(matches!(wrong, ApiError::InvalidCredentials));
        assert!(matches!(unknown, ApiError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("Secr3t!").unwrap();
        let b = hash_password("Secr3t!").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$2b$10$"));
        assert!(bcrypt::verify("Secr3t!", &b).unwrap());
    }
}
