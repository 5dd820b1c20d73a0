//! Cookie-based access tokens
//!
//! Tokens are `<user_uuid>.<hex sha256(user_uuid || shared_secret)>` carried
//! in the `access_token` cookie. The digest binds the token to the server's
//! shared secret so a forged user id fails verification.

use crate::db::users::{find_user, User};
use crate::error::{ApiError, ApiResult};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Compute the hex digest half of a token for `user_id`
pub fn token_digest(user_id: Uuid, shared_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.to_string().as_bytes());
    hasher.update(shared_secret.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Verify a raw token string, returning the embedded user id when valid
pub fn verify_token(token: &str, shared_secret: &str) -> Option<Uuid> {
    let (id_part, digest_part) = token.split_once('.')?;
    let user_id = Uuid::parse_str(id_part).ok()?;
    if token_digest(user_id, shared_secret) == digest_part {
        Some(user_id)
    } else {
        None
    }
}

/// Pull the `access_token` cookie out of a raw Cookie header value
fn extract_access_token(cookie_header: &str) -> Option<&str> {
    cookie_header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == "access_token" {
            Some(value)
        } else {
            None
        }
    })
}

/// Authenticate a request from its Cookie header
///
/// Fails with `Unauthorized` when the cookie is missing, malformed, or the
/// embedded user no longer exists.
pub async fn authenticate(
    pool: &SqlitePool,
    shared_secret: &str,
    cookie_header: Option<&str>,
) -> ApiResult<User> {
    let header = cookie_header.ok_or_else(|| ApiError::Unauthorized("Missing access token".to_string()))?;
    let token = extract_access_token(header)
        .ok_or_else(|| ApiError::Unauthorized("Missing access token".to_string()))?;
    let user_id = verify_token(token, shared_secret)
        .ok_or_else(|| ApiError::Unauthorized("Invalid access token".to_string()))?;

    find_user(pool, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_well_formed_token() {
        let user_id = Uuid::new_v4();
        let token = format!("{}.{}", user_id, token_digest(user_id, "secret"));
        assert_eq!(verify_token(&token, "secret"), Some(user_id));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let user_id = Uuid::new_v4();
        let token = format!("{}.{}", user_id, token_digest(user_id, "secret"));
        assert_eq!(verify_token(&token, "other"), None);
    }

    #[test]
    fn verify_rejects_tampered_user_id() {
        let user_id = Uuid::new_v4();
        let other_id = Uuid::new_v4();
        let token = format!("{}.{}", other_id, token_digest(user_id, "secret"));
        assert_eq!(verify_token(&token, "secret"), None);
    }

    #[test]
    fn verify_rejects_garbage() {
        assert_eq!(verify_token("not-a-token", "secret"), None);
        assert_eq!(verify_token("", "secret"), None);
        assert_eq!(verify_token("abc.def", "secret"), None);
    }

    #[test]
    fn cookie_extraction_handles_multiple_pairs() {
        let header = "theme=dark; access_token=abc.123; lang=en";
        assert_eq!(extract_access_token(header), Some("abc.123"));
        assert_eq!(extract_access_token("theme=dark"), None);
    }
}
