//! User lookups for the gateway handshake

use chrono::Utc;
use intervo_common::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Authenticated user bound to a connection
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
}

/// Create a user with a precomputed handshake token digest
pub async fn create_user(pool: &SqlitePool, name: &str, token_digest: &str) -> Result<User> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, name, token_digest, created_at) VALUES (?, ?, ?, ?)")
        .bind(id.to_string())
        .bind(name)
        .bind(token_digest)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;
    Ok(User { id, name: name.to_string() })
}

/// Load a user by id; None if missing
pub async fn find_user(pool: &SqlitePool, user_id: Uuid) -> Result<Option<User>> {
    let row = sqlx::query("SELECT id, name FROM users WHERE id = ?")
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let id_str: String = row.get("id");
            let id = Uuid::parse_str(&id_str)
                .map_err(|e| intervo_common::Error::Internal(format!("Failed to parse user id: {}", e)))?;
            Ok(Some(User { id, name: row.get("name") }))
        }
        None => Ok(None),
    }
}
