use std::fmt;
use std::time::Duration;

use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tokio::time::timeout;
use uuid::Uuid;

/// Which unique column a duplicate write collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictField {
    Email,
    Name,
}

impl fmt::Display for ConflictField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictField::Email => f.write_str("email"),
            ConflictField::Name => f.write_str("name"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate {0}")]
    Conflict(ConflictField),
    /// The operation did not complete within the configured bound;
    /// safe to retry, nothing was partially written.
    #[error("credential store operation timed out")]
    Timeout,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// User record in the database. Emails are stored lowercased; the
/// unique indexes on email and name are the final arbiter under
/// concurrent registration.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

async fn bounded<T>(
    limit: Duration,
    op: impl std::future::Future<Output = Result<T, sqlx::Error>>,
) -> Result<T, StoreError> {
    match timeout(limit, op).await {
        Ok(res) => res.map_err(StoreError::from),
        Err(_) => Err(StoreError::Timeout),
    }
}

/// Maps a Postgres unique-violation to the column it hit, by
/// constraint name (users_email_key / users_name_key).
fn conflict_field(constraint: &str) -> Option<ConflictField> {
    if constraint.contains("email") {
        Some(ConflictField::Email)
    } else if constraint.contains("name") {
        Some(ConflictField::Name)
    } else {
        None
    }
}

const UNIQUE_VIOLATION: &str = "23505";

impl User {
    /// Find a user by (already normalized) email.
    pub async fn find_by_email(
        db: &PgPool,
        limit: Duration,
        email: &str,
    ) -> Result<Option<User>, StoreError> {
        bounded(
            limit,
            sqlx::query_as::<_, User>(
                r#"
                SELECT id, email, name, password_hash, created_at, updated_at
                FROM users
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(db),
        )
        .await
    }

    /// Registration pre-check: any user holding either the email or
    /// the display name.
    pub async fn find_by_email_or_name(
        db: &PgPool,
        limit: Duration,
        email: &str,
        name: &str,
    ) -> Result<Option<User>, StoreError> {
        bounded(
            limit,
            sqlx::query_as::<_, User>(
                r#"
                SELECT id, email, name, password_hash, created_at, updated_at
                FROM users
                WHERE email = $1 OR name = $2
                "#,
            )
            .bind(email)
            .bind(name)
            .fetch_optional(db),
        )
        .await
    }

    pub async fn find_by_id(
        db: &PgPool,
        limit: Duration,
        id: Uuid,
    ) -> Result<Option<User>, StoreError> {
        bounded(
            limit,
            sqlx::query_as::<_, User>(
                r#"
                SELECT id, email, name, password_hash, created_at, updated_at
                FROM users
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(db),
        )
        .await
    }

    /// Insert a new user. A racing duplicate surfaces as
    /// `StoreError::Conflict` carrying the offending field, translated
    /// from the unique-violation's constraint name rather than from
    /// error-message text.
    pub async fn create(
        db: &PgPool,
        limit: Duration,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let res = bounded(
            limit,
            sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (email, name, password_hash)
                VALUES ($1, $2, $3)
                RETURNING id, email, name, password_hash, created_at, updated_at
                "#,
            )
            .bind(email)
            .bind(name)
            .bind(password_hash)
            .fetch_one(db),
        )
        .await;

        match res {
            Err(StoreError::Database(sqlx::Error::Database(db_err)))
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                let field = db_err
                    .constraint()
                    .and_then(conflict_field)
                    .unwrap_or(ConflictField::Email);
                Err(StoreError::Conflict(field))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_names_map_to_fields() {
        assert_eq!(conflict_field("users_email_key"), Some(ConflictField::Email));
        assert_eq!(conflict_field("users_name_key"), Some(ConflictField::Name));
        assert_eq!(conflict_field("users_pkey"), None);
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@b.com".into(),
            name: "a".into(),
            password_hash: "$2b$12$secret".into(),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("secret"));
    }

    #[tokio::test]
    async fn bounded_times_out() {
        let res: Result<(), StoreError> = bounded(Duration::from_millis(5), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(res, Err(StoreError::Timeout)));
    }
}
