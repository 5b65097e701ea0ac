//! # User Repository
//!
//! Staff accounts. Password hashing happens in the server; this layer only
//! stores and returns the PHC string.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use kade_core::{User, UserRole};

const USER_COLUMNS: &str = "id, username, email, password_hash, role, first_name, last_name, \
                            is_active, created_at, updated_at";

/// Fields of a new account. `password_hash` must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: Option<&'a str>,
    pub password_hash: &'a str,
    pub role: UserRole,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Finds an active user by username. Inactive accounts are `None`.
    pub async fn find_active_by_username(&self, username: &str) -> DbResult<Option<User>> {
        debug!(username = %username, "Looking up user");

        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1 AND is_active = 1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Inserts a new active user.
    pub async fn create(&self, new_user: &NewUser<'_>) -> DbResult<User> {
        debug!(username = %new_user.username, role = %new_user.role, "Inserting user");

        let sql = format!(
            "INSERT INTO users (username, email, password_hash, role, first_name, last_name,
                                is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
             RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(new_user.username)
            .bind(new_user.email)
            .bind(new_user.password_hash)
            .bind(new_user.role)
            .bind(new_user.first_name)
            .bind(new_user.last_name)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;
    use crate::DbError;

    fn cashier() -> NewUser<'static> {
        NewUser {
            username: "nimal",
            email: Some("nimal@pos.com"),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA",
            role: UserRole::Cashier,
            first_name: Some("Nimal"),
            last_name: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let db = memory_db().await;
        let created = db.users().create(&cashier()).await.unwrap();
        assert!(created.is_active);
        assert_eq!(created.role, UserRole::Cashier);

        let found = db.users().find_active_by_username("nimal").await.unwrap().unwrap();
        assert_eq!(found, created);
        assert!(db.users().find_active_by_username("NIMAL").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_inactive_users_are_invisible() {
        let db = memory_db().await;
        let created = db.users().create(&cashier()).await.unwrap();

        sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?1")
            .bind(created.id)
            .execute(db.pool())
            .await
            .unwrap();
        assert!(db.users().find_active_by_username("nimal").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let db = memory_db().await;
        db.users().create(&cashier()).await.unwrap();
        let err = db
            .users()
            .create(&NewUser {
                email: None,
                ..cashier()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "users.username"));
    }
}
