//! Database access for the auth handlers.
//!
//! Handlers talk to a [`SessionStore`] trait object so tests can substitute
//! an in-memory store; the Postgres implementation keeps all time arithmetic
//! in SQL so lockout windows and token rotation agree with the database
//! clock, not the service clock. Rust sees timestamps only as unix-epoch
//! seconds.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{Instrument, info_span};
use uuid::Uuid;

/// Credential row loaded for a login attempt.
#[derive(Debug, Clone)]
pub struct AuthRecord {
    pub id: Uuid,
    pub username: String,
    pub status: String,
    pub password_hash: String,
    pub failed_login_count: i32,
    pub locked_until_unix: Option<i64>,
}

/// Stored refresh-token state for a user.
#[derive(Debug)]
pub struct RefreshRecord {
    pub current_refresh_token: Option<String>,
}

/// Current hash plus retired hashes, for reuse checks on reset.
#[derive(Debug)]
pub struct PasswordRecord {
    pub password_hash: String,
    pub old_password_hashes: Vec<String>,
}

/// Minimal identity attached to an authenticated request.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub status: String,
}

#[derive(Debug)]
pub enum SignupOutcome {
    Created(Uuid),
    /// The email is already registered. Callers respond exactly as if the
    /// account had been created, so probing stays blind.
    Conflict,
}

/// Persistence operations behind the auth endpoints.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn lookup_auth_record(&self, email: &str) -> Result<Option<AuthRecord>>;

    /// Persists a failed attempt: the bumped counter and, once past the
    /// threshold, the lockout deadline computed by the caller.
    async fn record_login_failure(
        &self,
        user_id: Uuid,
        failed_count: i32,
        locked_until_unix: Option<i64>,
    ) -> Result<()>;

    /// A successful login clears the failure state and installs the new
    /// refresh token as the single current one, invalidating any prior
    /// session.
    async fn record_login_success(&self, user_id: Uuid, refresh_token: &str) -> Result<()>;

    async fn lookup_refresh_record(&self, user_id: Uuid) -> Result<Option<RefreshRecord>>;

    /// Compare-and-set rotation: the update lands only if the stored token
    /// still equals the one the client presented. Returns whether a row
    /// changed, so a concurrent rotation loses cleanly instead of
    /// double-spending.
    async fn rotate_refresh_token(
        &self,
        user_id: Uuid,
        presented: &str,
        replacement: &str,
    ) -> Result<bool>;

    async fn clear_refresh_token(&self, user_id: Uuid) -> Result<()>;

    async fn insert_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<SignupOutcome>;

    /// Activates a pending account. Idempotent for accounts that are already
    /// active; suspended accounts stay suspended.
    async fn activate_user(&self, user_id: Uuid) -> Result<bool>;

    async fn lookup_password_record(&self, user_id: Uuid) -> Result<Option<PasswordRecord>>;

    /// Installs a new password hash and pushes the previous one into history.
    /// Also drops any active refresh token so the old session cannot continue.
    async fn update_password(&self, user_id: Uuid, new_hash: &str) -> Result<()>;

    async fn lookup_principal(&self, user_id: Uuid) -> Result<Option<Principal>>;

    async fn lookup_principal_by_email(&self, email: &str) -> Result<Option<Principal>>;
}

/// Postgres-backed [`SessionStore`].
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn lookup_auth_record(&self, email: &str) -> Result<Option<AuthRecord>> {
        let query = "SELECT id, username, status::TEXT AS status, password_hash, \
                     failed_login_count, \
                     EXTRACT(EPOCH FROM locked_until)::BIGINT AS locked_until_unix \
                     FROM users WHERE email = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );

        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to load credentials")?;

        Ok(row.map(|row| AuthRecord {
            id: row.get("id"),
            username: row.get("username"),
            status: row.get("status"),
            password_hash: row.get("password_hash"),
            failed_login_count: row.get("failed_login_count"),
            locked_until_unix: row.get("locked_until_unix"),
        }))
    }

    async fn record_login_failure(
        &self,
        user_id: Uuid,
        failed_count: i32,
        locked_until_unix: Option<i64>,
    ) -> Result<()> {
        let query = "UPDATE users SET failed_login_count = $2, \
                     locked_until = TO_TIMESTAMP($3::BIGINT), updated_at = NOW() \
                     WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );

        sqlx::query(query)
            .bind(user_id)
            .bind(failed_count)
            .bind(locked_until_unix)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to record login failure")?;

        Ok(())
    }

    async fn record_login_success(&self, user_id: Uuid, refresh_token: &str) -> Result<()> {
        let query = "UPDATE users SET failed_login_count = 0, locked_until = NULL, \
                     current_refresh_token = $2, last_login_at = NOW(), updated_at = NOW() \
                     WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );

        sqlx::query(query)
            .bind(user_id)
            .bind(refresh_token)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to record login success")?;

        Ok(())
    }

    async fn lookup_refresh_record(&self, user_id: Uuid) -> Result<Option<RefreshRecord>> {
        let query = "SELECT current_refresh_token FROM users WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );

        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to load refresh token state")?;

        Ok(row.map(|row| RefreshRecord {
            current_refresh_token: row.get("current_refresh_token"),
        }))
    }

    async fn rotate_refresh_token(
        &self,
        user_id: Uuid,
        presented: &str,
        replacement: &str,
    ) -> Result<bool> {
        let query = "UPDATE users SET current_refresh_token = $3, updated_at = NOW() \
                     WHERE id = $1 AND current_refresh_token = $2";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );

        let result = sqlx::query(query)
            .bind(user_id)
            .bind(presented)
            .bind(replacement)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to rotate refresh token")?;

        Ok(result.rows_affected() == 1)
    }

    async fn clear_refresh_token(&self, user_id: Uuid) -> Result<()> {
        let query = "UPDATE users SET current_refresh_token = NULL, updated_at = NOW() \
                     WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );

        sqlx::query(query)
            .bind(user_id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to clear refresh token")?;

        Ok(())
    }

    async fn insert_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<SignupOutcome> {
        let query = "INSERT INTO users (username, email, password_hash, status) \
                     VALUES ($1, $2, $3, 'pending') RETURNING id";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );

        match sqlx::query(query)
            .bind(username)
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .instrument(span)
            .await
        {
            Ok(row) => Ok(SignupOutcome::Created(row.get("id"))),
            Err(err) if super::utils::is_unique_violation(&err) => Ok(SignupOutcome::Conflict),
            Err(err) => Err(err).context("failed to insert user"),
        }
    }

    async fn activate_user(&self, user_id: Uuid) -> Result<bool> {
        let query = "UPDATE users SET status = 'active', updated_at = NOW() \
                     WHERE id = $1 AND status <> 'suspended'";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );

        let result = sqlx::query(query)
            .bind(user_id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to activate user")?;

        Ok(result.rows_affected() == 1)
    }

    async fn lookup_password_record(&self, user_id: Uuid) -> Result<Option<PasswordRecord>> {
        let query = "SELECT password_hash, old_password_hashes FROM users WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );

        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to load password history")?;

        Ok(row.map(|row| PasswordRecord {
            password_hash: row.get("password_hash"),
            old_password_hashes: row.get("old_password_hashes"),
        }))
    }

    async fn update_password(&self, user_id: Uuid, new_hash: &str) -> Result<()> {
        let query = "UPDATE users SET \
                     old_password_hashes = array_append(old_password_hashes, password_hash), \
                     password_hash = $2, current_refresh_token = NULL, \
                     failed_login_count = 0, locked_until = NULL, updated_at = NOW() \
                     WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );

        sqlx::query(query)
            .bind(user_id)
            .bind(new_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to update password")?;

        Ok(())
    }

    async fn lookup_principal(&self, user_id: Uuid) -> Result<Option<Principal>> {
        let query = "SELECT id, username, email, status::TEXT AS status \
                     FROM users WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );

        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to load principal")?;

        Ok(row.map(principal_from_row))
    }

    async fn lookup_principal_by_email(&self, email: &str) -> Result<Option<Principal>> {
        let query = "SELECT id, username, email, status::TEXT AS status \
                     FROM users WHERE email = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );

        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to look up user by email")?;

        Ok(row.map(principal_from_row))
    }
}

fn principal_from_row(row: sqlx::postgres::PgRow) -> Principal {
    Principal {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        status: row.get("status"),
    }
}
