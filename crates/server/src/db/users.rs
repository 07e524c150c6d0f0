//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use shopdesk_core::{Email, UserId, UserRole};

use super::{RepositoryError, map_constraint, parse_column};
use crate::models::{NewUser, User, UserChanges};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    user_id: i32,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    address: Option<String>,
    username: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.user_id),
            first_name: row.first_name,
            last_name: row.last_name,
            email,
            phone: row.phone,
            address: row.address,
            username: row.username,
            role: parse_column::<UserRole>(&row.role, "role")?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

fn unique_conflict(err: sqlx::Error) -> RepositoryError {
    map_constraint(err, "email or username already exists")
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a user with an already hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or username is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    #[tracing::instrument(skip(self, user, password_hash), fields(username = %user.username))]
    pub async fn create(&self, user: &NewUser, password_hash: &str) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users
                (first_name, last_name, email, phone, address, username, password_hash, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING user_id, first_name, last_name, email, phone, address, username, role,
                      created_at, updated_at
            ",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.email.as_str())
        .bind(user.phone.as_deref())
        .bind(user.address.as_deref())
        .bind(&user.username)
        .bind(password_hash)
        .bind(user.role.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(unique_conflict)?;

        row.try_into()
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT user_id, first_name, last_name, email, phone, address, username, role,
                   created_at, updated_at
            FROM users
            WHERE user_id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user and their password hash by username, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_hash_by_username(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(
            r"
            SELECT user_id, first_name, last_name, email, phone, address, username, role,
                   created_at, updated_at, password_hash
            FROM users
            WHERE username = $1
            ",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((User::try_from(r.user)?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// All users, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r"
            SELECT user_id, first_name, last_name, email, phone, address, username, role,
                   created_at, updated_at
            FROM users
            ORDER BY user_id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    /// Apply `changes` (and optionally a new password hash) to a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Conflict` if the new email or username is taken.
    #[tracing::instrument(skip(self, changes, password_hash), fields(user_id = %id))]
    pub async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
        password_hash: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE users
            SET first_name    = COALESCE($2, first_name),
                last_name     = COALESCE($3, last_name),
                email         = COALESCE($4, email),
                phone         = COALESCE($5, phone),
                address       = COALESCE($6, address),
                username      = COALESCE($7, username),
                role          = COALESCE($8, role),
                password_hash = COALESCE($9, password_hash),
                updated_at    = NOW()
            WHERE user_id = $1
            RETURNING user_id, first_name, last_name, email, phone, address, username, role,
                      created_at, updated_at
            ",
        )
        .bind(id)
        .bind(changes.first_name.as_deref())
        .bind(changes.last_name.as_deref())
        .bind(changes.email.as_ref().map(Email::as_str))
        .bind(changes.phone.as_deref())
        .bind(changes.address.as_deref())
        .bind(changes.username.as_deref())
        .bind(changes.role.map(UserRole::as_str))
        .bind(password_hash)
        .fetch_optional(self.pool)
        .await
        .map_err(unique_conflict)?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete a user. Returns `false` if they did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user still has orders.
    #[tracing::instrument(skip(self), fields(user_id = %id))]
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| map_constraint(e, "user has existing orders"))?;

        Ok(result.rows_affected() > 0)
    }
}
