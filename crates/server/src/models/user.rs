//! User domain types.
//!
//! The password hash never leaves the `db` and `services::auth` modules:
//! [`User`] has no hash field and [`UserResponse`] is what the API returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopdesk_core::{Email, UserId, UserRole};

use super::{ValidationError, check_length};

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 50;
const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;
const PASSWORD_MIN: usize = 8;

/// Username nobody can register or rename to.
const RESERVED_USERNAME: &str = "admin";

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub username: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// JSON representation of a user.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub username: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            full_name: user.full_name(),
            user_id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone: user.phone,
            address: user.address,
            username: user.username,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Credentials submitted to `POST /users/login` and `POST /admin/login`.
#[derive(Clone, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginInput")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Payload for `POST /users`.
#[derive(Clone, Deserialize)]
pub struct CreateUserInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for CreateUserInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUserInput")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// A validated registration, ready to insert once the password is hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub username: String,
    pub role: UserRole,
}

impl CreateUserInput {
    /// Validate every field. Registrations are always customers.
    ///
    /// Returns the validated user and the plain password to hash.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the first invalid field.
    pub fn validate(self) -> Result<(NewUser, String), ValidationError> {
        let first_name = self.first_name.trim().to_owned();
        let last_name = self.last_name.trim().to_owned();
        check_length("first_name", &first_name, NAME_MIN, NAME_MAX)?;
        check_length("last_name", &last_name, NAME_MIN, NAME_MAX)?;
        let email = Email::parse(&self.email).map_err(|e| ValidationError(e.to_string()))?;
        let phone = normalize_phone(self.phone)?;
        let username = validate_username(&self.username)?;
        validate_password(&self.password)?;

        Ok((
            NewUser {
                first_name,
                last_name,
                email,
                phone,
                address: self.address.filter(|a| !a.trim().is_empty()),
                username,
                role: UserRole::Customer,
            },
            self.password,
        ))
    }
}

/// Payload for `PUT /users/{id}`. Absent fields keep their stored value.
#[derive(Clone, Default, Deserialize)]
pub struct UpdateUserInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<UserRole>,
}

impl std::fmt::Debug for UpdateUserInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateUserInput")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

/// Validated field changes for a user. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<Email>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub username: Option<String>,
    pub role: Option<UserRole>,
}

impl UpdateUserInput {
    /// Validate the supplied fields.
    ///
    /// Returns the changes and, if present, the new plain password.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the first invalid field.
    pub fn validate(self) -> Result<(UserChanges, Option<String>), ValidationError> {
        let first_name = self.first_name.map(|n| n.trim().to_owned());
        if let Some(name) = &first_name {
            check_length("first_name", name, NAME_MIN, NAME_MAX)?;
        }
        let last_name = self.last_name.map(|n| n.trim().to_owned());
        if let Some(name) = &last_name {
            check_length("last_name", name, NAME_MIN, NAME_MAX)?;
        }
        let email = self
            .email
            .map(|e| Email::parse(&e))
            .transpose()
            .map_err(|e| ValidationError(e.to_string()))?;
        let phone = normalize_phone(self.phone)?;
        let username = self.username.as_deref().map(validate_username).transpose()?;
        if let Some(password) = &self.password {
            validate_password(password)?;
        }

        Ok((
            UserChanges {
                first_name,
                last_name,
                email,
                phone,
                address: self.address,
                username,
                role: self.role,
            },
            self.password,
        ))
    }
}

/// Accept a phone number of `0` followed by nine digits. Blank means none.
fn normalize_phone(phone: Option<String>) -> Result<Option<String>, ValidationError> {
    let Some(phone) = phone else {
        return Ok(None);
    };
    let phone = phone.trim();
    if phone.is_empty() {
        return Ok(None);
    }
    let valid = phone.len() == 10
        && phone.starts_with('0')
        && phone.bytes().all(|b| b.is_ascii_digit());
    if !valid {
        return Err(ValidationError::new(
            "phone must be 10 digits starting with 0",
        ));
    }
    Ok(Some(phone.to_owned()))
}

fn validate_username(username: &str) -> Result<String, ValidationError> {
    let username = username.trim();
    check_length("username", username, USERNAME_MIN, USERNAME_MAX)?;
    if username.eq_ignore_ascii_case(RESERVED_USERNAME) {
        return Err(ValidationError::new("Username cannot be \"admin\""));
    }
    Ok(username.to_owned())
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(ValidationError(format!(
            "password must be at least {PASSWORD_MIN} characters"
        )));
    }
    Ok(())
}
