//! User management commands.
//!
//! Registration over HTTP only ever creates customers, so the first admin
//! comes from here.

use shopdesk_core::UserRole;
use shopdesk_server::db::UserRepository;
use shopdesk_server::models::CreateUserInput;
use shopdesk_server::services::auth::hash_password;

use super::{CliError, connect};

/// Arguments of `user create`.
pub struct NewUserArgs {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub password: String,
}

/// Validate, hash and insert a user. Returns the new user's ID.
pub async fn create(args: NewUserArgs) -> Result<i32, CliError> {
    let input = CreateUserInput {
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        phone: None,
        address: None,
        username: args.username,
        password: args.password,
    };
    // Same field rules as registration; only the role differs
    let (mut new_user, password) = input.validate()?;
    new_user.role = args.role;

    let password_hash = hash_password(&password)?;

    let pool = connect().await?;
    let user = UserRepository::new(&pool)
        .create(&new_user, &password_hash)
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Username: {}, Role: {}",
        user.id,
        user.username,
        user.role
    );
    Ok(user.id.as_i32())
}
