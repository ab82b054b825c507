//! Account creation, password login and session tokens.

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::DbConn;
use tracing::{info, warn};

use crate::db::entities::user;
use crate::db::services::user_service;
use crate::validation::{
    ValidationErrors, check_password_pair, normalize_email, normalize_username,
};
use crate::web::error::AppError;
use crate::web::models::{AuthenticatedUser, Claims, RegisterForm};

async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash(password, cost))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Password hashing task failed: {e}")))?
        .map_err(|e| AppError::PasswordHashingError(e.to_string()))
}

async fn verify_password(password: String, password_hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify(password, &password_hash))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Password check task failed: {e}")))?
        .map_err(|e| AppError::InternalServerError(format!("Password verification failed: {e}")))
}

/// Validates the registration form and stores the new account.
pub async fn create_account(
    db: &DbConn,
    form: &RegisterForm,
    bcrypt_cost: u32,
) -> Result<user::Model, AppError> {
    let mut errors = ValidationErrors::new();

    let username = normalize_username(&form.username)
        .map_err(|e| errors.merge(e))
        .ok();
    let email = normalize_email(&form.email).map_err(|e| errors.merge(e)).ok();
    if let Err(e) = check_password_pair(&form.password1, &form.password2) {
        errors.merge(e);
    }

    if let Some(name) = username.as_deref() {
        if user_service::get_user_by_username(db, name).await?.is_some() {
            errors.add("username", "A user with that username already exists.");
        }
    }

    let (Some(username), Some(email)) = (username, email) else {
        return Err(AppError::Validation(errors));
    };
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let password_hash = hash_password(form.password1.clone(), bcrypt_cost).await?;
    let user = user_service::create_user(db, username, email, password_hash).await?;

    info!(user_id = user.id, username = %user.username, "User registered.");
    Ok(user)
}

/// Checks a username/password pair. Unknown users and wrong passwords give
/// the same error.
pub async fn authenticate(
    db: &DbConn,
    username: &str,
    password: &str,
) -> Result<user::Model, AppError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(AppError::InvalidCredentials);
    }

    let Some(user) = user_service::get_user_by_username(db, username.trim()).await? else {
        warn!(username = %username, "Login attempt for unknown user.");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(password.to_string(), user.password_hash.clone()).await? {
        warn!(user_id = user.id, "Login attempt with wrong password.");
        return Err(AppError::InvalidCredentials);
    }

    Ok(user)
}

pub fn issue_token(user: &user::Model, jwt_secret: &str, ttl_hours: i64) -> Result<String, AppError> {
    let expiration = (Utc::now() + Duration::hours(ttl_hours)).timestamp() as usize;

    let claims = Claims {
        sub: user.username.clone(),
        user_id: user.id,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::TokenCreationError(e.to_string()))
}

/// `None` for malformed, forged or expired tokens.
pub fn decode_token(token: &str, jwt_secret: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| warn!(error = ?e, "Rejected session token."))
    .ok()
    .map(|data| data.claims)
}

/// Resolves a session token to a user that still exists.
pub async fn current_user(
    db: &DbConn,
    jwt_secret: &str,
    token: Option<&str>,
) -> Result<Option<AuthenticatedUser>, AppError> {
    let Some(claims) = token.and_then(|t| decode_token(t, jwt_secret)) else {
        return Ok(None);
    };

    let user = user_service::get_user_by_id(db, claims.user_id).await?;
    Ok(user.map(|u| AuthenticatedUser {
        id: u.id,
        username: u.username,
    }))
}
