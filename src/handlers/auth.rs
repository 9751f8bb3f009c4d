// src/handlers/auth.rs

use std::sync::LazyLock;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use regex::Regex;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{LoginRequest, RegisterRequest, User},
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Applies the registration form rules, in order, returning the first
/// violation. Nothing is written to the database unless all rules pass.
fn validate_registration(payload: &RegisterRequest) -> Result<(), String> {
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
        || payload.confirm_password.is_empty()
        || payload.role.trim().is_empty()
    {
        return Err("All fields are required.".to_string());
    }
    if !EMAIL_RE.is_match(&payload.email) {
        return Err("Please enter a valid email address.".to_string());
    }
    if payload.password.len() < 6 {
        return Err("Password must be at least 6 characters.".to_string());
    }
    if payload.password != payload.confirm_password {
        return Err("Passwords do not match.".to_string());
    }
    if payload.role != "user" && payload.role != "admin" {
        return Err("Role must be either 'user' or 'admin'.".to_string());
    }
    Ok(())
}

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding the password hash).
pub async fn register(
    State(pool): State<PgPool>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_registration(&payload).map_err(AppError::BadRequest)?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, password, role)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, email, password, role, created_at
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&hashed_password)
    .bind(&payload.role)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        // Postgres error code for unique violation is 23505
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict("An account with that name or email already exists.".to_string())
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a JWT token.
///
/// Verifies the email and password against the database.
/// If valid, signs a JWT token with the user's id, name and role.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, password, role, created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(&payload.email)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let user = user.ok_or(AppError::AuthError("User not found".to_string()))?;

    let is_valid = verify_password(&payload.password, &user.password)?;

    if !is_valid {
        return Err(AppError::AuthError("Invalid password".to_string()));
    }

    let token = sign_jwt(
        user.id,
        &user.name,
        &user.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "user": user,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(
        name: &str,
        email: &str,
        password: &str,
        confirm: &str,
        role: &str,
    ) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
            role: role.to_string(),
        }
    }

    #[test]
    fn accepts_a_complete_form() {
        let p = payload("Alice", "alice@example.com", "secret1", "secret1", "user");
        assert!(validate_registration(&p).is_ok());
    }

    #[test]
    fn rejects_any_empty_field() {
        for p in [
            payload("", "alice@example.com", "secret1", "secret1", "user"),
            payload("Alice", "", "secret1", "secret1", "user"),
            payload("Alice", "alice@example.com", "", "", "user"),
            payload("Alice", "alice@example.com", "secret1", "secret1", ""),
        ] {
            assert_eq!(
                validate_registration(&p),
                Err("All fields are required.".to_string())
            );
        }
    }

    #[test]
    fn rejects_malformed_emails() {
        for email in ["plainaddress", "a@b", "two words@mail.com", "a@@b.com"] {
            let p = payload("Alice", email, "secret1", "secret1", "user");
            assert_eq!(
                validate_registration(&p),
                Err("Please enter a valid email address.".to_string())
            );
        }
    }

    #[test]
    fn accepts_plausible_emails() {
        for email in ["alice@example.com", "a.b+c@mail.co.uk"] {
            let p = payload("Alice", email, "secret1", "secret1", "user");
            assert!(validate_registration(&p).is_ok(), "{email} should pass");
        }
    }

    #[test]
    fn rejects_short_passwords() {
        let p = payload("Alice", "alice@example.com", "abc12", "abc12", "user");
        assert_eq!(
            validate_registration(&p),
            Err("Password must be at least 6 characters.".to_string())
        );
    }

    #[test]
    fn rejects_mismatched_passwords() {
        let p = payload("Alice", "alice@example.com", "secret1", "secret2", "user");
        assert_eq!(
            validate_registration(&p),
            Err("Passwords do not match.".to_string())
        );
    }

    #[test]
    fn rejects_unknown_roles() {
        let p = payload("Alice", "alice@example.com", "secret1", "secret1", "superuser");
        assert!(validate_registration(&p).is_err());
    }
}
