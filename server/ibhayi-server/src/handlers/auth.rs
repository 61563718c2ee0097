//! Authentication endpoints: login, customer registration, password reset.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{hash_password, tokens, verify_password};
use crate::error::{api_success, ApiError, ApiResponse};
use crate::middleware::AuthContext;
use crate::models::UserAccount;
use crate::server::IbhayiServer;
use crate::validation::RequestValidation;
use crate::{validate_email, validate_field, validate_required};

/// Reset tokens expire after this many hours.
const RESET_TOKEN_TTL_HOURS: i64 = 2;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl RequestValidation for LoginRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.email, "Email is required");
        validate_email!(self.email, "Invalid email format");
        validate_required!(self.password, "Password is required");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: String,
    pub first_name: String,
    pub last_name: String,
    pub password_reset_required: bool,
}

/// Log in with email and password; returns a JWT carrying the account role.
pub async fn login(
    State(server): State<IbhayiServer>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    req.validate()?;

    let account = sqlx::query_as::<_, UserAccount>(
        "SELECT * FROM user_accounts WHERE email = $1 AND is_active = true",
    )
    .bind(req.email.trim().to_lowercase())
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::authentication("Invalid email or password"))?;

    let valid = verify_password(&req.password, &account.password_hash).await?;
    if !valid {
        return Err(ApiError::authentication("Invalid email or password"));
    }

    // Resolve the domain identity for the role so handlers never re-query it
    let (pharmacist_id, customer_id, pharmacy_id) = match account.role.as_str() {
        "pharmacist" => {
            let row = sqlx::query_as::<_, (Uuid, Uuid)>(
                "SELECT id, pharmacy_id FROM pharmacists WHERE user_id = $1",
            )
            .bind(account.id)
            .fetch_optional(&server.db_pool)
            .await?;
            match row {
                Some((id, pharmacy)) => (Some(id), None, Some(pharmacy)),
                None => (None, None, None),
            }
        }
        "customer" => {
            let row = sqlx::query_scalar::<_, Uuid>(
                "SELECT id FROM customers WHERE user_id = $1",
            )
            .bind(account.id)
            .fetch_optional(&server.db_pool)
            .await?;
            (None, row, None)
        }
        _ => (None, None, None),
    };

    let token = tokens::issue_token(
        &server.config.jwt_secret,
        server.config.token_ttl_hours,
        account.id,
        &account.role,
        &account.email,
        pharmacist_id,
        customer_id,
        pharmacy_id,
    )?;

    tracing::info!(user_id = %account.id, role = %account.role, "User logged in");

    Ok(Json(api_success(LoginResponse {
        token,
        role: account.role,
        first_name: account.first_name,
        last_name: account.last_name,
        password_reset_required: account.password_reset_required,
    })))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub id_number: String,
    pub cellphone: Option<String>,
    pub allergies: Option<String>,
}

impl RequestValidation for RegisterRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.email, "Email is required");
        validate_email!(self.email, "Invalid email format");
        validate_required!(self.first_name, "First name is required");
        validate_required!(self.last_name, "Last name is required");
        validate_required!(self.id_number, "ID number is required");
        validate_field!(
            self.id_number,
            self.id_number.trim().chars().all(|c| c.is_ascii_digit()),
            "ID number must be numeric"
        );
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub customer_id: Uuid,
}

/// Customer self-registration: creates a user account plus its customer row.
pub async fn register(
    State(server): State<IbhayiServer>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RegisterResponse>>), ApiError> {
    req.validate()?;

    let email = req.email.trim().to_lowercase();

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM user_accounts WHERE email = $1)",
    )
    .bind(&email)
    .fetch_one(&server.db_pool)
    .await?;

    if exists {
        return Err(ApiError::conflict(
            "An account with this email already exists",
        ));
    }

    let password_hash = hash_password(&req.password)
        .await
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let mut tx = server.db_pool.begin().await?;

    let user_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO user_accounts (email, password_hash, role, first_name, last_name, id_number, cellphone)
        VALUES ($1, $2, 'customer', $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(req.first_name.trim())
    .bind(req.last_name.trim())
    .bind(req.id_number.trim())
    .bind(req.cellphone.as_deref())
    .fetch_one(&mut *tx)
    .await?;

    let customer_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO customers (user_id, allergies) VALUES ($1, $2) RETURNING id",
    )
    .bind(user_id)
    .bind(req.allergies.as_deref().unwrap_or(""))
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(user_id = %user_id, "Customer registered");

    Ok((
        StatusCode::CREATED,
        Json(api_success(RegisterResponse {
            user_id,
            customer_id,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Request a password reset link.
///
/// Always responds with the same accepted message: the endpoint never reveals
/// whether an account exists, and email delivery failures are logged and
/// swallowed.
pub async fn password_reset_request(
    State(server): State<IbhayiServer>,
    Json(req): Json<PasswordResetRequest>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let email = req.email.trim().to_lowercase();

    let user_id = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM user_accounts WHERE email = $1 AND is_active = true",
    )
    .bind(&email)
    .fetch_optional(&server.db_pool)
    .await?;

    if let Some(user_id) = user_id {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(48)
            .map(char::from)
            .collect();

        sqlx::query(
            "INSERT INTO password_reset_tokens (user_id, token, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(&token)
        .bind(Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS))
        .execute(&server.db_pool)
        .await?;

        let reset_link = format!(
            "{}/reset-password?token={}",
            std::env::var("FRONTEND_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            token
        );

        if let Err(e) = server.email.send_password_reset_email(&email, &reset_link).await {
            tracing::warn!(error = %e, "Failed to send password reset email");
        }
    }

    Ok(Json(api_success(
        "If the account exists, a reset email has been sent".to_string(),
    )))
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub new_password: String,
}

/// Consume a reset token and set the new password.
pub async fn password_reset_confirm(
    State(server): State<IbhayiServer>,
    Json(req): Json<PasswordResetConfirm>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let row = sqlx::query_as::<_, (Uuid, Uuid)>(
        r#"
        SELECT id, user_id FROM password_reset_tokens
        WHERE token = $1 AND used = false AND expires_at > NOW()
        "#,
    )
    .bind(&req.token)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::authentication("Invalid or expired reset token"))?;

    let (token_id, user_id) = row;

    let password_hash = hash_password(&req.new_password)
        .await
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let mut tx = server.db_pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE user_accounts
        SET password_hash = $1, password_reset_required = false, updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(&password_hash)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE password_reset_tokens SET used = true WHERE id = $1")
        .bind(token_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(user_id = %user_id, "Password reset completed");

    Ok(Json(api_success("Password has been reset".to_string())))
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    pub first_name: String,
    pub last_name: String,
    pub pharmacy_id: Option<Uuid>,
}

/// Role-scoped landing payload for the authenticated principal.
pub async fn me(
    State(server): State<IbhayiServer>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<MeResponse>>, ApiError> {
    let account = sqlx::query_as::<_, UserAccount>(
        "SELECT * FROM user_accounts WHERE id = $1",
    )
    .bind(auth.user_id)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("user account"))?;

    Ok(Json(api_success(MeResponse {
        user_id: account.id,
        email: account.email,
        role: auth.role.as_str().to_string(),
        first_name: account.first_name,
        last_name: account.last_name,
        pharmacy_id: auth.pharmacy_id,
    })))
}
