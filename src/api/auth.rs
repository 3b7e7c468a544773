//! Public authentication endpoints: login, registration, and the
//! password-reset flow.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{AppState, MessageResponse};
use crate::auth::{generate_reset_token, hash_password, verify_password};
use crate::db::now_ms;
use crate::error::{ApiError, ApiResult};
use crate::notify::{NotificationKind, NotificationPayload};
use crate::types::{EmployeeView, Role, TaskView, UserPayload};

/// Reset tokens are valid for one hour.
const RESET_TOKEN_TTL_MS: i64 = 60 * 60 * 1000;

/// Returned for forgot-password whether or not the email exists, so the
/// endpoint cannot be used to probe for registered addresses.
const RESET_REQUESTED_MESSAGE: &str =
    "If the email exists in our system, a password reset link has been sent.";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub admin_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub user: UserPayload,
}

#[derive(Debug, Serialize)]
pub struct RegisteredResponse {
    pub message: String,
    pub employee: EmployeeView,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub new_password: Option<String>,
}

/// `POST /auth/login` — admins are checked before employees, matching the
/// established contract.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let (Some(email), Some(password)) = (req.email, req.password) else {
        return Err(ApiError::invalid_value("Email and password are required"));
    };

    if let Some(admin) = state.db.get_admin_by_email(&email)?
        && verify_password(&password, &admin.password_hash)
    {
        let token = state.keys.issue(&admin.id, &admin.email, Role::Admin)?;
        info!(email = %admin.email, "Admin logged in");
        return Ok(Json(TokenResponse {
            token,
            user: UserPayload {
                id: admin.id,
                email: admin.email,
                role: Role::Admin,
                first_name: admin.first_name,
                task_counts: None,
                tasks: None,
            },
        }));
    }

    if let Some(employee) = state.db.get_employee_by_email(&email)?
        && verify_password(&password, &employee.password_hash)
    {
        let token = state
            .keys
            .issue(&employee.id, &employee.email, Role::Employee)?;
        let tasks = state.db.list_tasks_for(&employee.id)?;
        info!(email = %employee.email, "Employee logged in");
        return Ok(Json(TokenResponse {
            token,
            user: UserPayload {
                id: employee.id,
                email: employee.email,
                role: Role::Employee,
                first_name: employee.first_name,
                task_counts: Some(employee.task_counts),
                tasks: Some(tasks.iter().map(TaskView::from).collect()),
            },
        }));
    }

    Err(ApiError::invalid_credentials())
}

/// `POST /auth/register` — create an employee account without auto-login.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let (Some(first_name), Some(email), Some(password)) =
        (req.first_name, req.email, req.password)
    else {
        return Err(ApiError::invalid_value("All fields are required"));
    };

    let password_hash = hash_password(&password)?;
    let employee = state.db.create_employee(&first_name, &email, &password_hash)?;
    info!(email = %employee.email, "Employee registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisteredResponse {
            message: "Employee registered successfully".to_string(),
            employee: EmployeeView::new(&employee, &[]),
        }),
    ))
}

/// `POST /auth/register/employee` — self-service registration with
/// auto-login.
pub async fn register_employee(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let (Some(first_name), Some(email), Some(password)) =
        (req.first_name, req.email, req.password)
    else {
        return Err(ApiError::invalid_value("All fields are required"));
    };

    if password.len() < 6 {
        return Err(ApiError::invalid_value(
            "Password must be at least 6 characters long",
        ));
    }

    let password_hash = hash_password(&password)?;
    let employee = state.db.create_employee(&first_name, &email, &password_hash)?;
    let token = state
        .keys
        .issue(&employee.id, &employee.email, Role::Employee)?;
    info!(email = %employee.email, "Employee self-registered");

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            token,
            user: UserPayload {
                id: employee.id,
                email: employee.email,
                role: Role::Employee,
                first_name: employee.first_name,
                task_counts: Some(employee.task_counts),
                tasks: Some(Vec::new()),
            },
        }),
    ))
}

/// `POST /auth/register/admin` — gated by the server-held registration key.
pub async fn register_admin(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let (Some(first_name), Some(email), Some(password), Some(admin_key)) =
        (req.first_name, req.email, req.password, req.admin_key)
    else {
        return Err(ApiError::invalid_value(
            "All fields including admin key are required",
        ));
    };

    if admin_key != state.admin_registration_key {
        warn!(email = %email, "Admin registration rejected: bad key");
        return Err(ApiError::forbidden("Invalid admin registration key"));
    }

    if password.len() < 8 {
        return Err(ApiError::invalid_value(
            "Admin password must be at least 8 characters long",
        ));
    }

    let password_hash = hash_password(&password)?;
    let admin = state.db.create_admin(&first_name, &email, &password_hash)?;
    let token = state.keys.issue(&admin.id, &admin.email, Role::Admin)?;
    info!(email = %admin.email, "Admin registered");

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            token,
            user: UserPayload {
                id: admin.id,
                email: admin.email,
                role: Role::Admin,
                first_name: admin.first_name,
                task_counts: None,
                tasks: None,
            },
        }),
    ))
}

/// `POST /auth/forgot-password` — always answers with the same generic
/// message; a failed email send rolls the freshly stored token back so the
/// user is not left holding a link that was never delivered.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let Some(email) = req.email else {
        return Err(ApiError::invalid_value("Email is required"));
    };

    let Some(principal) = state.db.find_principal_by_email(&email)? else {
        return Ok(MessageResponse::new(RESET_REQUESTED_MESSAGE));
    };

    let token = generate_reset_token();
    let expires_at = now_ms() + RESET_TOKEN_TTL_MS;
    state
        .db
        .set_reset_token(principal.role, &principal.id, &token, expires_at)?;

    let payload = NotificationPayload {
        first_name: principal.first_name.clone(),
        reset_url: Some(format!(
            "{}/reset-password?token={}",
            state.frontend_url, token
        )),
    };

    if let Err(e) = state
        .notifier
        .send(NotificationKind::PasswordReset, &principal.email, &payload)
        .await
    {
        warn!(error = %e, email = %principal.email, "Reset email failed; clearing token");
        state.db.clear_reset_token(principal.role, &principal.id)?;
        return Err(ApiError::email(
            "Failed to send password reset email. Please try again later.",
        ));
    }

    info!(email = %principal.email, role = principal.role.as_str(), "Password reset initiated");
    Ok(MessageResponse::new(RESET_REQUESTED_MESSAGE))
}

/// `POST /auth/reset-password` — consumes an unexpired token. The
/// confirmation email is best-effort: the password change has already
/// happened, so a send failure is logged and swallowed.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let (Some(token), Some(new_password)) = (req.token, req.new_password) else {
        return Err(ApiError::invalid_value("Token and new password are required"));
    };

    if new_password.len() < 6 {
        return Err(ApiError::invalid_value(
            "Password must be at least 6 characters long",
        ));
    }

    let Some(principal) = state.db.find_principal_by_reset_token(&token)? else {
        return Err(ApiError::invalid_reset_token());
    };

    let password_hash = hash_password(&new_password)?;
    state
        .db
        .update_password_and_clear_token(principal.role, &principal.id, &password_hash)?;
    info!(email = %principal.email, role = principal.role.as_str(), "Password reset completed");

    let payload = NotificationPayload {
        first_name: principal.first_name.clone(),
        reset_url: None,
    };
    if let Err(e) = state
        .notifier
        .send(
            NotificationKind::PasswordChanged,
            &principal.email,
            &payload,
        )
        .await
    {
        warn!(error = %e, email = %principal.email, "Confirmation email failed (non-critical)");
    }

    Ok(MessageResponse::new(
        "Password has been reset successfully. You can now log in with your new password.",
    ))
}
