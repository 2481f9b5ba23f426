use actix_web::{web, HttpResponse};
use bcrypt::{hash, verify, DEFAULT_COST};

use super::jwt::{
    generate_access_token, generate_refresh_token, get_access_token_expiry, validate_token,
};
use super::model::{LoginRequest, RefreshRequest, RegisterRequest, Role, TokenResponse};
use crate::db::AppState;
use crate::error::AppError;

fn token_pair(user: &super::model::User) -> Result<TokenResponse, AppError> {
    let access_token = generate_access_token(user.id, &user.email, user.role)
        .map_err(|e| AppError::Unauthorized(format!("failed to generate token: {e}")))?;
    let refresh_token = generate_refresh_token(user.id, &user.email, user.role)
        .map_err(|e| AppError::Unauthorized(format!("failed to generate token: {e}")))?;
    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: get_access_token_expiry(),
    })
}

/// Register a new resident account with its profile.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = TokenResponse),
        (status = 400, description = "Invalid input", body = crate::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::ErrorResponse)
    )
)]
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    if body.email.trim().is_empty() || body.password.len() < 8 {
        return Err(AppError::validation(
            "email wajib diisi dan password minimal 8 karakter",
        ));
    }
    if body.nama_lengkap.trim().is_empty() {
        return Err(AppError::validation("nama lengkap wajib diisi"));
    }
    if body.nik.trim().len() != 16 || !body.nik.trim().chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::validation("NIK harus terdiri dari 16 digit angka"));
    }

    let password_hash = hash(&body.password, DEFAULT_COST)
        .map_err(|e| AppError::validation(format!("gagal memproses password: {e}")))?;

    let user = state
        .create_user(
            body.email.trim(),
            &password_hash,
            Role::Warga,
            body.nama_lengkap.trim(),
            body.nik.trim(),
        )
        .await?;

    log::info!("registered new resident account {}", user.email);
    Ok(HttpResponse::Created().json(token_pair(&user)?))
}

/// Login endpoint
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = crate::ErrorResponse)
    )
)]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let user = state
        .get_user_by_email(&body.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("email atau password salah".to_string()))?;

    let password_valid = verify(&body.password, &user.password_hash).unwrap_or(false);
    if !password_valid {
        return Err(AppError::Unauthorized("email atau password salah".to_string()));
    }

    Ok(HttpResponse::Ok().json(token_pair(&user)?))
}

/// Refresh access token
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "Authentication",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed", body = TokenResponse),
        (status = 401, description = "Invalid refresh token", body = crate::ErrorResponse)
    )
)]
pub async fn refresh_token(
    state: web::Data<AppState>,
    body: web::Json<RefreshRequest>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_token(&body.refresh_token).map_err(|e| {
        log::warn!("Invalid refresh token: {:?}", e);
        AppError::Unauthorized("invalid or expired refresh token".to_string())
    })?;

    if claims.token_type != "refresh" {
        return Err(AppError::Unauthorized("invalid token type".to_string()));
    }

    // Re-read the user so a role change is picked up on refresh.
    let user = state
        .get_user_by_email(&claims.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))?;

    Ok(HttpResponse::Ok().json(token_pair(&user)?))
}
