use actix_web::HttpRequest;
use uuid::Uuid;

use super::jwt::validate_token;
use super::model::{Claims, Role};
use crate::error::AppError;

/// Extract token from Authorization header
fn extract_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer ").map(|t| t.to_string()))
}

/// Validate token from HttpRequest and return claims
pub fn validate_request_token(req: &HttpRequest) -> Result<Claims, AppError> {
    let token = extract_token(req)
        .ok_or_else(|| AppError::Unauthorized("missing authorization token".to_string()))?;

    let claims = validate_token(&token).map_err(|e| {
        log::warn!("Token validation failed: {:?}", e);
        AppError::Unauthorized("invalid or expired token".to_string())
    })?;

    if claims.token_type != "access" {
        return Err(AppError::Unauthorized("invalid token type".to_string()));
    }

    Ok(claims)
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::Unauthorized("malformed subject claim".to_string()))
    }

    /// STAF or KEPALA_DESA.
    pub fn require_petugas(&self) -> Result<(), AppError> {
        if self.role.is_petugas() {
            Ok(())
        } else {
            Err(AppError::forbidden("akses khusus petugas desa"))
        }
    }

    /// KEPALA_DESA only.
    pub fn require_kepala_desa(&self) -> Result<(), AppError> {
        if self.role == Role::KepalaDesa {
            Ok(())
        } else {
            Err(AppError::forbidden("akses khusus kepala desa"))
        }
    }
}
