//! Village settings endpoints, officers only.

use actix_web::{web, HttpRequest, HttpResponse};

use super::models::{PengaturanDesa, SimpanPengaturanRequest};
use crate::auth::middleware::validate_request_token;
use crate::db::AppState;
use crate::error::AppError;

/// Current village settings.
#[utoipa::path(
    get,
    path = "/api/admin/pengaturan",
    tag = "Admin",
    responses(
        (status = 200, description = "Village settings", body = PengaturanDesa),
        (status = 403, description = "Officers only", body = crate::ErrorResponse),
        (status = 404, description = "Not configured yet", body = crate::ErrorResponse)
    )
)]
pub async fn get_pengaturan(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    claims.require_petugas()?;
    let pengaturan = state
        .get_pengaturan()
        .await?
        .ok_or_else(|| AppError::not_found("pengaturan desa belum diisi"))?;
    Ok(HttpResponse::Ok().json(pengaturan))
}

/// Create or replace the settings singleton.
#[utoipa::path(
    put,
    path = "/api/admin/pengaturan",
    tag = "Admin",
    request_body = SimpanPengaturanRequest,
    responses(
        (status = 200, description = "Settings saved", body = PengaturanDesa),
        (status = 400, description = "Invalid input", body = crate::ErrorResponse),
        (status = 403, description = "Officers only", body = crate::ErrorResponse)
    )
)]
pub async fn put_pengaturan(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<SimpanPengaturanRequest>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    claims.require_petugas()?;

    if body.nama_desa.trim().is_empty() || body.alamat_kantor.trim().is_empty() {
        return Err(AppError::validation(
            "nama_desa dan alamat_kantor wajib diisi",
        ));
    }

    let pengaturan = state.simpan_pengaturan(&body).await?;
    log::info!("pengaturan desa diperbarui oleh {}", claims.email);
    Ok(HttpResponse::Ok().json(pengaturan))
}
