//! Profile endpoints: own profile and signature/stamp/photo uploads.

use actix_web::{web, HttpRequest, HttpResponse};

use super::models::{JenisAset, Profil, UpdateProfilRequest, UploadAsetRequest};
use crate::auth::middleware::validate_request_token;
use crate::db::AppState;
use crate::error::AppError;
use crate::surat::berkas::slugify;
use uuid::Uuid;

/// The caller's own profile.
#[utoipa::path(
    get,
    path = "/api/users/profile",
    tag = "Users",
    responses(
        (status = 200, description = "Profile", body = Profil),
        (status = 401, description = "Not authenticated", body = crate::ErrorResponse)
    )
)]
pub async fn get_profile(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    let profil = state
        .get_profil(claims.user_id()?)
        .await?
        .ok_or_else(|| AppError::not_found("profil tidak ditemukan"))?;
    Ok(HttpResponse::Ok().json(profil))
}

/// Partial profile update; absent fields keep their value.
#[utoipa::path(
    put,
    path = "/api/users/profile",
    tag = "Users",
    request_body = UpdateProfilRequest,
    responses(
        (status = 200, description = "Profile updated", body = Profil),
        (status = 400, description = "Invalid input", body = crate::ErrorResponse)
    )
)]
pub async fn update_profile(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<UpdateProfilRequest>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;

    if let Some(nik) = &body.nik {
        if nik.trim().len() != 16 || !nik.trim().chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::validation("NIK harus terdiri dari 16 digit angka"));
        }
    }

    let profil = state.update_profil(claims.user_id()?, &body).await?;
    Ok(HttpResponse::Ok().json(profil))
}

/// Storage path for an uploaded image. Profile slots live under the
/// uploader's directory; the village logo is shared, so it gets a fixed
/// `aset/desa/` prefix instead of a per-user one.
pub fn path_aset(jenis: JenisAset, user_id: Uuid, file_name: &str) -> String {
    let slot = match jenis {
        JenisAset::TandaTangan => "tanda-tangan",
        JenisAset::Stempel => "stempel",
        JenisAset::Foto => "foto",
        JenisAset::Logo => {
            return format!(
                "aset/desa/logo-{}-{}",
                chrono::Utc::now().timestamp_millis(),
                slugify(file_name, "file")
            )
        }
    };
    format!(
        "aset/{}/{}-{}-{}",
        user_id,
        slot,
        chrono::Utc::now().timestamp_millis(),
        slugify(file_name, "file")
    )
}

/// Issue a signed upload URL for a signature, stamp, photo or village logo.
/// Signature, stamp and logo slots are restricted to village officers;
/// residents have no use for them and they end up on official documents.
/// Profile slots record their path on the profile row; the logo path is
/// saved through the village settings endpoint instead.
#[utoipa::path(
    post,
    path = "/api/users/profile/aset",
    tag = "Users",
    request_body = UploadAsetRequest,
    responses(
        (status = 200, description = "Signed upload slot", body = crate::storage::SignedUpload),
        (status = 403, description = "Slot restricted to officers", body = crate::ErrorResponse)
    )
)]
pub async fn upload_aset(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<UploadAsetRequest>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    let user_id = claims.user_id()?;

    if matches!(
        body.jenis,
        JenisAset::TandaTangan | JenisAset::Stempel | JenisAset::Logo
    ) {
        claims.require_petugas()?;
    }

    let file_path = path_aset(body.jenis, user_id, &body.file_name);

    let signed = state
        .storage
        .create_signed_upload_url(&file_path)
        .await
        .map_err(AppError::Storage)?;
    if body.jenis != JenisAset::Logo {
        state.set_aset_profil(user_id, body.jenis, &file_path).await?;
    }

    Ok(HttpResponse::Ok().json(signed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_aset_profil_berada_di_direktori_pengguna() {
        let user_id = Uuid::new_v4();
        let path = path_aset(JenisAset::TandaTangan, user_id, "ttd kades.png");
        assert!(path.starts_with(&format!("aset/{user_id}/tanda-tangan-")));
        assert!(path.ends_with("-ttd-kades.png"));
    }

    #[test]
    fn path_aset_logo_desa_tidak_terikat_pengguna() {
        let user_id = Uuid::new_v4();
        let path = path_aset(JenisAset::Logo, user_id, "logo desa.png");
        assert!(path.starts_with("aset/desa/logo-"));
        assert!(!path.contains(&user_id.to_string()));
    }
}
