//! Submission endpoints: the resident flow, the staff verification queue,
//! the head-of-village approval queue and the document download.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use super::berkas;
use super::models::{
    AjukanVerifikasiRequest, BerkasDenganUrl, CatatBerkasRequest, CreatePengajuanRequest,
    KeputusanRequest, SuratKeluar, UploadUrlRequest,
};
use super::status::StatusSurat;
use crate::auth::middleware::validate_request_token;
use crate::db::AppState;
use crate::error::AppError;
use crate::renderer;

const MASA_BERLAKU_URL_LIHAT: u32 = 600;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListSuratQuery {
    /// Narrow the listing to one status.
    pub status: Option<StatusSurat>,
}

async fn surat_untuk_akses(
    state: &AppState,
    surat_id: Uuid,
    claims: &crate::auth::model::Claims,
) -> Result<SuratKeluar, AppError> {
    let surat = state
        .get_surat(surat_id)
        .await?
        .ok_or_else(|| AppError::not_found("pengajuan tidak ditemukan"))?;
    if surat.pemohon_id != claims.user_id()? && !claims.role.is_petugas() {
        return Err(AppError::forbidden("pengajuan ini bukan milik Anda"));
    }
    Ok(surat)
}

/// List templates residents can apply for.
#[utoipa::path(
    get,
    path = "/api/surat/templates",
    tag = "Surat",
    responses(
        (status = 200, description = "Active templates", body = [crate::template::models::TemplateSurat]),
        (status = 401, description = "Not authenticated", body = crate::ErrorResponse)
    )
)]
pub async fn list_templates_aktif(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    validate_request_token(&req)?;
    let templates = state.list_templates(true).await?;
    Ok(HttpResponse::Ok().json(templates))
}

/// One active template by its letter code, for the submission form.
#[utoipa::path(
    get,
    path = "/api/surat/templates/{kode_surat}",
    tag = "Surat",
    params(("kode_surat" = String, Path, description = "Letter code")),
    responses(
        (status = 200, description = "Template", body = crate::template::models::TemplateSurat),
        (status = 404, description = "Unknown or inactive code", body = crate::ErrorResponse)
    )
)]
pub async fn get_template_aktif(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    validate_request_token(&req)?;
    let template = state
        .get_template_by_kode(&path.into_inner())
        .await?
        .filter(|t| t.is_active)
        .ok_or_else(|| AppError::not_found("template tidak ditemukan"))?;
    Ok(HttpResponse::Ok().json(template))
}

/// Start a new submission.
#[utoipa::path(
    post,
    path = "/api/surat/pengajuan",
    tag = "Surat",
    request_body = CreatePengajuanRequest,
    responses(
        (status = 201, description = "Submission created", body = SuratKeluar),
        (status = 400, description = "Template inactive", body = crate::ErrorResponse),
        (status = 404, description = "Template not found", body = crate::ErrorResponse)
    )
)]
pub async fn create_pengajuan(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<CreatePengajuanRequest>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    let surat = state
        .create_pengajuan(claims.user_id()?, &claims.email, &body)
        .await?;
    log::info!("pengajuan {} dibuat oleh {}", surat.id, claims.email);
    Ok(HttpResponse::Created().json(surat))
}

/// List the caller's own submissions.
#[utoipa::path(
    get,
    path = "/api/surat/pengajuan",
    tag = "Surat",
    responses(
        (status = 200, description = "Own submissions", body = [super::models::PengajuanRingkas])
    )
)]
pub async fn list_pengajuan(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    let daftar = state.list_pengajuan_warga(claims.user_id()?).await?;
    Ok(HttpResponse::Ok().json(daftar))
}

/// One submission, for its owner or any village officer.
#[utoipa::path(
    get,
    path = "/api/surat/pengajuan/{id}",
    tag = "Surat",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Submission detail", body = SuratKeluar),
        (status = 403, description = "Not the owner", body = crate::ErrorResponse),
        (status = 404, description = "Not found", body = crate::ErrorResponse)
    )
)]
pub async fn get_pengajuan(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    let surat = surat_untuk_akses(&state, path.into_inner(), &claims).await?;
    Ok(HttpResponse::Ok().json(surat))
}

/// Activity log of one submission, oldest first.
#[utoipa::path(
    get,
    path = "/api/surat/pengajuan/{id}/log",
    tag = "Surat",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Activity log", body = [super::models::LogAktivitas])
    )
)]
pub async fn list_log(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    let surat = surat_untuk_akses(&state, path.into_inner(), &claims).await?;
    let log = state.list_log(surat.id).await?;
    Ok(HttpResponse::Ok().json(log))
}

/// Issue a signed upload URL for one requirement file. The submission must
/// still be editable and the requirement must belong to its template.
#[utoipa::path(
    post,
    path = "/api/surat/upload-url",
    tag = "Surat",
    request_body = UploadUrlRequest,
    responses(
        (status = 200, description = "Signed upload slot", body = crate::storage::SignedUpload),
        (status = 400, description = "Unknown requirement or submission locked", body = crate::ErrorResponse)
    )
)]
pub async fn upload_url(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<UploadUrlRequest>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    let user_id = claims.user_id()?;

    let surat = state
        .get_surat(body.surat_id)
        .await?
        .ok_or_else(|| AppError::not_found("pengajuan tidak ditemukan"))?;
    if surat.pemohon_id != user_id {
        return Err(AppError::forbidden("pengajuan ini bukan milik Anda"));
    }
    if !surat.status.bisa_ubah_berkas() {
        return Err(AppError::InvalidTransition(format!(
            "berkas tidak dapat diubah pada status {}",
            surat.status.nama()
        )));
    }

    let template = state
        .get_template(surat.template_id)
        .await?
        .ok_or_else(|| AppError::not_found("template tidak ditemukan"))?;
    if !template.persyaratan.iter().any(|p| p == &body.persyaratan) {
        return Err(AppError::validation(format!(
            "persyaratan '{}' tidak dikenal untuk template ini",
            body.persyaratan
        )));
    }

    let file_path = berkas::path_unggah(user_id, surat.id, &body.persyaratan, &body.file_name);
    let signed = state
        .storage
        .create_signed_upload_url(&file_path)
        .await
        .map_err(AppError::Storage)?;
    Ok(HttpResponse::Ok().json(signed))
}

/// Record a finished upload against its requirement.
#[utoipa::path(
    post,
    path = "/api/surat/berkas",
    tag = "Surat",
    request_body = CatatBerkasRequest,
    responses(
        (status = 200, description = "Attachment recorded", body = SuratKeluar),
        (status = 400, description = "Unknown requirement or submission locked", body = crate::ErrorResponse)
    )
)]
pub async fn catat_berkas(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<CatatBerkasRequest>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    let surat = state
        .catat_berkas(
            body.surat_id,
            claims.user_id()?,
            &body.persyaratan,
            &body.file_path,
        )
        .await?;
    Ok(HttpResponse::Ok().json(surat))
}

/// List a submission's attachments with fresh signed view URLs.
#[utoipa::path(
    get,
    path = "/api/surat/berkas/{surat_id}",
    tag = "Surat",
    params(("surat_id" = Uuid, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Attachments", body = [BerkasDenganUrl])
    )
)]
pub async fn list_berkas(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    let surat = surat_untuk_akses(&state, path.into_inner(), &claims).await?;

    let mut daftar = Vec::with_capacity(surat.file_persyaratan.0.len());
    for b in &surat.file_persyaratan.0 {
        let view_url = state
            .storage
            .create_signed_view_url(&b.file_path, MASA_BERLAKU_URL_LIHAT)
            .await
            .map_err(AppError::Storage)?;
        daftar.push(BerkasDenganUrl {
            persyaratan: b.persyaratan.clone(),
            file_path: b.file_path.clone(),
            view_url,
        });
    }
    Ok(HttpResponse::Ok().json(daftar))
}

/// Submit for staff verification once every requirement has a file.
#[utoipa::path(
    post,
    path = "/api/surat/ajukan-verifikasi",
    tag = "Surat",
    request_body = AjukanVerifikasiRequest,
    responses(
        (status = 200, description = "Now awaiting verification", body = SuratKeluar),
        (status = 400, description = "Requirements incomplete or wrong status", body = crate::ErrorResponse)
    )
)]
pub async fn ajukan_verifikasi(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<AjukanVerifikasiRequest>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    let surat = state
        .ajukan_verifikasi(body.surat_id, claims.user_id()?, &claims.email)
        .await?;
    Ok(HttpResponse::Ok().json(surat))
}

/// Staff work queue across all submissions.
#[utoipa::path(
    get,
    path = "/api/admin/surat",
    tag = "Admin",
    params(ListSuratQuery),
    responses(
        (status = 200, description = "Submissions", body = [super::models::PengajuanRingkas]),
        (status = 403, description = "Officers only", body = crate::ErrorResponse)
    )
)]
pub async fn list_surat_admin(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<ListSuratQuery>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    claims.require_petugas()?;
    let daftar = state.list_surat(query.status).await?;
    Ok(HttpResponse::Ok().json(daftar))
}

/// Submission detail for the verification screen.
#[utoipa::path(
    get,
    path = "/api/admin/verifikasi/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Submission detail", body = SuratKeluar),
        (status = 403, description = "Officers only", body = crate::ErrorResponse)
    )
)]
pub async fn get_verifikasi(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    claims.require_petugas()?;
    let surat = state
        .get_surat(path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("pengajuan tidak ditemukan"))?;
    Ok(HttpResponse::Ok().json(surat))
}

/// Staff decision on a submission awaiting verification.
#[utoipa::path(
    put,
    path = "/api/admin/verifikasi/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Submission id")),
    request_body = KeputusanRequest,
    responses(
        (status = 200, description = "Decision applied", body = SuratKeluar),
        (status = 400, description = "Illegal transition or missing note", body = crate::ErrorResponse),
        (status = 403, description = "Officers only", body = crate::ErrorResponse)
    )
)]
pub async fn put_verifikasi(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<KeputusanRequest>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    claims.require_petugas()?;
    let surat = state
        .verifikasi_staf(
            path.into_inner(),
            claims.user_id()?,
            &claims.email,
            body.keputusan,
            body.catatan.as_deref(),
        )
        .await?;
    Ok(HttpResponse::Ok().json(surat))
}

/// Approval queue for the head of village: verified submissions only.
#[utoipa::path(
    get,
    path = "/api/kepala-desa/persetujuan",
    tag = "Kepala Desa",
    responses(
        (status = 200, description = "Verified submissions", body = [super::models::PengajuanRingkas]),
        (status = 403, description = "Head of village only", body = crate::ErrorResponse)
    )
)]
pub async fn list_persetujuan(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    claims.require_kepala_desa()?;
    let daftar = state.list_surat(Some(StatusSurat::Diverifikasi)).await?;
    Ok(HttpResponse::Ok().json(daftar))
}

/// Submission detail for the approval screen.
#[utoipa::path(
    get,
    path = "/api/kepala-desa/persetujuan/{id}",
    tag = "Kepala Desa",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Submission detail", body = SuratKeluar),
        (status = 403, description = "Head of village only", body = crate::ErrorResponse)
    )
)]
pub async fn get_persetujuan(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    claims.require_kepala_desa()?;
    let surat = state
        .get_surat(path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("pengajuan tidak ditemukan"))?;
    Ok(HttpResponse::Ok().json(surat))
}

/// Final decision by the head of village.
#[utoipa::path(
    put,
    path = "/api/kepala-desa/persetujuan/{id}",
    tag = "Kepala Desa",
    params(("id" = Uuid, Path, description = "Submission id")),
    request_body = KeputusanRequest,
    responses(
        (status = 200, description = "Decision applied", body = SuratKeluar),
        (status = 400, description = "Illegal transition or missing note", body = crate::ErrorResponse),
        (status = 403, description = "Head of village only", body = crate::ErrorResponse)
    )
)]
pub async fn put_persetujuan(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<KeputusanRequest>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    claims.require_kepala_desa()?;
    let surat = state
        .persetujuan_kades(
            path.into_inner(),
            claims.user_id()?,
            &claims.email,
            body.keputusan,
            body.catatan.as_deref(),
        )
        .await?;
    Ok(HttpResponse::Ok().json(surat))
}

async fn ambil_gambar(state: &AppState, path: Option<&str>, label: &str) -> Option<Vec<u8>> {
    let path = path?;
    match state.storage.fetch_bytes(path).await {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::warn!("gagal mengambil {label} dari penyimpanan, dilewati: {e}");
            None
        }
    }
}

/// Download the rendered letter. Allowed once the head of village has
/// approved; the first successful download marks the letter as issued.
#[utoipa::path(
    get,
    path = "/api/surat/unduh/{id}",
    tag = "Surat",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses(
        (status = 200, description = "The letter as PDF", body = Vec<u8>, content_type = "application/pdf"),
        (status = 400, description = "Not yet approved", body = crate::ErrorResponse),
        (status = 403, description = "Not the owner", body = crate::ErrorResponse),
        (status = 500, description = "Issuer data incomplete or render failure", body = crate::ErrorResponse)
    )
)]
pub async fn unduh(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    let user_id = claims.user_id()?;
    let surat_id = path.into_inner();

    let data = state.get_surat_untuk_render(surat_id).await?;
    if data.surat.pemohon_id != user_id && !claims.role.is_petugas() {
        return Err(AppError::forbidden("pengajuan ini bukan milik Anda"));
    }
    if !data.surat.status.bisa_dirender() {
        return Err(AppError::InvalidTransition(format!(
            "dokumen belum dapat diunduh pada status {}",
            data.surat.status.nama()
        )));
    }

    let pengaturan = state.get_pengaturan().await?.ok_or_else(|| {
        AppError::IncompleteIssuerData("pengaturan desa belum diisi".to_string())
    })?;
    let pengesah = data.pengesah.as_ref().ok_or_else(|| {
        AppError::IncompleteIssuerData("pengesah surat belum tercatat".to_string())
    })?;

    let konteks =
        renderer::context::bangun_konteks(&data.surat, &data.pemohon, Some(pengesah), &pengaturan);
    let isi_html = renderer::context::ganti_placeholder(&data.template.template_html, &konteks);

    let dokumen = renderer::DokumenSurat {
        judul: data.template.nama_surat.clone(),
        nomor: data
            .surat
            .nomor_surat
            .clone()
            .unwrap_or_else(|| renderer::context::NOMOR_SURAT_KOSONG.to_string()),
        isi: renderer::layout::pecah_blok(&isi_html),
        kop: renderer::KopSurat {
            nama_desa: pengaturan.nama_desa.clone(),
            kecamatan: pengaturan.kecamatan.clone(),
            kabupaten: pengaturan.kabupaten.clone(),
            provinsi: pengaturan.provinsi.clone(),
            alamat_kantor: pengaturan.alamat_kantor.clone(),
            telepon: pengaturan.telepon.clone(),
            email: pengaturan.email.clone(),
            logo: ambil_gambar(&state, pengaturan.url_logo.as_deref(), "logo desa").await,
        },
        tanda_tangan: renderer::BlokTandaTangan {
            tempat: pengaturan.nama_desa.clone(),
            tanggal: renderer::context::format_tanggal_indonesia(
                data.surat.tanggal_selesai.unwrap_or_else(chrono::Utc::now),
            ),
            jabatan: format!("Kepala {}", pengaturan.nama_desa),
            nama: pengesah.nama_lengkap.clone(),
            tanda_tangan: ambil_gambar(
                &state,
                pengesah.url_tanda_tangan.as_deref(),
                "tanda tangan pengesah",
            )
            .await,
            stempel: ambil_gambar(&state, pengesah.url_stempel.as_deref(), "stempel desa").await,
        },
    };

    let pdf = renderer::pdf::render(&dokumen)?;

    // First successful download flips the status to DITERBITKAN; later
    // downloads find it already issued and change nothing.
    if data.surat.status == StatusSurat::Disetujui {
        state.terbitkan(surat_id, user_id, &claims.email).await?;
    }

    let nama_file = renderer::nama_file_unduhan(&data.template.kode_surat, &data.pemohon.nik);
    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{nama_file}\""),
        ))
        .body(pdf))
}
