//! Template administration endpoints, officers only.

use actix_web::{web, HttpRequest, HttpResponse};
use uuid::Uuid;

use super::models::{CreateTemplateRequest, TemplateSurat, UpdateTemplateRequest};
use crate::auth::middleware::validate_request_token;
use crate::db::AppState;
use crate::error::AppError;

fn validasi_template(kode: &str, nama: &str, html: &str) -> Result<(), AppError> {
    if kode.trim().is_empty() || nama.trim().is_empty() {
        return Err(AppError::validation("kode_surat dan nama_surat wajib diisi"));
    }
    if html.trim().is_empty() {
        return Err(AppError::validation("template_html wajib diisi"));
    }
    Ok(())
}

/// Create a letter template.
#[utoipa::path(
    post,
    path = "/api/admin/templates",
    tag = "Admin",
    request_body = CreateTemplateRequest,
    responses(
        (status = 201, description = "Template created", body = TemplateSurat),
        (status = 403, description = "Officers only", body = crate::ErrorResponse),
        (status = 409, description = "Duplicate kode_surat", body = crate::ErrorResponse)
    )
)]
pub async fn create_template(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<CreateTemplateRequest>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    claims.require_petugas()?;
    validasi_template(&body.kode_surat, &body.nama_surat, &body.template_html)?;

    let template = state.create_template(&body).await?;
    log::info!(
        "template {} ({}) dibuat oleh {}",
        template.kode_surat,
        template.id,
        claims.email
    );
    Ok(HttpResponse::Created().json(template))
}

/// All templates, active or not.
#[utoipa::path(
    get,
    path = "/api/admin/templates",
    tag = "Admin",
    responses(
        (status = 200, description = "Templates", body = [TemplateSurat]),
        (status = 403, description = "Officers only", body = crate::ErrorResponse)
    )
)]
pub async fn list_templates(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    claims.require_petugas()?;
    let templates = state.list_templates(false).await?;
    Ok(HttpResponse::Ok().json(templates))
}

/// One template by id.
#[utoipa::path(
    get,
    path = "/api/admin/templates/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Template id")),
    responses(
        (status = 200, description = "Template", body = TemplateSurat),
        (status = 404, description = "Not found", body = crate::ErrorResponse)
    )
)]
pub async fn get_template(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    claims.require_petugas()?;
    let template = state
        .get_template(path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("template tidak ditemukan"))?;
    Ok(HttpResponse::Ok().json(template))
}

/// Partial update; absent fields keep their value.
#[utoipa::path(
    put,
    path = "/api/admin/templates/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Template id")),
    request_body = UpdateTemplateRequest,
    responses(
        (status = 200, description = "Template updated", body = TemplateSurat),
        (status = 404, description = "Not found", body = crate::ErrorResponse)
    )
)]
pub async fn update_template(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateTemplateRequest>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    claims.require_petugas()?;
    let template = state.update_template(path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(template))
}

/// Delete a template. Refused with 409 while any submission references it;
/// deactivate instead to retire a template with history.
#[utoipa::path(
    delete,
    path = "/api/admin/templates/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Template id")),
    responses(
        (status = 204, description = "Template deleted"),
        (status = 404, description = "Not found", body = crate::ErrorResponse),
        (status = 409, description = "Still referenced by submissions", body = crate::ErrorResponse)
    )
)]
pub async fn delete_template(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let claims = validate_request_token(&req)?;
    claims.require_petugas()?;
    let id = path.into_inner();
    state.delete_template(id).await?;
    log::info!("template {id} dihapus oleh {}", claims.email);
    Ok(HttpResponse::NoContent().finish())
}
