//! Letter template queries.

use super::AppState;
use crate::error::AppError;
use crate::template::models::{CreateTemplateRequest, TemplateSurat, UpdateTemplateRequest};
use sqlx::types::Json;
use uuid::Uuid;

const TEMPLATE_COLUMNS: &str = "id, kode_surat, nama_surat, deskripsi, persyaratan, \
     template_html, form_schema, is_active";

impl AppState {
    /// Fails with `Conflict` when `kode_surat` already exists (unique
    /// constraint, mapped in the error module).
    pub async fn create_template(
        &self,
        req: &CreateTemplateRequest,
    ) -> Result<TemplateSurat, AppError> {
        let template = sqlx::query_as::<_, TemplateSurat>(&format!(
            r#"
            INSERT INTO template_surat
                (kode_surat, nama_surat, deskripsi, persyaratan, template_html, form_schema)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TEMPLATE_COLUMNS}
            "#
        ))
        .bind(&req.kode_surat)
        .bind(&req.nama_surat)
        .bind(&req.deskripsi)
        .bind(&req.persyaratan)
        .bind(&req.template_html)
        .bind(Json(&req.form_schema))
        .fetch_one(&self.pool)
        .await?;
        Ok(template)
    }

    pub async fn get_template(&self, id: Uuid) -> Result<Option<TemplateSurat>, AppError> {
        let template = sqlx::query_as::<_, TemplateSurat>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM template_surat WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(template)
    }

    pub async fn get_template_by_kode(
        &self,
        kode_surat: &str,
    ) -> Result<Option<TemplateSurat>, AppError> {
        let template = sqlx::query_as::<_, TemplateSurat>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM template_surat WHERE kode_surat = $1"
        ))
        .bind(kode_surat)
        .fetch_optional(&self.pool)
        .await?;
        Ok(template)
    }

    pub async fn list_templates(&self, active_only: bool) -> Result<Vec<TemplateSurat>, AppError> {
        let templates = sqlx::query_as::<_, TemplateSurat>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM template_surat \
             WHERE is_active OR NOT $1 ORDER BY nama_surat"
        ))
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(templates)
    }

    pub async fn update_template(
        &self,
        id: Uuid,
        req: &UpdateTemplateRequest,
    ) -> Result<TemplateSurat, AppError> {
        let template = sqlx::query_as::<_, TemplateSurat>(&format!(
            r#"
            UPDATE template_surat SET
                nama_surat = COALESCE($2, nama_surat),
                deskripsi = COALESCE($3, deskripsi),
                persyaratan = COALESCE($4, persyaratan),
                template_html = COALESCE($5, template_html),
                form_schema = COALESCE($6, form_schema),
                is_active = COALESCE($7, is_active)
            WHERE id = $1
            RETURNING {TEMPLATE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.nama_surat.as_deref())
        .bind(req.deskripsi.as_deref())
        .bind(req.persyaratan.as_deref())
        .bind(req.template_html.as_deref())
        .bind(req.form_schema.as_ref().map(Json))
        .bind(req.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("template tidak ditemukan"))?;
        Ok(template)
    }

    /// Hard delete. The RESTRICT foreign key on `surat_keluar.template_id`
    /// makes this fail (mapped to `Conflict`) while any submission still
    /// references the template, without a separate existence query.
    pub async fn delete_template(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM template_surat WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("template tidak ditemukan"));
        }
        Ok(())
    }
}
