use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;

/// One field of the dynamic submission form. Order is significant: the UI
/// renders fields in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FormField {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// A reusable letter definition. Never mutated by the submission workflow;
/// submissions reference it by id.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct TemplateSurat {
    pub id: Uuid,
    pub kode_surat: String,
    pub nama_surat: String,
    pub deskripsi: String,
    /// Ordered list of required attachment labels.
    pub persyaratan: Vec<String>,
    /// HTML body containing `{{placeholder}}` tokens.
    pub template_html: String,
    #[schema(value_type = Vec<FormField>)]
    pub form_schema: Json<Vec<FormField>>,
    pub is_active: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTemplateRequest {
    pub kode_surat: String,
    pub nama_surat: String,
    #[serde(default)]
    pub deskripsi: String,
    #[serde(default)]
    pub persyaratan: Vec<String>,
    pub template_html: String,
    #[serde(default)]
    pub form_schema: Vec<FormField>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTemplateRequest {
    pub nama_surat: Option<String>,
    pub deskripsi: Option<String>,
    pub persyaratan: Option<Vec<String>>,
    pub template_html: Option<String>,
    pub form_schema: Option<Vec<FormField>>,
    pub is_active: Option<bool>,
}
