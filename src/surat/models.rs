use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;

use super::status::{Keputusan, StatusSurat};

/// One uploaded file bound to the requirement it satisfies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BerkasPersyaratan {
    pub persyaratan: String,
    pub file_path: String,
}

/// A resident's letter request, tracked through its lifecycle.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct SuratKeluar {
    pub id: Uuid,
    pub template_id: Uuid,
    pub pemohon_id: Uuid,
    pub status: StatusSurat,
    #[schema(value_type = Object)]
    pub form_data: Json<Value>,
    #[schema(value_type = Vec<BerkasPersyaratan>)]
    pub file_persyaratan: Json<Vec<BerkasPersyaratan>>,
    pub created_at: DateTime<Utc>,
    pub verifikator_id: Option<Uuid>,
    pub pengesah_id: Option<Uuid>,
    pub catatan_revisi: Option<String>,
    pub tanggal_selesai: Option<DateTime<Utc>>,
    pub nomor_surat: Option<String>,
}

/// Compact row for submission listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct PengajuanRingkas {
    pub id: Uuid,
    pub status: StatusSurat,
    pub created_at: DateTime<Utc>,
    pub nama_surat: String,
    pub kode_surat: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct LogAktivitas {
    pub id: Uuid,
    pub surat_id: Uuid,
    pub aktor_id: Uuid,
    pub aksi: String,
    pub deskripsi: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePengajuanRequest {
    pub template_id: Uuid,
    #[schema(value_type = Object)]
    pub form_data: Value,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadUrlRequest {
    pub surat_id: Uuid,
    pub persyaratan: String,
    pub file_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CatatBerkasRequest {
    pub surat_id: Uuid,
    pub persyaratan: String,
    pub file_path: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AjukanVerifikasiRequest {
    pub surat_id: Uuid,
}

/// Body for the staff verification and head approval endpoints.
#[derive(Debug, Deserialize, ToSchema)]
pub struct KeputusanRequest {
    pub keputusan: Keputusan,
    pub catatan: Option<String>,
}

/// Attachment listing entry with a signed, time-limited view URL.
#[derive(Debug, Serialize, ToSchema)]
pub struct BerkasDenganUrl {
    pub persyaratan: String,
    pub file_path: String,
    pub view_url: String,
}
