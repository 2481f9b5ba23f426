use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Singleton row; the application always upserts against
/// [`crate::db::PENGATURAN_DESA_ID`], so at most one instance exists and
/// concurrent saves cannot race on a freshly queried id.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct PengaturanDesa {
    pub id: Uuid,
    pub nama_desa: String,
    pub kecamatan: String,
    pub kabupaten: String,
    pub provinsi: String,
    pub alamat_kantor: String,
    pub telepon: Option<String>,
    pub email: Option<String>,
    pub url_logo: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SimpanPengaturanRequest {
    pub nama_desa: String,
    pub kecamatan: String,
    pub kabupaten: String,
    pub provinsi: String,
    pub alamat_kantor: String,
    pub telepon: Option<String>,
    pub email: Option<String>,
    pub url_logo: Option<String>,
}
