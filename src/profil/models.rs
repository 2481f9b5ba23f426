use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Profil {
    pub user_id: Uuid,
    pub nama_lengkap: String,
    pub nik: String,
    pub telepon: String,
    pub alamat: String,
    pub url_tanda_tangan: Option<String>,
    pub url_stempel: Option<String>,
    pub url_foto: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfilRequest {
    pub nama_lengkap: Option<String>,
    pub nik: Option<String>,
    pub telepon: Option<String>,
    pub alamat: Option<String>,
}

/// Which image slot an upload is for. The first three live on the
/// uploader's profile row; the village logo is shared and its path is
/// stored in the settings instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JenisAset {
    TandaTangan,
    Stempel,
    Foto,
    Logo,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadAsetRequest {
    pub jenis: JenisAset,
    pub file_name: String,
}
