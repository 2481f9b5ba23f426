//! Village settings singleton.

use super::{AppState, PENGATURAN_DESA_ID};
use crate::error::AppError;
use crate::pengaturan::models::{PengaturanDesa, SimpanPengaturanRequest};

const PENGATURAN_COLUMNS: &str = "id, nama_desa, kecamatan, kabupaten, provinsi, \
     alamat_kantor, telepon, email, url_logo";

impl AppState {
    pub async fn get_pengaturan(&self) -> Result<Option<PengaturanDesa>, AppError> {
        let pengaturan = sqlx::query_as::<_, PengaturanDesa>(&format!(
            "SELECT {PENGATURAN_COLUMNS} FROM pengaturan_desa WHERE id = $1"
        ))
        .bind(PENGATURAN_DESA_ID)
        .fetch_optional(&self.pool)
        .await?;
        Ok(pengaturan)
    }

    /// Upsert keyed by the constant singleton id; concurrent saves both land
    /// on the same row instead of racing a find-then-insert.
    pub async fn simpan_pengaturan(
        &self,
        req: &SimpanPengaturanRequest,
    ) -> Result<PengaturanDesa, AppError> {
        let pengaturan = sqlx::query_as::<_, PengaturanDesa>(&format!(
            r#"
            INSERT INTO pengaturan_desa
                (id, nama_desa, kecamatan, kabupaten, provinsi, alamat_kantor,
                 telepon, email, url_logo)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                nama_desa = EXCLUDED.nama_desa,
                kecamatan = EXCLUDED.kecamatan,
                kabupaten = EXCLUDED.kabupaten,
                provinsi = EXCLUDED.provinsi,
                alamat_kantor = EXCLUDED.alamat_kantor,
                telepon = EXCLUDED.telepon,
                email = EXCLUDED.email,
                url_logo = EXCLUDED.url_logo
            RETURNING {PENGATURAN_COLUMNS}
            "#
        ))
        .bind(PENGATURAN_DESA_ID)
        .bind(&req.nama_desa)
        .bind(&req.kecamatan)
        .bind(&req.kabupaten)
        .bind(&req.provinsi)
        .bind(&req.alamat_kantor)
        .bind(req.telepon.as_deref())
        .bind(req.email.as_deref())
        .bind(req.url_logo.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(pengaturan)
    }
}
