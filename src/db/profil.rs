//! Profile queries with a read-through cache.
//!
//! The cache replaces the session-carried profile denormalization of older
//! designs: every write path invalidates the entry, so stale
//! signature/stamp references cannot outlive a profile update.

use super::AppState;
use crate::error::AppError;
use crate::profil::models::{JenisAset, Profil, UpdateProfilRequest};
use uuid::Uuid;

const PROFIL_COLUMNS: &str = "user_id, nama_lengkap, nik, telepon, alamat, \
     url_tanda_tangan, url_stempel, url_foto";

impl AppState {
    pub async fn get_profil(&self, user_id: Uuid) -> Result<Option<Profil>, AppError> {
        if let Some(hit) = self.profil_cache.get(&user_id).await {
            return Ok(Some(hit));
        }

        let profil = sqlx::query_as::<_, Profil>(&format!(
            "SELECT {PROFIL_COLUMNS} FROM profil WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(ref p) = profil {
            self.profil_cache.insert(user_id, p.clone()).await;
        }
        Ok(profil)
    }

    pub async fn update_profil(
        &self,
        user_id: Uuid,
        req: &UpdateProfilRequest,
    ) -> Result<Profil, AppError> {
        let profil = sqlx::query_as::<_, Profil>(&format!(
            r#"
            UPDATE profil SET
                nama_lengkap = COALESCE($2, nama_lengkap),
                nik = COALESCE($3, nik),
                telepon = COALESCE($4, telepon),
                alamat = COALESCE($5, alamat)
            WHERE user_id = $1
            RETURNING {PROFIL_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(req.nama_lengkap.as_deref())
        .bind(req.nik.as_deref())
        .bind(req.telepon.as_deref())
        .bind(req.alamat.as_deref())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("profil tidak ditemukan"))?;

        self.profil_cache.invalidate(&user_id).await;
        Ok(profil)
    }

    /// Store the storage path of an uploaded profile image.
    pub async fn set_aset_profil(
        &self,
        user_id: Uuid,
        jenis: JenisAset,
        file_path: &str,
    ) -> Result<(), AppError> {
        let kolom = match jenis {
            JenisAset::TandaTangan => "url_tanda_tangan",
            JenisAset::Stempel => "url_stempel",
            JenisAset::Foto => "url_foto",
            JenisAset::Logo => {
                return Err(AppError::validation(
                    "logo desa disimpan di pengaturan desa, bukan di profil",
                ))
            }
        };

        let result = sqlx::query(&format!(
            "UPDATE profil SET {kolom} = $2 WHERE user_id = $1"
        ))
        .bind(user_id)
        .bind(file_path)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("profil tidak ditemukan"));
        }

        self.profil_cache.invalidate(&user_id).await;
        Ok(())
    }
}
