//! Submission queries, transitions and the activity log.
//!
//! Every mutation runs in one transaction: lock the submission row with
//! `SELECT ... FOR UPDATE`, check the pure transition rule from
//! `surat::status`, apply the update and append the log entry. Concurrent
//! decisions on the same submission therefore serialize on the row lock and
//! the loser fails the rule check instead of clobbering the winner.

use super::AppState;
use crate::error::AppError;
use crate::profil::models::Profil;
use crate::surat::berkas;
use crate::surat::models::{
    BerkasPersyaratan, CreatePengajuanRequest, LogAktivitas, PengajuanRingkas, SuratKeluar,
};
use crate::surat::status::{AksiSurat, Keputusan, StatusSurat};
use crate::template::models::TemplateSurat;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgConnection;
use uuid::Uuid;

const SURAT_COLUMNS: &str = "id, template_id, pemohon_id, status, form_data, \
     file_persyaratan, created_at, verifikator_id, pengesah_id, catatan_revisi, \
     tanggal_selesai, nomor_surat";

/// Everything the document renderer needs about one submission.
pub struct SuratUntukRender {
    pub surat: SuratKeluar,
    pub template: TemplateSurat,
    pub pemohon: Profil,
    pub pengesah: Option<Profil>,
}

async fn kunci_surat(conn: &mut PgConnection, surat_id: Uuid) -> Result<SuratKeluar, AppError> {
    let surat = sqlx::query_as::<_, SuratKeluar>(&format!(
        "SELECT {SURAT_COLUMNS} FROM surat_keluar WHERE id = $1 FOR UPDATE"
    ))
    .bind(surat_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::not_found("pengajuan tidak ditemukan"))?;
    Ok(surat)
}

async fn ambil_template(
    conn: &mut PgConnection,
    template_id: Uuid,
) -> Result<TemplateSurat, AppError> {
    let template = sqlx::query_as::<_, TemplateSurat>(
        "SELECT id, kode_surat, nama_surat, deskripsi, persyaratan, template_html, \
         form_schema, is_active FROM template_surat WHERE id = $1",
    )
    .bind(template_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::not_found("template tidak ditemukan"))?;
    Ok(template)
}

async fn catat_log(
    conn: &mut PgConnection,
    surat_id: Uuid,
    aktor_id: Uuid,
    aksi: &str,
    deskripsi: &str,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO log_aktivitas (surat_id, aktor_id, aksi, deskripsi) VALUES ($1, $2, $3, $4)",
    )
    .bind(surat_id)
    .bind(aktor_id)
    .bind(aksi)
    .bind(deskripsi)
    .execute(conn)
    .await?;
    Ok(())
}

fn transisi_atau_tolak(status: StatusSurat, aksi: AksiSurat) -> Result<StatusSurat, AppError> {
    status.transisi(aksi).ok_or_else(|| {
        AppError::InvalidTransition(format!(
            "{} tidak diizinkan dari status {}",
            aksi.nama_log(),
            status.nama()
        ))
    })
}

impl AppState {
    /// Start a new submission against an active template.
    pub async fn create_pengajuan(
        &self,
        pemohon_id: Uuid,
        pemohon_email: &str,
        req: &CreatePengajuanRequest,
    ) -> Result<SuratKeluar, AppError> {
        let mut tx = self.pool.begin().await?;

        let template = ambil_template(&mut tx, req.template_id).await?;
        if !template.is_active {
            return Err(AppError::validation(
                "template ini sedang tidak menerima pengajuan",
            ));
        }

        let surat = sqlx::query_as::<_, SuratKeluar>(&format!(
            r#"
            INSERT INTO surat_keluar (template_id, pemohon_id, status, form_data, file_persyaratan)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SURAT_COLUMNS}
            "#
        ))
        .bind(template.id)
        .bind(pemohon_id)
        .bind(StatusSurat::MengisiBerkas)
        .bind(Json(&req.form_data))
        .bind(Json(Vec::<BerkasPersyaratan>::new()))
        .fetch_one(&mut *tx)
        .await?;

        catat_log(
            &mut tx,
            surat.id,
            pemohon_id,
            "PENGAJUAN_DIBUAT",
            &format!(
                "Pengajuan {} dibuat oleh {}",
                template.nama_surat, pemohon_email
            ),
        )
        .await?;

        tx.commit().await?;
        Ok(surat)
    }

    pub async fn get_surat(&self, surat_id: Uuid) -> Result<Option<SuratKeluar>, AppError> {
        let surat = sqlx::query_as::<_, SuratKeluar>(&format!(
            "SELECT {SURAT_COLUMNS} FROM surat_keluar WHERE id = $1"
        ))
        .bind(surat_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(surat)
    }

    pub async fn list_pengajuan_warga(
        &self,
        pemohon_id: Uuid,
    ) -> Result<Vec<PengajuanRingkas>, AppError> {
        let daftar = sqlx::query_as::<_, PengajuanRingkas>(
            r#"
            SELECT s.id, s.status, s.created_at, t.nama_surat, t.kode_surat
            FROM surat_keluar s
            JOIN template_surat t ON t.id = s.template_id
            WHERE s.pemohon_id = $1
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(pemohon_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(daftar)
    }

    /// All submissions, optionally narrowed to one status. Used by the staff
    /// and head-of-village work queues.
    pub async fn list_surat(
        &self,
        status: Option<StatusSurat>,
    ) -> Result<Vec<PengajuanRingkas>, AppError> {
        let daftar = sqlx::query_as::<_, PengajuanRingkas>(
            r#"
            SELECT s.id, s.status, s.created_at, t.nama_surat, t.kode_surat
            FROM surat_keluar s
            JOIN template_surat t ON t.id = s.template_id
            WHERE $1::status_surat IS NULL OR s.status = $1
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(daftar)
    }

    /// Record (or replace) an uploaded requirement file while the submission
    /// is still being assembled.
    pub async fn catat_berkas(
        &self,
        surat_id: Uuid,
        pemohon_id: Uuid,
        persyaratan: &str,
        file_path: &str,
    ) -> Result<SuratKeluar, AppError> {
        let mut tx = self.pool.begin().await?;

        let surat = kunci_surat(&mut tx, surat_id).await?;
        if surat.pemohon_id != pemohon_id {
            return Err(AppError::forbidden("pengajuan ini bukan milik Anda"));
        }
        if !surat.status.bisa_ubah_berkas() {
            return Err(AppError::InvalidTransition(format!(
                "berkas tidak dapat diubah pada status {}",
                surat.status.nama()
            )));
        }

        let template = ambil_template(&mut tx, surat.template_id).await?;
        let mut daftar = surat.file_persyaratan.0.clone();
        berkas::catat(&mut daftar, &template.persyaratan, persyaratan, file_path)?;

        let surat = sqlx::query_as::<_, SuratKeluar>(&format!(
            "UPDATE surat_keluar SET file_persyaratan = $2 WHERE id = $1 RETURNING {SURAT_COLUMNS}"
        ))
        .bind(surat_id)
        .bind(Json(&daftar))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(surat)
    }

    /// Hand the submission to staff once every requirement has a file.
    pub async fn ajukan_verifikasi(
        &self,
        surat_id: Uuid,
        pemohon_id: Uuid,
        pemohon_email: &str,
    ) -> Result<SuratKeluar, AppError> {
        let mut tx = self.pool.begin().await?;

        let surat = kunci_surat(&mut tx, surat_id).await?;
        if surat.pemohon_id != pemohon_id {
            return Err(AppError::forbidden("pengajuan ini bukan milik Anda"));
        }

        let aksi = AksiSurat::AjukanVerifikasi;
        let tujuan = transisi_atau_tolak(surat.status, aksi)?;

        let template = ambil_template(&mut tx, surat.template_id).await?;
        if !berkas::lengkap(&surat.file_persyaratan.0, &template.persyaratan) {
            let kurang: Vec<&str> = template
                .persyaratan
                .iter()
                .filter(|p| !surat.file_persyaratan.0.iter().any(|b| &b.persyaratan == *p))
                .map(|p| p.as_str())
                .collect();
            return Err(AppError::validation(format!(
                "berkas persyaratan belum lengkap: {}",
                kurang.join(", ")
            )));
        }

        let surat = sqlx::query_as::<_, SuratKeluar>(&format!(
            "UPDATE surat_keluar SET status = $2 WHERE id = $1 RETURNING {SURAT_COLUMNS}"
        ))
        .bind(surat_id)
        .bind(tujuan)
        .fetch_one(&mut *tx)
        .await?;

        catat_log(
            &mut tx,
            surat_id,
            pemohon_id,
            aksi.nama_log(),
            &format!("Berkas lengkap, diajukan untuk verifikasi oleh {pemohon_email}"),
        )
        .await?;

        tx.commit().await?;
        Ok(surat)
    }

    /// Staff decision on a submission awaiting verification. Rejection
    /// requires a note for the applicant.
    pub async fn verifikasi_staf(
        &self,
        surat_id: Uuid,
        aktor_id: Uuid,
        aktor_email: &str,
        keputusan: Keputusan,
        catatan: Option<&str>,
    ) -> Result<SuratKeluar, AppError> {
        let catatan = catatan_keputusan(keputusan, catatan)?;
        let mut tx = self.pool.begin().await?;

        let surat = kunci_surat(&mut tx, surat_id).await?;
        let aksi = AksiSurat::VerifikasiStaf(keputusan);
        let tujuan = transisi_atau_tolak(surat.status, aksi)?;

        let surat = sqlx::query_as::<_, SuratKeluar>(&format!(
            r#"
            UPDATE surat_keluar
            SET status = $2, verifikator_id = $3, catatan_revisi = $4
            WHERE id = $1
            RETURNING {SURAT_COLUMNS}
            "#
        ))
        .bind(surat_id)
        .bind(tujuan)
        .bind(aktor_id)
        .bind(catatan.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        catat_log(
            &mut tx,
            surat_id,
            aktor_id,
            aksi.nama_log(),
            &deskripsi_keputusan("Verifikasi", aktor_email, keputusan, catatan.as_deref()),
        )
        .await?;

        tx.commit().await?;
        Ok(surat)
    }

    /// Head-of-village decision on a verified submission. Approval stamps
    /// the completion date; rejection requires a note.
    pub async fn persetujuan_kades(
        &self,
        surat_id: Uuid,
        aktor_id: Uuid,
        aktor_email: &str,
        keputusan: Keputusan,
        catatan: Option<&str>,
    ) -> Result<SuratKeluar, AppError> {
        let catatan = catatan_keputusan(keputusan, catatan)?;
        let mut tx = self.pool.begin().await?;

        let surat = kunci_surat(&mut tx, surat_id).await?;
        let aksi = AksiSurat::PersetujuanKades(keputusan);
        let tujuan = transisi_atau_tolak(surat.status, aksi)?;

        let tanggal_selesai = match keputusan {
            Keputusan::Setuju => Some(Utc::now()),
            Keputusan::Tolak => None,
        };

        let surat = sqlx::query_as::<_, SuratKeluar>(&format!(
            r#"
            UPDATE surat_keluar
            SET status = $2, pengesah_id = $3, catatan_revisi = $4,
                tanggal_selesai = $5
            WHERE id = $1
            RETURNING {SURAT_COLUMNS}
            "#
        ))
        .bind(surat_id)
        .bind(tujuan)
        .bind(aktor_id)
        .bind(catatan.as_deref())
        .bind(tanggal_selesai)
        .fetch_one(&mut *tx)
        .await?;

        catat_log(
            &mut tx,
            surat_id,
            aktor_id,
            aksi.nama_log(),
            &deskripsi_keputusan("Persetujuan", aktor_email, keputusan, catatan.as_deref()),
        )
        .await?;

        tx.commit().await?;
        Ok(surat)
    }

    /// Mark an approved submission as issued. Called after the first
    /// successful download; a no-op if another download won the race.
    pub async fn terbitkan(
        &self,
        surat_id: Uuid,
        aktor_id: Uuid,
        aktor_email: &str,
    ) -> Result<SuratKeluar, AppError> {
        let mut tx = self.pool.begin().await?;

        let surat = kunci_surat(&mut tx, surat_id).await?;
        if surat.status == StatusSurat::Diterbitkan {
            tx.commit().await?;
            return Ok(surat);
        }

        let aksi = AksiSurat::Terbitkan;
        let tujuan = transisi_atau_tolak(surat.status, aksi)?;

        let surat = sqlx::query_as::<_, SuratKeluar>(&format!(
            "UPDATE surat_keluar SET status = $2 WHERE id = $1 RETURNING {SURAT_COLUMNS}"
        ))
        .bind(surat_id)
        .bind(tujuan)
        .fetch_one(&mut *tx)
        .await?;

        catat_log(
            &mut tx,
            surat_id,
            aktor_id,
            aksi.nama_log(),
            &format!("Dokumen diunduh pertama kali oleh {aktor_email}, surat diterbitkan"),
        )
        .await?;

        tx.commit().await?;
        Ok(surat)
    }

    /// Load a submission plus everything the renderer needs: the template,
    /// the applicant's profile and (when set) the approver's profile.
    pub async fn get_surat_untuk_render(
        &self,
        surat_id: Uuid,
    ) -> Result<SuratUntukRender, AppError> {
        let surat = self
            .get_surat(surat_id)
            .await?
            .ok_or_else(|| AppError::not_found("pengajuan tidak ditemukan"))?;

        let template = self
            .get_template(surat.template_id)
            .await?
            .ok_or_else(|| AppError::not_found("template tidak ditemukan"))?;

        let pemohon = self
            .get_profil(surat.pemohon_id)
            .await?
            .ok_or_else(|| AppError::not_found("profil pemohon tidak ditemukan"))?;

        let pengesah = match surat.pengesah_id {
            Some(id) => self.get_profil(id).await?,
            None => None,
        };

        Ok(SuratUntukRender {
            surat,
            template,
            pemohon,
            pengesah,
        })
    }

    pub async fn list_log(&self, surat_id: Uuid) -> Result<Vec<LogAktivitas>, AppError> {
        let log = sqlx::query_as::<_, LogAktivitas>(
            "SELECT id, surat_id, aktor_id, aksi, deskripsi, timestamp \
             FROM log_aktivitas WHERE surat_id = $1 ORDER BY timestamp",
        )
        .bind(surat_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(log)
    }
}

fn catatan_keputusan(
    keputusan: Keputusan,
    catatan: Option<&str>,
) -> Result<Option<String>, AppError> {
    match keputusan {
        Keputusan::Tolak => match catatan.map(str::trim) {
            Some(c) if !c.is_empty() => Ok(Some(c.to_string())),
            _ => Err(AppError::validation(
                "catatan wajib diisi saat menolak pengajuan",
            )),
        },
        Keputusan::Setuju => Ok(catatan.map(str::trim).filter(|c| !c.is_empty()).map(String::from)),
    }
}

fn deskripsi_keputusan(
    tahap: &str,
    aktor_email: &str,
    keputusan: Keputusan,
    catatan: Option<&str>,
) -> String {
    let hasil = match keputusan {
        Keputusan::Setuju => "disetujui",
        Keputusan::Tolak => "ditolak",
    };
    match catatan {
        Some(c) => format!("{tahap} {hasil} oleh {aktor_email}: {c}"),
        None => format!("{tahap} {hasil} oleh {aktor_email}"),
    }
}
