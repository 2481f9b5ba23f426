//! Attachment tracking for a submission.
//!
//! Each uploaded file is stored as a `{persyaratan, file_path}` pair so a
//! file is bound to the requirement it satisfies at upload-intent time,
//! instead of being matched back by filename convention. Re-uploading for
//! the same requirement replaces the previous pair.

use crate::error::AppError;
use crate::surat::models::BerkasPersyaratan;

/// Sanitize a label for use in storage paths.
pub fn slugify(nama: &str, fallback: &str) -> String {
    let mut result = String::new();
    let mut last_dash = false;

    for ch in nama.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            result.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if ch.is_whitespace() || ch == '-' || ch == '_' || ch == '/' {
            if !last_dash && !result.is_empty() {
                result.push('-');
                last_dash = true;
            }
        }
    }

    if result.is_empty() {
        return fallback.to_string();
    }

    result.trim_matches('-').to_string()
}

/// Storage path for one requirement upload. The timestamp keeps re-uploads
/// from overwriting the previous object in place.
pub fn path_unggah(
    pemohon_id: uuid::Uuid,
    surat_id: uuid::Uuid,
    persyaratan: &str,
    file_name: &str,
) -> String {
    format!(
        "{}/{}/{}-{}-{}",
        pemohon_id,
        surat_id,
        slugify(persyaratan, "berkas"),
        chrono::Utc::now().timestamp_millis(),
        slugify(file_name, "file")
    )
}

/// Record an uploaded file against one of the template's requirements.
/// Replaces any earlier upload for the same requirement.
pub fn catat(
    daftar: &mut Vec<BerkasPersyaratan>,
    persyaratan_template: &[String],
    persyaratan: &str,
    file_path: &str,
) -> Result<(), AppError> {
    if !persyaratan_template.iter().any(|p| p == persyaratan) {
        return Err(AppError::validation(format!(
            "persyaratan '{persyaratan}' tidak dikenal untuk template ini"
        )));
    }
    if file_path.trim().is_empty() {
        return Err(AppError::validation("file_path wajib diisi"));
    }

    if let Some(entri) = daftar.iter_mut().find(|b| b.persyaratan == persyaratan) {
        entri.file_path = file_path.to_string();
    } else {
        daftar.push(BerkasPersyaratan {
            persyaratan: persyaratan.to_string(),
            file_path: file_path.to_string(),
        });
    }
    Ok(())
}

/// One uploaded file per required item.
pub fn lengkap(daftar: &[BerkasPersyaratan], persyaratan_template: &[String]) -> bool {
    daftar.len() == persyaratan_template.len()
        && persyaratan_template
            .iter()
            .all(|p| daftar.iter().any(|b| &b.persyaratan == p))
}
