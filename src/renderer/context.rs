//! Placeholder context for template bodies.
//!
//! Templates carry `{{token}}` markers. The context is a flat map: applicant
//! profile fields and form answers are exposed both bare (`{{nama_lengkap}}`)
//! and prefixed (`{{pemohon.nama_lengkap}}`, `{{form.keperluan}}`); the
//! approver is prefixed only, so `{{pengesah.nama_lengkap}}` can never
//! clobber the applicant's bare keys. Unknown tokens resolve to the empty
//! string rather than leaking marker text into an official document.

use crate::pengaturan::models::PengaturanDesa;
use crate::profil::models::Profil;
use crate::surat::models::SuratKeluar;
use chrono::{DateTime, Datelike, Duration, Utc};
use serde_json::Value;
use std::collections::HashMap;

/// Shown when no letter number was assigned before rendering.
pub const NOMOR_SURAT_KOSONG: &str = "470/___/PEM";

const NAMA_BULAN: [&str; 12] = [
    "Januari", "Februari", "Maret", "April", "Mei", "Juni", "Juli", "Agustus", "September",
    "Oktober", "November", "Desember",
];

/// "17 Agustus 2026", in western Indonesia time (UTC+7).
pub fn format_tanggal_indonesia(waktu: DateTime<Utc>) -> String {
    let lokal = (waktu + Duration::hours(7)).naive_utc();
    format!(
        "{} {} {}",
        lokal.day(),
        NAMA_BULAN[lokal.month0() as usize],
        lokal.year()
    )
}

fn isi_ganda(konteks: &mut HashMap<String, String>, prefix: &str, kunci: &str, nilai: &str) {
    konteks.insert(kunci.to_string(), nilai.to_string());
    konteks.insert(format!("{prefix}.{kunci}"), nilai.to_string());
}

fn nilai_teks(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => if *b { "Ya" } else { "Tidak" }.to_string(),
        Value::Null => String::new(),
        lain => lain.to_string(),
    }
}

/// Build the flat placeholder map for one submission.
pub fn bangun_konteks(
    surat: &SuratKeluar,
    pemohon: &Profil,
    pengesah: Option<&Profil>,
    pengaturan: &PengaturanDesa,
) -> HashMap<String, String> {
    let mut konteks = HashMap::new();

    isi_ganda(&mut konteks, "pemohon", "nama_lengkap", &pemohon.nama_lengkap);
    isi_ganda(&mut konteks, "pemohon", "nik", &pemohon.nik);
    isi_ganda(&mut konteks, "pemohon", "telepon", &pemohon.telepon);
    isi_ganda(&mut konteks, "pemohon", "alamat", &pemohon.alamat);

    if let Value::Object(map) = &surat.form_data.0 {
        for (kunci, nilai) in map {
            isi_ganda(&mut konteks, "form", kunci, &nilai_teks(nilai));
        }
    }

    isi_ganda(&mut konteks, "desa", "nama_desa", &pengaturan.nama_desa);
    isi_ganda(&mut konteks, "desa", "kecamatan", &pengaturan.kecamatan);
    isi_ganda(&mut konteks, "desa", "kabupaten", &pengaturan.kabupaten);
    isi_ganda(&mut konteks, "desa", "provinsi", &pengaturan.provinsi);
    isi_ganda(&mut konteks, "desa", "alamat_kantor", &pengaturan.alamat_kantor);

    if let Some(p) = pengesah {
        konteks.insert("pengesah.nama_lengkap".to_string(), p.nama_lengkap.clone());
        konteks.insert("pengesah.nik".to_string(), p.nik.clone());
    }

    konteks.insert(
        "nomor_surat".to_string(),
        surat
            .nomor_surat
            .clone()
            .unwrap_or_else(|| NOMOR_SURAT_KOSONG.to_string()),
    );
    konteks.insert(
        "tanggal_surat".to_string(),
        format_tanggal_indonesia(surat.tanggal_selesai.unwrap_or_else(Utc::now)),
    );

    konteks
}

/// Replace every `{{token}}` in `template` with its context value. Tokens
/// without a value become empty. A single linear scan, no backtracking, so
/// the output can itself contain `{{` without being re-substituted.
pub fn ganti_placeholder(template: &str, konteks: &HashMap<String, String>) -> String {
    let mut hasil = String::with_capacity(template.len());
    let mut sisa = template;

    while let Some(buka) = sisa.find("{{") {
        hasil.push_str(&sisa[..buka]);
        let setelah = &sisa[buka + 2..];
        match setelah.find("}}") {
            Some(tutup) => {
                let token = setelah[..tutup].trim();
                if let Some(nilai) = konteks.get(token) {
                    hasil.push_str(nilai);
                }
                sisa = &setelah[tutup + 2..];
            }
            None => {
                // Unterminated marker, keep the tail verbatim.
                hasil.push_str(&sisa[buka..]);
                sisa = "";
            }
        }
    }
    hasil.push_str(sisa);
    hasil
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn konteks() -> HashMap<String, String> {
        let mut k = HashMap::new();
        k.insert("nama_lengkap".to_string(), "Budi Santoso".to_string());
        k.insert("form.keperluan".to_string(), "melamar kerja".to_string());
        k
    }

    #[test]
    fn test_ganti_placeholder() {
        let hasil = ganti_placeholder(
            "Yang bertanda tangan, {{nama_lengkap}}, untuk {{ form.keperluan }}.",
            &konteks(),
        );
        assert_eq!(
            hasil,
            "Yang bertanda tangan, Budi Santoso, untuk melamar kerja."
        );
    }

    #[test]
    fn test_unknown_token_becomes_empty() {
        assert_eq!(ganti_placeholder("a{{tidak_ada}}b", &konteks()), "ab");
    }

    #[test]
    fn test_unterminated_marker_kept_verbatim() {
        assert_eq!(
            ganti_placeholder("halo {{nama_lengkap", &konteks()),
            "halo {{nama_lengkap"
        );
    }

    #[test]
    fn test_substitution_is_single_pass() {
        let mut k = konteks();
        k.insert("x".to_string(), "{{nama_lengkap}}".to_string());
        // The injected marker survives as literal text.
        assert_eq!(ganti_placeholder("{{x}}", &k), "{{nama_lengkap}}");
    }

    #[test]
    fn test_format_tanggal_indonesia() {
        let t = Utc.with_ymd_and_hms(2026, 8, 17, 3, 0, 0).unwrap();
        assert_eq!(format_tanggal_indonesia(t), "17 Agustus 2026");
    }

    #[test]
    fn test_format_tanggal_rolls_into_wib() {
        // 23:00 UTC is already the next day in UTC+7.
        let t = Utc.with_ymd_and_hms(2026, 12, 31, 23, 0, 0).unwrap();
        assert_eq!(format_tanggal_indonesia(t), "1 Januari 2027");
    }
}
