//! End-to-end renderer pipeline: context, substitution, block layout and
//! the final PDF, without storage or database.

use chrono::{TimeZone, Utc};
use desa_surat_server::pengaturan::models::PengaturanDesa;
use desa_surat_server::profil::models::Profil;
use desa_surat_server::renderer::context::{
    bangun_konteks, format_tanggal_indonesia, ganti_placeholder, NOMOR_SURAT_KOSONG,
};
use desa_surat_server::renderer::layout::{pecah_blok, Blok};
use desa_surat_server::renderer::{pdf, BlokTandaTangan, DokumenSurat, KopSurat};
use desa_surat_server::surat::models::SuratKeluar;
use desa_surat_server::surat::status::StatusSurat;
use sqlx::types::Json;
use uuid::Uuid;

fn profil(nama: &str, nik: &str) -> Profil {
    Profil {
        user_id: Uuid::new_v4(),
        nama_lengkap: nama.to_string(),
        nik: nik.to_string(),
        telepon: "081234567890".to_string(),
        alamat: "Kp. Melati RT 02 RW 03".to_string(),
        url_tanda_tangan: None,
        url_stempel: None,
        url_foto: None,
    }
}

fn pengaturan() -> PengaturanDesa {
    PengaturanDesa {
        id: Uuid::nil(),
        nama_desa: "Desa Sukamaju".to_string(),
        kecamatan: "Cikarang Utara".to_string(),
        kabupaten: "Bekasi".to_string(),
        provinsi: "Jawa Barat".to_string(),
        alamat_kantor: "Jl. Raya Desa No. 1, Sukamaju".to_string(),
        telepon: Some("021-555123".to_string()),
        email: None,
        url_logo: None,
    }
}

fn surat_disetujui(form_data: serde_json::Value) -> SuratKeluar {
    SuratKeluar {
        id: Uuid::new_v4(),
        template_id: Uuid::new_v4(),
        pemohon_id: Uuid::new_v4(),
        status: StatusSurat::Disetujui,
        form_data: Json(form_data),
        file_persyaratan: Json(vec![]),
        created_at: Utc::now(),
        verifikator_id: Some(Uuid::new_v4()),
        pengesah_id: Some(Uuid::new_v4()),
        catatan_revisi: None,
        tanggal_selesai: Some(Utc.with_ymd_and_hms(2026, 8, 17, 3, 0, 0).unwrap()),
        nomor_surat: Some("470/21/PEM".to_string()),
    }
}

const TEMPLATE_SKTM: &str = "\
<h1>SURAT KETERANGAN TIDAK MAMPU</h1>\
<p>Yang bertanda tangan di bawah ini Kepala {{desa.nama_desa}} menerangkan bahwa:</p>\
<p>Nama: {{nama_lengkap}}<br/>NIK: {{nik}}<br/>Alamat: {{alamat}}</p>\
<p>adalah benar warga kami dan tergolong keluarga tidak mampu. Surat ini dibuat \
untuk {{form.keperluan}}.</p>\
<p>Demikian surat keterangan ini dibuat pada {{tanggal_surat}} untuk dipergunakan \
sebagaimana mestinya.</p>";

fn dokumen_lengkap() -> DokumenSurat {
    let surat = surat_disetujui(serde_json::json!({ "keperluan": "pengajuan beasiswa" }));
    let pemohon = profil("Budi Santoso", "3175091201990001");
    let pengesah = profil("H. Ahmad Subagyo", "3175090101700001");
    let pengaturan = pengaturan();

    let konteks = bangun_konteks(&surat, &pemohon, Some(&pengesah), &pengaturan);
    let isi = pecah_blok(&ganti_placeholder(TEMPLATE_SKTM, &konteks));

    DokumenSurat {
        judul: "Surat Keterangan Tidak Mampu".to_string(),
        nomor: surat.nomor_surat.clone().unwrap(),
        isi,
        kop: KopSurat {
            nama_desa: pengaturan.nama_desa.clone(),
            kecamatan: pengaturan.kecamatan.clone(),
            kabupaten: pengaturan.kabupaten.clone(),
            provinsi: pengaturan.provinsi.clone(),
            alamat_kantor: pengaturan.alamat_kantor.clone(),
            telepon: pengaturan.telepon.clone(),
            email: pengaturan.email.clone(),
            logo: None,
        },
        tanda_tangan: BlokTandaTangan {
            tempat: pengaturan.nama_desa.clone(),
            tanggal: format_tanggal_indonesia(surat.tanggal_selesai.unwrap()),
            jabatan: format!("Kepala {}", pengaturan.nama_desa),
            nama: pengesah.nama_lengkap.clone(),
            tanda_tangan: None,
            stempel: None,
        },
    }
}

#[test]
fn test_substituted_values_reach_the_pdf() {
    let pdf = pdf::render(&dokumen_lengkap()).unwrap();

    assert!(pdf.starts_with(b"%PDF-"));
    let teks = String::from_utf8_lossy(&pdf);
    assert!(teks.contains("Budi Santoso"));
    assert!(teks.contains("3175091201990001"));
    assert!(teks.contains("pengajuan beasiswa"));
    assert!(teks.contains("17 Agustus 2026"));
    assert!(teks.contains("470/21/PEM"));
    // Letterhead and signature block.
    assert!(teks.contains("DESA SUKAMAJU"));
    assert!(teks.contains("H. Ahmad Subagyo"));
    // No unresolved markers leak into the document.
    assert!(!teks.contains("{{"));
}

#[test]
fn test_missing_images_do_not_block_rendering() {
    // Issuer never uploaded signature or stamp; the letter still renders.
    let d = dokumen_lengkap();
    assert!(d.tanda_tangan.tanda_tangan.is_none());
    assert!(d.tanda_tangan.stempel.is_none());
    assert!(pdf::render(&d).unwrap().len() > 500);
}

#[test]
fn test_nomor_surat_fallback() {
    let mut surat = surat_disetujui(serde_json::json!({}));
    surat.nomor_surat = None;
    let konteks = bangun_konteks(
        &surat,
        &profil("Ani", "3175091201990002"),
        None,
        &pengaturan(),
    );
    assert_eq!(
        ganti_placeholder("Nomor: {{nomor_surat}}", &konteks),
        format!("Nomor: {NOMOR_SURAT_KOSONG}")
    );
}

#[test]
fn test_pengesah_keys_do_not_clobber_pemohon() {
    let surat = surat_disetujui(serde_json::json!({}));
    let pemohon = profil("Budi Santoso", "3175091201990001");
    let pengesah = profil("H. Ahmad Subagyo", "3175090101700001");
    let konteks = bangun_konteks(&surat, &pemohon, Some(&pengesah), &pengaturan());

    assert_eq!(
        ganti_placeholder("{{nama_lengkap}}", &konteks),
        "Budi Santoso"
    );
    assert_eq!(
        ganti_placeholder("{{pengesah.nama_lengkap}}", &konteks),
        "H. Ahmad Subagyo"
    );
}

#[test]
fn test_signature_block_moves_to_next_page_when_cramped() {
    let mut d = dokumen_lengkap();
    // Enough body to leave less than the signature block's height at the
    // bottom of page one.
    let pengisi = Blok::Paragraf(
        "Paragraf pengisi yang menambah tinggi halaman sedikit demi sedikit.".to_string(),
    );
    d.isi = (0..38).map(|_| pengisi.clone()).collect();

    let pdf = pdf::render(&d).unwrap();
    let teks = String::from_utf8_lossy(&pdf);
    let halaman = teks.matches("MediaBox").count();
    assert!(halaman >= 2, "expected a page break, got {halaman} page(s)");
    // The approver's name stays intact on whichever page it landed.
    assert!(teks.contains("H. Ahmad Subagyo"));
}

#[test]
fn test_form_values_of_all_json_types() {
    let surat = surat_disetujui(serde_json::json!({
        "jumlah_tanggungan": 4,
        "punya_rumah": false,
        "keperluan": "subsidi listrik"
    }));
    let konteks = bangun_konteks(
        &surat,
        &profil("Citra", "3175091201990003"),
        None,
        &pengaturan(),
    );
    assert_eq!(
        ganti_placeholder(
            "{{form.jumlah_tanggungan}}|{{form.punya_rumah}}|{{form.keperluan}}",
            &konteks
        ),
        "4|Tidak|subsidi listrik"
    );
}
