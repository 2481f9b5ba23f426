//! Lifecycle tests against a real Postgres. Run with a TEST_DATABASE_URL:
//!
//! ```text
//! cargo test -- --ignored
//! ```

mod common;

use desa_surat_server::auth::model::{Role, User};
use desa_surat_server::db::{AppState, PENGATURAN_DESA_ID};
use desa_surat_server::error::AppError;
use desa_surat_server::pengaturan::models::SimpanPengaturanRequest;
use desa_surat_server::profil::models::{JenisAset, UpdateProfilRequest};
use desa_surat_server::surat::models::CreatePengajuanRequest;
use desa_surat_server::surat::status::{Keputusan, StatusSurat};
use desa_surat_server::template::models::{CreateTemplateRequest, TemplateSurat};
use uuid::Uuid;

async fn buat_user(state: &AppState, role: Role, nama: &str) -> User {
    let email = format!("{}-{}@test.local", nama.to_lowercase(), Uuid::new_v4());
    state
        .create_user(&email, "$2b$04$testhash", role, nama, "3175091201990001")
        .await
        .expect("create user")
}

async fn buat_template(state: &AppState) -> TemplateSurat {
    let req = CreateTemplateRequest {
        kode_surat: format!("SKTM-{}", Uuid::new_v4()),
        nama_surat: "Surat Keterangan Tidak Mampu".to_string(),
        deskripsi: "Untuk bantuan sosial".to_string(),
        persyaratan: vec!["Fotokopi KTP".to_string(), "Fotokopi KK".to_string()],
        template_html: "<p>{{nama_lengkap}} untuk {{form.keperluan}}</p>".to_string(),
        form_schema: vec![],
    };
    state.create_template(&req).await.expect("create template")
}

async fn buat_pengajuan(state: &AppState, pemohon: &User, template: &TemplateSurat) -> Uuid {
    let surat = state
        .create_pengajuan(
            pemohon.id,
            &pemohon.email,
            &CreatePengajuanRequest {
                template_id: template.id,
                form_data: serde_json::json!({ "keperluan": "beasiswa" }),
            },
        )
        .await
        .expect("create pengajuan");
    surat.id
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_full_lifecycle_to_issuance() {
    let (state, _storage) = common::setup_app_state().await;
    let warga = buat_user(&state, Role::Warga, "Budi").await;
    let staf = buat_user(&state, Role::Staf, "Siti").await;
    let kades = buat_user(&state, Role::KepalaDesa, "Ahmad").await;
    let template = buat_template(&state).await;

    let surat_id = buat_pengajuan(&state, &warga, &template).await;
    let surat = state.get_surat(surat_id).await.unwrap().unwrap();
    assert_eq!(surat.status, StatusSurat::MengisiBerkas);

    // Incomplete attachments block submission.
    let err = state
        .ajukan_verifikasi(surat_id, warga.id, &warga.email)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    state
        .catat_berkas(surat_id, warga.id, "Fotokopi KTP", "u/s/ktp-v1.pdf")
        .await
        .unwrap();
    // Re-upload replaces, it does not append.
    let surat = state
        .catat_berkas(surat_id, warga.id, "Fotokopi KTP", "u/s/ktp-v2.pdf")
        .await
        .unwrap();
    assert_eq!(surat.file_persyaratan.0.len(), 1);
    assert_eq!(surat.file_persyaratan.0[0].file_path, "u/s/ktp-v2.pdf");

    state
        .catat_berkas(surat_id, warga.id, "Fotokopi KK", "u/s/kk.pdf")
        .await
        .unwrap();

    let surat = state
        .ajukan_verifikasi(surat_id, warga.id, &warga.email)
        .await
        .unwrap();
    assert_eq!(surat.status, StatusSurat::MenungguVerifikasi);

    // Attachments are frozen once submitted.
    let err = state
        .catat_berkas(surat_id, warga.id, "Fotokopi KTP", "u/s/ktp-v3.pdf")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));

    let surat = state
        .verifikasi_staf(surat_id, staf.id, &staf.email, Keputusan::Setuju, None)
        .await
        .unwrap();
    assert_eq!(surat.status, StatusSurat::Diverifikasi);
    assert_eq!(surat.verifikator_id, Some(staf.id));

    let surat = state
        .persetujuan_kades(surat_id, kades.id, &kades.email, Keputusan::Setuju, None)
        .await
        .unwrap();
    assert_eq!(surat.status, StatusSurat::Disetujui);
    assert_eq!(surat.pengesah_id, Some(kades.id));
    assert!(surat.tanggal_selesai.is_some());

    let surat = state.terbitkan(surat_id, warga.id, &warga.email).await.unwrap();
    assert_eq!(surat.status, StatusSurat::Diterbitkan);
    // Idempotent for later downloads.
    let surat = state.terbitkan(surat_id, warga.id, &warga.email).await.unwrap();
    assert_eq!(surat.status, StatusSurat::Diterbitkan);

    let log = state.list_log(surat_id).await.unwrap();
    let aksi: Vec<&str> = log.iter().map(|l| l.aksi.as_str()).collect();
    assert_eq!(
        aksi,
        vec![
            "PENGAJUAN_DIBUAT",
            "MENGAJUKAN_VERIFIKASI",
            "VERIFIKASI_DISETUJUI",
            "PERSETUJUAN_FINAL",
            "SURAT_DITERBITKAN",
        ]
    );
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_rejection_is_terminal_and_requires_a_note() {
    let (state, _storage) = common::setup_app_state().await;
    let warga = buat_user(&state, Role::Warga, "Budi").await;
    let staf = buat_user(&state, Role::Staf, "Siti").await;
    let template = buat_template(&state).await;

    let surat_id = buat_pengajuan(&state, &warga, &template).await;
    state
        .catat_berkas(surat_id, warga.id, "Fotokopi KTP", "u/s/ktp.pdf")
        .await
        .unwrap();
    state
        .catat_berkas(surat_id, warga.id, "Fotokopi KK", "u/s/kk.pdf")
        .await
        .unwrap();
    state
        .ajukan_verifikasi(surat_id, warga.id, &warga.email)
        .await
        .unwrap();

    // A rejection without a note is refused before anything changes.
    let err = state
        .verifikasi_staf(surat_id, staf.id, &staf.email, Keputusan::Tolak, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let surat = state
        .verifikasi_staf(
            surat_id,
            staf.id,
            &staf.email,
            Keputusan::Tolak,
            Some("Scan KTP tidak terbaca"),
        )
        .await
        .unwrap();
    assert_eq!(surat.status, StatusSurat::DitolakStaf);
    assert_eq!(surat.catatan_revisi.as_deref(), Some("Scan KTP tidak terbaca"));

    // No path out of a rejected state.
    let err = state
        .ajukan_verifikasi(surat_id, warga.id, &warga.email)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
    let err = state
        .verifikasi_staf(surat_id, staf.id, &staf.email, Keputusan::Setuju, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_ownership_is_enforced() {
    let (state, _storage) = common::setup_app_state().await;
    let warga = buat_user(&state, Role::Warga, "Budi").await;
    let lain = buat_user(&state, Role::Warga, "Ani").await;
    let template = buat_template(&state).await;

    let surat_id = buat_pengajuan(&state, &warga, &template).await;
    let err = state
        .catat_berkas(surat_id, lain.id, "Fotokopi KTP", "u/s/ktp.pdf")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = state
        .ajukan_verifikasi(surat_id, lain.id, &lain.email)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_pengaturan_upsert_is_a_singleton() {
    let (state, _storage) = common::setup_app_state().await;

    let mut req = SimpanPengaturanRequest {
        nama_desa: "Desa Sukamaju".to_string(),
        kecamatan: "Cikarang Utara".to_string(),
        kabupaten: "Bekasi".to_string(),
        provinsi: "Jawa Barat".to_string(),
        alamat_kantor: "Jl. Raya Desa No. 1".to_string(),
        telepon: None,
        email: None,
        url_logo: None,
    };
    let pertama = state.simpan_pengaturan(&req).await.unwrap();
    assert_eq!(pertama.id, PENGATURAN_DESA_ID);

    req.telepon = Some("021-555123".to_string());
    let kedua = state.simpan_pengaturan(&req).await.unwrap();
    assert_eq!(kedua.id, PENGATURAN_DESA_ID);
    assert_eq!(kedua.telepon.as_deref(), Some("021-555123"));

    let dibaca = state.get_pengaturan().await.unwrap().unwrap();
    assert_eq!(dibaca.telepon.as_deref(), Some("021-555123"));
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_template_delete_blocked_while_referenced() {
    let (state, _storage) = common::setup_app_state().await;
    let warga = buat_user(&state, Role::Warga, "Budi").await;
    let template = buat_template(&state).await;
    buat_pengajuan(&state, &warga, &template).await;

    let err = state.delete_template(template.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let bebas = buat_template(&state).await;
    state.delete_template(bebas.id).await.unwrap();
    assert!(state.get_template(bebas.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_profile_cache_sees_updates() {
    let (state, _storage) = common::setup_app_state().await;
    let warga = buat_user(&state, Role::Warga, "Budi").await;

    // Prime the cache.
    let p = state.get_profil(warga.id).await.unwrap().unwrap();
    assert_eq!(p.nama_lengkap, "Budi");

    state
        .update_profil(
            warga.id,
            &UpdateProfilRequest {
                nama_lengkap: Some("Budi Santoso".to_string()),
                nik: None,
                telepon: None,
                alamat: None,
            },
        )
        .await
        .unwrap();

    let p = state.get_profil(warga.id).await.unwrap().unwrap();
    assert_eq!(p.nama_lengkap, "Budi Santoso");
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_logo_slot_never_touches_a_profile() {
    let (state, _storage) = common::setup_app_state().await;
    let staf = buat_user(&state, Role::Staf, "Siti").await;

    let err = state
        .set_aset_profil(staf.id, JenisAset::Logo, "aset/desa/logo-1-logo.png")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let p = state.get_profil(staf.id).await.unwrap().unwrap();
    assert!(p.url_tanda_tangan.is_none());
    assert!(p.url_stempel.is_none());
    assert!(p.url_foto.is_none());
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_inactive_template_rejects_new_submissions() {
    let (state, _storage) = common::setup_app_state().await;
    let warga = buat_user(&state, Role::Warga, "Budi").await;
    let template = buat_template(&state).await;

    state
        .update_template(
            template.id,
            &desa_surat_server::template::models::UpdateTemplateRequest {
                nama_surat: None,
                deskripsi: None,
                persyaratan: None,
                template_html: None,
                form_schema: None,
                is_active: Some(false),
            },
        )
        .await
        .unwrap();

    let err = state
        .create_pengajuan(
            warga.id,
            &warga.email,
            &CreatePengajuanRequest {
                template_id: template.id,
                form_data: serde_json::json!({}),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}
