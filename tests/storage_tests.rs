mod common;

use common::MockObjectStorage;
use desa_surat_server::renderer::layout::Blok;
use desa_surat_server::renderer::{pdf, BlokTandaTangan, DokumenSurat, KopSurat};
use desa_surat_server::storage::ObjectStorage;

fn png_contoh() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb([200, 30, 30]));
    let mut bytes = Vec::new();
    img.write_to(
        &mut std::io::Cursor::new(&mut bytes),
        image::ImageFormat::Png,
    )
    .expect("encode png");
    bytes
}

#[tokio::test]
async fn test_seeded_object_is_fetchable() {
    let storage = MockObjectStorage::new();
    let path = "aset/desa/logo-123-logo.png";

    assert!(!storage.has_file(path).await);
    storage.insert_file(path, png_contoh()).await;
    assert!(storage.has_file(path).await);

    let bytes = storage.fetch_bytes(path).await.expect("seeded object");
    assert_eq!(bytes, png_contoh());

    let err = storage.fetch_bytes("aset/desa/tidak-ada.png").await;
    assert!(err.is_err());
}

#[tokio::test]
async fn test_fetched_images_end_up_in_rendered_pdf() {
    let storage = MockObjectStorage::new();
    storage.insert_file("aset/desa/logo.png", png_contoh()).await;
    storage
        .insert_file("aset/kades/tanda-tangan.png", png_contoh())
        .await;
    storage.insert_file("aset/kades/stempel.png", png_contoh()).await;

    let dokumen = DokumenSurat {
        judul: "SURAT KETERANGAN".to_string(),
        nomor: "470/12/PEM".to_string(),
        isi: vec![Blok::Paragraf("Isi surat singkat.".to_string())],
        kop: KopSurat {
            nama_desa: "Desa Sukamaju".to_string(),
            kecamatan: "Kecamatan Cibadak".to_string(),
            kabupaten: "Kabupaten Sukabumi".to_string(),
            provinsi: "Jawa Barat".to_string(),
            alamat_kantor: "Jl. Raya Desa No. 1".to_string(),
            telepon: None,
            email: None,
            logo: Some(storage.fetch_bytes("aset/desa/logo.png").await.unwrap()),
        },
        tanda_tangan: BlokTandaTangan {
            tempat: "Sukamaju".to_string(),
            tanggal: "1 Agustus 2026".to_string(),
            jabatan: "Kepala Desa Sukamaju".to_string(),
            nama: "Budi Santoso".to_string(),
            tanda_tangan: Some(
                storage
                    .fetch_bytes("aset/kades/tanda-tangan.png")
                    .await
                    .unwrap(),
            ),
            stempel: Some(storage.fetch_bytes("aset/kades/stempel.png").await.unwrap()),
        },
    };

    let bytes = pdf::render(&dokumen).expect("render");
    let teks = String::from_utf8_lossy(&bytes);

    // One JPEG XObject per fetched image: logo, signature, stamp.
    assert_eq!(teks.matches("DCTDecode").count(), 3);
    for nama in ["Im0", "Im1", "Im2"] {
        assert!(teks.contains(nama), "missing image resource {nama}");
    }
}
