//! PDF rendering of an approved letter.
//!
//! The pipeline is deliberately split into pure stages so each one is
//! testable without touching storage or the database:
//!
//! 1. `context` builds the placeholder map and substitutes it into the
//!    template body,
//! 2. `layout` turns the substituted body into positioned text blocks,
//! 3. `pdf` draws blocks, letterhead and the signature area onto A4 pages.

pub mod context;
pub mod layout;
pub mod pdf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("template tidak memiliki isi")]
    TemplateKosong,
}

/// Letterhead data, straight from the village settings.
#[derive(Debug, Clone)]
pub struct KopSurat {
    pub nama_desa: String,
    pub kecamatan: String,
    pub kabupaten: String,
    pub provinsi: String,
    pub alamat_kantor: String,
    pub telepon: Option<String>,
    pub email: Option<String>,
    /// Raw bytes of the village logo, any format `image` can decode.
    pub logo: Option<Vec<u8>>,
}

/// Signature area at the bottom of the letter.
#[derive(Debug, Clone)]
pub struct BlokTandaTangan {
    pub tempat: String,
    pub tanggal: String,
    pub jabatan: String,
    pub nama: String,
    pub tanda_tangan: Option<Vec<u8>>,
    pub stempel: Option<Vec<u8>>,
}

/// Fully resolved document, ready to draw. All placeholder substitution has
/// already happened by the time this exists.
#[derive(Debug, Clone)]
pub struct DokumenSurat {
    pub judul: String,
    pub nomor: String,
    pub isi: Vec<layout::Blok>,
    pub kop: KopSurat,
    pub tanda_tangan: BlokTandaTangan,
}

/// Download filename, derived from letter code and applicant NIK so a
/// resident's downloads sort naturally in a folder.
pub fn nama_file_unduhan(kode_surat: &str, nik: &str) -> String {
    format!(
        "surat-{}-{}.pdf",
        crate::surat::berkas::slugify(kode_surat, "surat"),
        crate::surat::berkas::slugify(nik, "pemohon")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nama_file_unduhan() {
        assert_eq!(
            nama_file_unduhan("SKTM", "3175091201990001"),
            "surat-sktm-3175091201990001.pdf"
        );
        assert_eq!(
            nama_file_unduhan("SK Domisili", "##"),
            "surat-sk-domisili-pemohon.pdf"
        );
    }
}
