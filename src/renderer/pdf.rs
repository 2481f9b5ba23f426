//! A4 page description for the final letter.
//!
//! Pages are built as raw content streams over the base-14 Helvetica fonts,
//! so rendering needs no font files and no external process. Content streams
//! stay uncompressed; the output is small either way and stays inspectable.
//!
//! Layout model: a cursor `y` walks down from the top margin; every element
//! asks for vertical room first and a page break happens between elements,
//! never inside one. The signature block is measured as a single element so
//! it can never be split across pages.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use super::layout::{bungkus_teks, Blok};
use super::{DokumenSurat, RenderError};

const LEBAR_HALAMAN: f32 = 595.0;
const TINGGI_HALAMAN: f32 = 842.0;
const MARGIN: f32 = 64.0;
const LEBAR_TEKS: f32 = LEBAR_HALAMAN - 2.0 * MARGIN;

const UKURAN_JUDUL: f32 = 13.0;
const UKURAN_ISI: f32 = 11.0;
const UKURAN_KECIL: f32 = 9.0;
const JARAK_BARIS: f32 = 1.55;

// Average Helvetica glyph width as a fraction of the font size; close
// enough for centering and wrap limits on letter bodies.
const FAKTOR_LEBAR: f32 = 0.5;

const TINGGI_BLOK_TTD: f32 = 170.0;

fn lebar_teks(teks: &str, ukuran: f32) -> f32 {
    teks.chars().count() as f32 * ukuran * FAKTOR_LEBAR
}

fn maks_karakter(ukuran: f32) -> usize {
    (LEBAR_TEKS / (ukuran * FAKTOR_LEBAR)) as usize
}

/// Decode arbitrary image bytes and embed them as a JPEG XObject. A broken
/// or unsupported image degrades to `None`; the letter renders without it.
fn sisip_gambar(doc: &mut Document, label: &str, data: &[u8]) -> Option<ObjectId> {
    let gambar = match image::load_from_memory(data) {
        Ok(g) => g.to_rgb8(),
        Err(e) => {
            log::warn!("gambar {label} tidak dapat dibaca, dilewati: {e}");
            return None;
        }
    };
    let (lebar, tinggi) = gambar.dimensions();

    let mut jpeg = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, 85);
    if let Err(e) = gambar.write_with_encoder(encoder) {
        log::warn!("gambar {label} gagal dienkode ulang, dilewati: {e}");
        return None;
    }

    Some(doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => lebar as i64,
            "Height" => tinggi as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    )))
}

struct Penyusun<'a> {
    doc: &'a mut Document,
    pages_id: ObjectId,
    gs_stempel_id: ObjectId,
    xobjects: Vec<(&'static str, ObjectId)>,
    ops: Vec<Operation>,
    kids: Vec<ObjectId>,
    y: f32,
}

impl<'a> Penyusun<'a> {
    fn new(
        doc: &'a mut Document,
        pages_id: ObjectId,
        gs_stempel_id: ObjectId,
        xobjects: Vec<(&'static str, ObjectId)>,
    ) -> Self {
        Penyusun {
            doc,
            pages_id,
            gs_stempel_id,
            xobjects,
            ops: Vec::new(),
            kids: Vec::new(),
            y: TINGGI_HALAMAN - MARGIN,
        }
    }

    /// Break the page unless `tinggi` points still fit above the margin.
    fn pastikan_ruang(&mut self, tinggi: f32) -> Result<(), RenderError> {
        if self.y - tinggi < MARGIN && !self.ops.is_empty() {
            self.selesai_halaman()?;
        }
        Ok(())
    }

    fn selesai_halaman(&mut self) -> Result<(), RenderError> {
        let content = Content {
            operations: std::mem::take(&mut self.ops),
        };
        let stream_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.encode()?));

        let mut resources = dictionary! {
            "Font" => dictionary! {
                "F1" => dictionary! {
                    "Type" => "Font", "Subtype" => "Type1", "BaseFont" => "Helvetica",
                },
                "F2" => dictionary! {
                    "Type" => "Font", "Subtype" => "Type1", "BaseFont" => "Helvetica-Bold",
                },
            },
            "ExtGState" => dictionary! {
                "GS0" => self.gs_stempel_id,
            },
        };
        if !self.xobjects.is_empty() {
            let mut xdict = Dictionary::new();
            for (nama, id) in &self.xobjects {
                xdict.set(*nama, Object::Reference(*id));
            }
            resources.set("XObject", xdict);
        }

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                0.into(), 0.into(), LEBAR_HALAMAN.into(), TINGGI_HALAMAN.into(),
            ],
            "Contents" => stream_id,
            "Resources" => resources,
        });
        self.kids.push(page_id);
        self.y = TINGGI_HALAMAN - MARGIN;
        Ok(())
    }

    fn teks_pada(&mut self, x: f32, y: f32, teks: &str, ukuran: f32, tebal: bool) {
        let font = if tebal { "F2" } else { "F1" };
        self.ops.push(Operation::new("BT", vec![]));
        self.ops
            .push(Operation::new("Tf", vec![font.into(), ukuran.into()]));
        self.ops
            .push(Operation::new("Td", vec![x.into(), y.into()]));
        self.ops
            .push(Operation::new("Tj", vec![Object::string_literal(teks)]));
        self.ops.push(Operation::new("ET", vec![]));
    }

    /// One line at the cursor, advancing it. `x` of `None` centers the line.
    fn baris(
        &mut self,
        x: Option<f32>,
        teks: &str,
        ukuran: f32,
        tebal: bool,
    ) -> Result<(), RenderError> {
        self.pastikan_ruang(ukuran * JARAK_BARIS)?;
        self.y -= ukuran * JARAK_BARIS;
        let x = x.unwrap_or_else(|| {
            ((LEBAR_HALAMAN - lebar_teks(teks, ukuran)) / 2.0).max(MARGIN)
        });
        self.teks_pada(x, self.y, teks, ukuran, tebal);
        Ok(())
    }

    fn paragraf(&mut self, teks: &str, ukuran: f32) -> Result<(), RenderError> {
        for potong in bungkus_teks(teks, maks_karakter(ukuran)) {
            self.baris(Some(MARGIN), &potong, ukuran, false)?;
        }
        self.jeda(ukuran * 0.6);
        Ok(())
    }

    fn jeda(&mut self, tinggi: f32) {
        self.y -= tinggi;
    }

    fn garis(&mut self, x1: f32, x2: f32, tebal: f32) {
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new("w", vec![tebal.into()]));
        self.ops
            .push(Operation::new("m", vec![x1.into(), self.y.into()]));
        self.ops
            .push(Operation::new("l", vec![x2.into(), self.y.into()]));
        self.ops.push(Operation::new("S", vec![]));
        self.ops.push(Operation::new("Q", vec![]));
    }

    fn gambar(&mut self, nama: &str, x: f32, y: f32, lebar: f32, tinggi: f32) {
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new(
            "cm",
            vec![
                lebar.into(),
                0.into(),
                0.into(),
                tinggi.into(),
                x.into(),
                y.into(),
            ],
        ));
        self.ops.push(Operation::new("Do", vec![nama.into()]));
        self.ops.push(Operation::new("Q", vec![]));
    }

    /// Like `gambar`, but painted through the translucent graphics state so
    /// the stamp does not hide the signature under it.
    fn gambar_transparan(&mut self, nama: &str, x: f32, y: f32, lebar: f32, tinggi: f32) {
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new("gs", vec!["GS0".into()]));
        self.ops.push(Operation::new(
            "cm",
            vec![
                lebar.into(),
                0.into(),
                0.into(),
                tinggi.into(),
                x.into(),
                y.into(),
            ],
        ));
        self.ops.push(Operation::new("Do", vec![nama.into()]));
        self.ops.push(Operation::new("Q", vec![]));
    }
}

fn tulis_kop(p: &mut Penyusun, dokumen: &DokumenSurat, ada_logo: bool) -> Result<(), RenderError> {
    let kop = &dokumen.kop;

    if ada_logo {
        p.gambar("Im0", MARGIN, TINGGI_HALAMAN - MARGIN - 58.0, 58.0, 58.0);
    }

    p.baris(
        None,
        &format!("PEMERINTAH KABUPATEN {}", kop.kabupaten.to_uppercase()),
        UKURAN_ISI,
        true,
    )?;
    p.baris(
        None,
        &format!("KECAMATAN {}", kop.kecamatan.to_uppercase()),
        12.0,
        true,
    )?;
    p.baris(None, &kop.nama_desa.to_uppercase(), 15.0, true)?;
    p.baris(None, &kop.alamat_kantor, UKURAN_KECIL, false)?;

    let mut kontak = Vec::new();
    if let Some(t) = &kop.telepon {
        kontak.push(format!("Telp. {t}"));
    }
    if let Some(e) = &kop.email {
        kontak.push(format!("Email: {e}"));
    }
    if !kontak.is_empty() {
        p.baris(None, &kontak.join("  "), UKURAN_KECIL, false)?;
    }

    p.jeda(6.0);
    p.garis(MARGIN, LEBAR_HALAMAN - MARGIN, 2.0);
    p.jeda(2.5);
    p.garis(MARGIN, LEBAR_HALAMAN - MARGIN, 0.8);
    p.jeda(18.0);
    Ok(())
}

fn tulis_judul(p: &mut Penyusun, dokumen: &DokumenSurat) -> Result<(), RenderError> {
    p.baris(None, &dokumen.judul.to_uppercase(), UKURAN_JUDUL, true)?;

    // Underline sized to the title.
    let lebar = lebar_teks(&dokumen.judul, UKURAN_JUDUL);
    let x1 = ((LEBAR_HALAMAN - lebar) / 2.0).max(MARGIN);
    p.jeda(2.0);
    p.garis(x1, x1 + lebar.min(LEBAR_TEKS), 0.8);
    p.jeda(2.0);

    p.baris(None, &format!("Nomor: {}", dokumen.nomor), UKURAN_ISI, false)?;
    p.jeda(14.0);
    Ok(())
}

fn tulis_isi(p: &mut Penyusun, isi: &[Blok]) -> Result<(), RenderError> {
    for blok in isi {
        match blok {
            Blok::Judul(teks) => {
                p.jeda(4.0);
                p.baris(None, teks, 12.0, true)?;
                p.jeda(4.0);
            }
            Blok::Paragraf(teks) => p.paragraf(teks, UKURAN_ISI)?,
            Blok::BarisTengah(teks) => {
                p.baris(None, teks, UKURAN_ISI, false)?;
                p.jeda(UKURAN_ISI * 0.6);
            }
            Blok::Garis => {
                p.pastikan_ruang(12.0)?;
                p.jeda(6.0);
                p.garis(MARGIN, LEBAR_HALAMAN - MARGIN, 0.8);
                p.jeda(6.0);
            }
        }
    }
    Ok(())
}

fn tulis_tanda_tangan(
    p: &mut Penyusun,
    dokumen: &DokumenSurat,
    ada_ttd: bool,
    ada_stempel: bool,
) -> Result<(), RenderError> {
    let ttd = &dokumen.tanda_tangan;

    // Reserved as one element so the block never straddles a page break.
    p.pastikan_ruang(TINGGI_BLOK_TTD)?;
    p.jeda(10.0);

    let kolom_x = LEBAR_HALAMAN - MARGIN - 220.0;
    let tengah_kolom = |teks: &str, ukuran: f32| -> f32 {
        (kolom_x + (220.0 - lebar_teks(teks, ukuran)) / 2.0).max(kolom_x)
    };

    let tempat_tanggal = format!("{}, {}", ttd.tempat, ttd.tanggal);
    p.y -= UKURAN_ISI * JARAK_BARIS;
    let x = tengah_kolom(&tempat_tanggal, UKURAN_ISI);
    p.teks_pada(x, p.y, &tempat_tanggal, UKURAN_ISI, false);

    p.y -= UKURAN_ISI * JARAK_BARIS;
    let x = tengah_kolom(&ttd.jabatan, UKURAN_ISI);
    p.teks_pada(x, p.y, &ttd.jabatan, UKURAN_ISI, false);

    // Signature image sits in a fixed 66pt band; the stamp overlaps it
    // from the left at reduced opacity, like a wet stamp over ink.
    let atas_band = p.y - 4.0;
    if ada_ttd {
        p.gambar("Im1", kolom_x + 55.0, atas_band - 62.0, 110.0, 58.0);
    }
    if ada_stempel {
        p.gambar_transparan("Im2", kolom_x + 10.0, atas_band - 70.0, 78.0, 78.0);
    }
    p.y = atas_band - 70.0;

    p.y -= UKURAN_ISI * JARAK_BARIS;
    let x = tengah_kolom(&ttd.nama, UKURAN_ISI);
    p.teks_pada(x, p.y, &ttd.nama, UKURAN_ISI, true);
    p.jeda(2.0);
    let lebar_nama = lebar_teks(&ttd.nama, UKURAN_ISI);
    p.garis(x, x + lebar_nama, 0.6);

    Ok(())
}

/// Render the whole letter to PDF bytes.
pub fn render(dokumen: &DokumenSurat) -> Result<Vec<u8>, RenderError> {
    if dokumen.isi.is_empty() {
        return Err(RenderError::TemplateKosong);
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let gs_stempel_id = doc.add_object(dictionary! {
        "Type" => "ExtGState",
        "ca" => Object::Real(0.8),
        "CA" => Object::Real(0.8),
    });

    let mut xobjects = Vec::new();
    let logo_id = dokumen
        .kop
        .logo
        .as_deref()
        .and_then(|b| sisip_gambar(&mut doc, "logo", b));
    if let Some(id) = logo_id {
        xobjects.push(("Im0", id));
    }
    let ttd_id = dokumen
        .tanda_tangan
        .tanda_tangan
        .as_deref()
        .and_then(|b| sisip_gambar(&mut doc, "tanda tangan", b));
    if let Some(id) = ttd_id {
        xobjects.push(("Im1", id));
    }
    let stempel_id = dokumen
        .tanda_tangan
        .stempel
        .as_deref()
        .and_then(|b| sisip_gambar(&mut doc, "stempel", b));
    if let Some(id) = stempel_id {
        xobjects.push(("Im2", id));
    }

    let mut p = Penyusun::new(&mut doc, pages_id, gs_stempel_id, xobjects);

    tulis_kop(&mut p, dokumen, logo_id.is_some())?;
    tulis_judul(&mut p, dokumen)?;
    tulis_isi(&mut p, &dokumen.isi)?;
    tulis_tanda_tangan(&mut p, dokumen, ttd_id.is_some(), stempel_id.is_some())?;
    p.selesai_halaman()?;

    let kids: Vec<Object> = p.kids.iter().map(|id| Object::Reference(*id)).collect();
    let jumlah = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => jumlah,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut keluaran = Vec::new();
    doc.save_to(&mut keluaran).map_err(lopdf::Error::from)?;
    Ok(keluaran)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{BlokTandaTangan, KopSurat};

    fn kop() -> KopSurat {
        KopSurat {
            nama_desa: "Desa Sukamaju".to_string(),
            kecamatan: "Cikarang".to_string(),
            kabupaten: "Bekasi".to_string(),
            provinsi: "Jawa Barat".to_string(),
            alamat_kantor: "Jl. Raya Desa No. 1".to_string(),
            telepon: None,
            email: None,
            logo: None,
        }
    }

    fn ttd() -> BlokTandaTangan {
        BlokTandaTangan {
            tempat: "Sukamaju".to_string(),
            tanggal: "17 Agustus 2026".to_string(),
            jabatan: "Kepala Desa Sukamaju".to_string(),
            nama: "H. Ahmad Subagyo".to_string(),
            tanda_tangan: None,
            stempel: None,
        }
    }

    fn dokumen(isi: Vec<Blok>) -> DokumenSurat {
        DokumenSurat {
            judul: "Surat Keterangan Domisili".to_string(),
            nomor: "470/15/PEM".to_string(),
            isi,
            kop: kop(),
            tanda_tangan: ttd(),
        }
    }

    #[test]
    fn test_render_produces_pdf_with_visible_text() {
        let pdf = render(&dokumen(vec![Blok::Paragraf(
            "Menyatakan bahwa Budi Santoso NIK 3175091201990001 berdomisili di desa kami."
                .to_string(),
        )]))
        .unwrap();

        assert!(pdf.starts_with(b"%PDF-"));
        // Content streams are uncompressed, so body text is greppable.
        let teks = String::from_utf8_lossy(&pdf);
        assert!(teks.contains("Budi Santoso"));
        assert!(teks.contains("3175091201990001"));
        assert!(teks.contains("470/15/PEM"));
    }

    #[test]
    fn test_render_without_images_still_succeeds() {
        let pdf = render(&dokumen(vec![Blok::Paragraf("Isi surat.".to_string())])).unwrap();
        assert!(pdf.len() > 500);
    }

    #[test]
    fn test_empty_body_is_an_error() {
        assert!(matches!(
            render(&dokumen(vec![])),
            Err(RenderError::TemplateKosong)
        ));
    }

    #[test]
    fn test_long_body_paginates() {
        let paragraf = "Kalimat yang cukup panjang untuk memenuhi beberapa baris dalam \
                        satu halaman surat resmi desa."
            .to_string();
        let isi: Vec<Blok> = (0..60).map(|_| Blok::Paragraf(paragraf.clone())).collect();
        let pdf = render(&dokumen(isi)).unwrap();

        // One MediaBox per page object.
        let teks = String::from_utf8_lossy(&pdf);
        assert!(teks.matches("MediaBox").count() > 2);
    }

    #[test]
    fn test_broken_image_is_skipped() {
        let mut d = dokumen(vec![Blok::Paragraf("Isi.".to_string())]);
        d.tanda_tangan.tanda_tangan = Some(vec![0x00, 0x01, 0x02]);
        d.kop.logo = Some(b"bukan gambar".to_vec());
        assert!(render(&d).is_ok());
    }
}
