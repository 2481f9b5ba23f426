//! Template body parsing and line wrapping.
//!
//! Template bodies are a constrained HTML subset written by village staff:
//! `<h1>`/`<h2>` headings, `<p>` paragraphs (optionally
//! `<p style="text-align: center">`), `<br>` line breaks, `<b>`/`<strong>`
//! for emphasis and `<hr>` rules. Anything else is stripped to its text.
//! The parser is a single forward scan over tags, no DOM.

/// One positioned block of the letter body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Blok {
    /// Centered bold line, used for headings inside the body.
    Judul(String),
    /// Left-aligned flowing paragraph, wrapped at render time.
    Paragraf(String),
    /// Centered plain line.
    BarisTengah(String),
    /// Horizontal rule across the text width.
    Garis,
}

// "&amp;" goes last so an escaped entity like "&amp;lt;" stays the
// literal text "&lt;" instead of decoding twice into "<".
fn dekode_entitas(teks: &str) -> String {
    teks.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

fn rapikan(teks: &str) -> String {
    dekode_entitas(teks)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn nama_tag(tag: &str) -> &str {
    let isi = tag.trim_start_matches('/');
    isi.split([' ', '\t', '\n', '/'])
        .next()
        .unwrap_or("")
}

/// Split a substituted template body into blocks. Tag case is ignored;
/// unknown tags contribute only their text content.
pub fn pecah_blok(body: &str) -> Vec<Blok> {
    let mut blok = Vec::new();
    let mut teks = String::new();
    // Current container decides where accumulated text lands.
    let mut dalam_judul = false;
    let mut tengah = false;
    let mut sisa = body;

    fn tutup(blok: &mut Vec<Blok>, teks: &mut String, dalam_judul: bool, tengah: bool) {
        let isi = rapikan(teks);
        teks.clear();
        if isi.is_empty() {
            return;
        }
        if dalam_judul {
            blok.push(Blok::Judul(isi));
        } else if tengah {
            blok.push(Blok::BarisTengah(isi));
        } else {
            blok.push(Blok::Paragraf(isi));
        }
    }

    while let Some(buka) = sisa.find('<') {
        teks.push_str(&sisa[..buka]);
        let setelah = &sisa[buka + 1..];
        let Some(akhir) = setelah.find('>') else {
            teks.push_str(&sisa[buka..]);
            sisa = "";
            break;
        };
        let tag_mentah = setelah[..akhir].trim().to_ascii_lowercase();
        sisa = &setelah[akhir + 1..];

        let penutup = tag_mentah.starts_with('/');
        match nama_tag(&tag_mentah) {
            "h1" | "h2" | "h3" => {
                tutup(&mut blok, &mut teks, dalam_judul, tengah);
                dalam_judul = !penutup;
            }
            "p" => {
                tutup(&mut blok, &mut teks, dalam_judul, tengah);
                dalam_judul = false;
                tengah = !penutup && tag_mentah.contains("text-align") && tag_mentah.contains("center");
            }
            "br" => {
                tutup(&mut blok, &mut teks, dalam_judul, tengah);
            }
            "hr" => {
                tutup(&mut blok, &mut teks, dalam_judul, tengah);
                blok.push(Blok::Garis);
            }
            // Emphasis is dropped; block position carries the weight.
            _ => {}
        }
    }
    teks.push_str(sisa);
    tutup(&mut blok, &mut teks, dalam_judul, tengah);

    blok
}

/// Greedy word wrap. Words longer than `maks` get a line of their own
/// rather than being split mid-word.
pub fn bungkus_teks(teks: &str, maks: usize) -> Vec<String> {
    let mut baris = Vec::new();
    let mut saat_ini = String::new();

    for kata in teks.split_whitespace() {
        if saat_ini.is_empty() {
            saat_ini.push_str(kata);
        } else if saat_ini.chars().count() + 1 + kata.chars().count() <= maks {
            saat_ini.push(' ');
            saat_ini.push_str(kata);
        } else {
            baris.push(std::mem::take(&mut saat_ini));
            saat_ini.push_str(kata);
        }
    }
    if !saat_ini.is_empty() {
        baris.push(saat_ini);
    }
    baris
}
