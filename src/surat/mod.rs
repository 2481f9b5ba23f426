//! Submission (surat keluar) workflow: models, status state machine,
//! attachment tracking and HTTP handlers.

pub mod berkas;
pub mod handlers;
pub mod models;
pub mod status;

pub use models::{BerkasPersyaratan, SuratKeluar};
pub use status::{AksiSurat, Keputusan, StatusSurat};
