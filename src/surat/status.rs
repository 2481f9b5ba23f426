//! Lifecycle of a surat keluar.
//!
//! The transition rules are pure so the whole graph can be tested without a
//! database; the transactional layer in `db::surat` checks the rule while
//! holding a row lock.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Status of one submission.
///
/// ```text
/// MENGISI_BERKAS -> MENUNGGU_VERIFIKASI -> DIVERIFIKASI -> DISETUJUI -> DITERBITKAN
///                        |                     |
///                   DITOLAK_STAF         DITOLAK_KADES
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[sqlx(type_name = "status_surat", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusSurat {
    MengisiBerkas,
    MenungguVerifikasi,
    Diverifikasi,
    Disetujui,
    Diterbitkan,
    DitolakStaf,
    DitolakKades,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Keputusan {
    Setuju,
    Tolak,
}

/// An action that may move a submission to a new status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AksiSurat {
    AjukanVerifikasi,
    VerifikasiStaf(Keputusan),
    PersetujuanKades(Keputusan),
    Terbitkan,
}

impl StatusSurat {
    /// All statuses, for exhaustive table tests.
    pub const SEMUA: [StatusSurat; 7] = [
        StatusSurat::MengisiBerkas,
        StatusSurat::MenungguVerifikasi,
        StatusSurat::Diverifikasi,
        StatusSurat::Disetujui,
        StatusSurat::Diterbitkan,
        StatusSurat::DitolakStaf,
        StatusSurat::DitolakKades,
    ];

    /// The resulting status if `aksi` is legal from `self`, `None` otherwise.
    /// Rejected states are terminal: there is no resubmission path.
    pub fn transisi(self, aksi: AksiSurat) -> Option<StatusSurat> {
        match (self, aksi) {
            (StatusSurat::MengisiBerkas, AksiSurat::AjukanVerifikasi) => {
                Some(StatusSurat::MenungguVerifikasi)
            }
            (StatusSurat::MenungguVerifikasi, AksiSurat::VerifikasiStaf(Keputusan::Setuju)) => {
                Some(StatusSurat::Diverifikasi)
            }
            (StatusSurat::MenungguVerifikasi, AksiSurat::VerifikasiStaf(Keputusan::Tolak)) => {
                Some(StatusSurat::DitolakStaf)
            }
            (StatusSurat::Diverifikasi, AksiSurat::PersetujuanKades(Keputusan::Setuju)) => {
                Some(StatusSurat::Disetujui)
            }
            (StatusSurat::Diverifikasi, AksiSurat::PersetujuanKades(Keputusan::Tolak)) => {
                Some(StatusSurat::DitolakKades)
            }
            (StatusSurat::Disetujui, AksiSurat::Terbitkan) => Some(StatusSurat::Diterbitkan),
            _ => None,
        }
    }

    /// Attachments may only change while the applicant is still assembling
    /// the submission.
    pub fn bisa_ubah_berkas(self) -> bool {
        self == StatusSurat::MengisiBerkas
    }

    /// A document can be rendered once the head has approved; issuing does
    /// not change renderability.
    pub fn bisa_dirender(self) -> bool {
        matches!(self, StatusSurat::Disetujui | StatusSurat::Diterbitkan)
    }

    pub fn nama(self) -> &'static str {
        match self {
            StatusSurat::MengisiBerkas => "MENGISI_BERKAS",
            StatusSurat::MenungguVerifikasi => "MENUNGGU_VERIFIKASI",
            StatusSurat::Diverifikasi => "DIVERIFIKASI",
            StatusSurat::Disetujui => "DISETUJUI",
            StatusSurat::Diterbitkan => "DITERBITKAN",
            StatusSurat::DitolakStaf => "DITOLAK_STAF",
            StatusSurat::DitolakKades => "DITOLAK_KADES",
        }
    }
}

impl AksiSurat {
    /// Log entry `aksi` column value for this action.
    pub fn nama_log(self) -> &'static str {
        match self {
            AksiSurat::AjukanVerifikasi => "MENGAJUKAN_VERIFIKASI",
            AksiSurat::VerifikasiStaf(Keputusan::Setuju) => "VERIFIKASI_DISETUJUI",
            AksiSurat::VerifikasiStaf(Keputusan::Tolak) => "VERIFIKASI_DITOLAK",
            AksiSurat::PersetujuanKades(Keputusan::Setuju) => "PERSETUJUAN_FINAL",
            AksiSurat::PersetujuanKades(Keputusan::Tolak) => "PERSETUJUAN_DITOLAK",
            AksiSurat::Terbitkan => "SURAT_DITERBITKAN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEMUA_AKSI: [AksiSurat; 6] = [
        AksiSurat::AjukanVerifikasi,
        AksiSurat::VerifikasiStaf(Keputusan::Setuju),
        AksiSurat::VerifikasiStaf(Keputusan::Tolak),
        AksiSurat::PersetujuanKades(Keputusan::Setuju),
        AksiSurat::PersetujuanKades(Keputusan::Tolak),
        AksiSurat::Terbitkan,
    ];

    #[test]
    fn test_happy_path() {
        let mut s = StatusSurat::MengisiBerkas;
        s = s.transisi(AksiSurat::AjukanVerifikasi).unwrap();
        assert_eq!(s, StatusSurat::MenungguVerifikasi);
        s = s.transisi(AksiSurat::VerifikasiStaf(Keputusan::Setuju)).unwrap();
        assert_eq!(s, StatusSurat::Diverifikasi);
        s = s
            .transisi(AksiSurat::PersetujuanKades(Keputusan::Setuju))
            .unwrap();
        assert_eq!(s, StatusSurat::Disetujui);
        s = s.transisi(AksiSurat::Terbitkan).unwrap();
        assert_eq!(s, StatusSurat::Diterbitkan);
    }

    #[test]
    fn test_graph_is_closed() {
        // Exactly six (status, action) pairs are legal; everything else is
        // rejected, so no path can ever return to MENGISI_BERKAS.
        let mut legal = 0;
        for status in StatusSurat::SEMUA {
            for aksi in SEMUA_AKSI {
                if let Some(next) = status.transisi(aksi) {
                    legal += 1;
                    assert_ne!(next, StatusSurat::MengisiBerkas);
                }
            }
        }
        assert_eq!(legal, 6);
    }

    #[test]
    fn test_rejected_states_are_terminal() {
        for status in [StatusSurat::DitolakStaf, StatusSurat::DitolakKades] {
            for aksi in SEMUA_AKSI {
                assert!(status.transisi(aksi).is_none());
            }
        }
    }

    #[test]
    fn test_renderable_states() {
        assert!(StatusSurat::Disetujui.bisa_dirender());
        assert!(StatusSurat::Diterbitkan.bisa_dirender());
        assert!(!StatusSurat::Diverifikasi.bisa_dirender());
        assert!(!StatusSurat::MengisiBerkas.bisa_dirender());
    }

    #[test]
    fn test_double_decision_is_rejected() {
        // A second staff decision after the first one succeeded has no legal
        // transition, whichever way it goes.
        let after = StatusSurat::MenungguVerifikasi
            .transisi(AksiSurat::VerifikasiStaf(Keputusan::Setuju))
            .unwrap();
        assert!(after
            .transisi(AksiSurat::VerifikasiStaf(Keputusan::Setuju))
            .is_none());
        assert!(after
            .transisi(AksiSurat::VerifikasiStaf(Keputusan::Tolak))
            .is_none());
    }
}
