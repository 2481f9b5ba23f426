//! Village settings singleton, read by the document renderer for the
//! letterhead.

pub mod handlers;
pub mod models;

pub use models::PengaturanDesa;
