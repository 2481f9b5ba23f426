//! Resident/staff profile data, including signature and stamp image
//! references used by the document renderer.

pub mod handlers;
pub mod models;

pub use models::Profil;
