//! Letter template registry: reusable document definitions with placeholder
//! bodies, required attachments and a dynamic form schema.

pub mod handlers;
pub mod models;

pub use models::TemplateSurat;
