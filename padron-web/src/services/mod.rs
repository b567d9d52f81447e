//! Business workflows

pub mod captura;
pub mod enrollment;
pub mod import_cache;
pub mod ocr_client;
pub mod perfil;
pub mod programas;
pub mod slug;
