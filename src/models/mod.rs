//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod report_model;
pub mod session_model;
pub mod user_model;
