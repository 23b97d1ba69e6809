//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod auth_service;
pub mod report_service;
pub mod session_service;
pub mod user_service;
pub mod worker_service;
