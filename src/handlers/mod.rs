//! handlers/mod.rs
//! Módulo que agrupa los distintos handlers (auth, sesiones, reportes, etc.).

pub mod analytics_handler;
pub mod auth_handler;
pub mod report_handler;
pub mod session_handler;
pub mod user_handler;
