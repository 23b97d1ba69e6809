//! tests/mod.rs
//! Pruebas sobre SQLite en memoria y scripts stub en shell.

pub mod auth_tests;
pub mod report_tests;
