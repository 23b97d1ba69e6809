//! config/mod.rs

pub mod worker_config;
