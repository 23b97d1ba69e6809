//! config/worker_config.rs
//! Configuración de los workers externos (script de lote y script de validación).

use serde::{Deserialize, Serialize};

/// Rutas e intérprete de los scripts externos, con valores por defecto
/// (pueden venir del entorno).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub interpreter: String,   // binario del intérprete, p.ej. "python3"
    pub report_script: String, // script que ejecuta el lote de reportes
    pub check_script: String,  // script que valida una sesión
    pub batch_timeout_secs: u64,
    pub check_timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            interpreter: "python3".to_string(),
            report_script: "python/mass_report.py".to_string(),
            check_script: "python/check_session.py".to_string(),
            batch_timeout_secs: 600,
            check_timeout_secs: 10,
        }
    }
}

impl WorkerConfig {
    /// Lee overrides desde variables de entorno.
    pub fn from_env() -> Self {
        let mut cfg = WorkerConfig::default();
        if let Ok(v) = std::env::var("WORKER_INTERPRETER") {
            cfg.interpreter = v;
        }
        if let Ok(v) = std::env::var("WORKER_REPORT_SCRIPT") {
            cfg.report_script = v;
        }
        if let Ok(v) = std::env::var("WORKER_CHECK_SCRIPT") {
            cfg.check_script = v;
        }
        cfg
    }
}
