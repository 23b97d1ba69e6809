//! services/worker_service.rs
//! Puente hacia los scripts externos: escribe la config transitoria,
//! lanza el proceso y traduce su stdout al protocolo de resultados.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde_json::json;
use std::{
    fs,
    path::PathBuf,
    sync::Arc,
    time::Duration,
};
use tokio::{process::Command, time::timeout};
use uuid::Uuid;

use crate::config::worker_config::WorkerConfig;
use crate::models::report_model::ReportResult;

/// Prefijo de carpeta temporal para las configs por invocación
const TEMP_DIR_PREFIX: &str = "report_service";

/// Cuenta (credencial) que se entrega al worker externo.
#[derive(Clone)]
pub struct WorkerAccount {
    pub session_string: String,
    pub owner_name: String,
}

#[derive(Clone)]
pub struct WorkerService {
    interpreter_path: Arc<PathBuf>,
    config: Arc<WorkerConfig>,
    temp_dir: Arc<PathBuf>,
}

impl WorkerService {
    pub fn new(config: WorkerConfig) -> Result<Self> {
        // Carpeta temporal propia; cada invocación usa un archivo único
        // dentro de ella, así dos lotes concurrentes no se pisan la config.
        let temp_dir = std::env::temp_dir().join(format!("{}_{}", TEMP_DIR_PREFIX, Uuid::new_v4()));
        fs::create_dir_all(&temp_dir)?;

        // Verifica que el intérprete esté en PATH
        let interpreter_path = which::which(&config.interpreter)
            .with_context(|| format!("No se encontró '{}' en el sistema", config.interpreter))?;

        Ok(Self {
            interpreter_path: Arc::new(interpreter_path),
            config: Arc::new(config),
            temp_dir: Arc::new(temp_dir),
        })
    }

    /// Ejecuta el lote de reportes contra `target` con todas las cuentas dadas.
    /// Devuelve un resultado por cada línea reconocida del stdout del worker.
    pub async fn run_report_batch(
        &self,
        target: &str,
        accounts: &[WorkerAccount],
        reason: &str,
        reports_per_session: i64,
        delay_between_reports: i64,
    ) -> Result<Vec<ReportResult>> {
        let config_path = self.unique_config_path("report");
        let _cleanup = TempCleanup::new(config_path.clone());

        let payload = json!({
            "Target": target,
            "accounts": accounts
                .iter()
                .map(|a| json!({
                    "Session_String": a.session_string,
                    "OwnerName": a.owner_name,
                }))
                .collect::<Vec<_>>(),
        });
        fs::write(&config_path, serde_json::to_vec_pretty(&payload)?)
            .with_context(|| format!("Error escribiendo config temporal en {:?}", config_path))?;

        let mut cmd = Command::new(&*self.interpreter_path);
        cmd.arg(&self.config.report_script)
            .arg(reason)
            .arg(reports_per_session.to_string())
            .arg(delay_between_reports.to_string())
            .arg(&config_path);

        cmd.stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());
        // Si se vence el plazo, el hijo muere con el future
        cmd.kill_on_drop(true);

        let output = timeout(
            Duration::from_secs(self.config.batch_timeout_secs),
            cmd.output(),
        )
        .await
        .context("Timeout ejecutando el worker de reportes")?
        .context("No se pudo lanzar el worker de reportes")?;

        if !output.status.success() {
            let stderr_msg = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("El worker de reportes falló: {}", stderr_msg));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_batch_output(&stdout, accounts))
    }

    /// Valida una sola sesión contra la plataforma.
    /// `Ok(true)` sólo si el stdout del script contiene "VALID".
    pub async fn check_session(&self, session_string: &str) -> Result<bool> {
        let config_path = self.unique_config_path("check");
        let _cleanup = TempCleanup::new(config_path.clone());

        fs::write(
            &config_path,
            serde_json::to_vec(&json!({ "Session_String": session_string }))?,
        )
        .with_context(|| format!("Error escribiendo config temporal en {:?}", config_path))?;

        let mut cmd = Command::new(&*self.interpreter_path);
        cmd.arg(&self.config.check_script).arg(&config_path);
        cmd.stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());
        cmd.kill_on_drop(true);

        let output = timeout(
            Duration::from_secs(self.config.check_timeout_secs),
            cmd.output(),
        )
        .await
        .context("Timeout validando la sesión")?
        .context("No se pudo lanzar el worker de validación")?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.contains("VALID"))
    }

    fn unique_config_path(&self, kind: &str) -> PathBuf {
        self.temp_dir.join(format!("{}_{}.json", kind, Uuid::new_v4()))
    }
}

/// Parsea el protocolo de stdout del worker, una línea por registro:
/// `SUCCESS|<nombre>|<mensaje>` o `FAILED|<nombre>|<error>`.
/// Cualquier otra línea (PROGRESS, ERROR, ruido) se ignora.
/// Si no se reconoce ninguna, se sintetiza un "unknown" por cuenta para que
/// ningún lote quede con la lista de resultados vacía.
pub fn parse_batch_output(stdout: &str, accounts: &[WorkerAccount]) -> Vec<ReportResult> {
    let mut results = Vec::new();

    for line in stdout.lines() {
        if let Some(rest) = line.strip_prefix("SUCCESS|") {
            let (name, message) = split_record(rest, "Report submitted");
            results.push(ReportResult {
                session_name: name,
                status: "success".to_string(),
                message,
                timestamp: Utc::now(),
            });
        } else if let Some(rest) = line.strip_prefix("FAILED|") {
            let (name, message) = split_record(rest, "Failed to submit");
            results.push(ReportResult {
                session_name: name,
                status: "failed".to_string(),
                message,
                timestamp: Utc::now(),
            });
        }
    }

    if results.is_empty() {
        for account in accounts {
            results.push(ReportResult {
                session_name: account.owner_name.clone(),
                status: "unknown".to_string(),
                message: "No response".to_string(),
                timestamp: Utc::now(),
            });
        }
    }

    results
}

// Sólo cuentan nombre y mensaje; un tercer pipe en adelante se descarta.
fn split_record(rest: &str, fallback: &str) -> (String, String) {
    let mut fields = rest.split('|');
    let name = fields.next().unwrap_or_default().to_string();
    let message = match fields.next() {
        Some(message) if !message.is_empty() => message.to_string(),
        _ => fallback.to_string(),
    };
    (name, message)
}

/// Borra el archivo de config temporal al salir de scope
struct TempCleanup {
    path: PathBuf,
}

impl TempCleanup {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Drop for TempCleanup {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
