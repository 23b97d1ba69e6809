use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Resultado individual de una sesión dentro de un lote.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResult {
    pub session_name: String,
    pub status: String, // "success" | "failed" | "unknown"
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Registro persistido de un lote de reportes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    pub id: String,
    pub user_id: String,
    pub target: String,
    // reservado: hoy siempre queda en "channel"
    pub target_type: String,
    pub report_reason: String,
    pub report_message: String,
    pub sessions_used: i64,
    pub success_count: i64,
    pub failure_count: i64,
    pub status: String, // "pending" | "processing" | "completed" | "failed"
    pub results: Vec<ReportResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_reports_per_session() -> i64 {
    1
}

fn default_session_mode() -> String {
    "all".to_string()
}

fn default_delay() -> i64 {
    2
}

/// Request para POST /api/reports
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    pub target: String,
    pub report_reason: String,
    pub report_message: String,
    #[serde(default = "default_reports_per_session")]
    pub reports_per_session: i64,
    // "all" o "select"
    #[serde(default = "default_session_mode")]
    pub session_mode: String,
    #[serde(default)]
    pub selected_sessions: Vec<String>,
    #[serde(default = "default_delay")]
    pub delay_between_reports: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReportResponse {
    pub success: bool,
    pub report_id: String,
    pub total_reports: i64,
    pub success_count: i64,
    pub failure_count: i64,
}
