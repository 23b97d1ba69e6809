use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Una sesión (credencial) guardada, propiedad de un usuario.
/// El `session_string` es secreto: nunca se serializa ni se loguea.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing)]
    pub session_string: String,
    pub owner_name: String,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub last_used: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub session_string: String,
    pub owner_name: String,
    pub phone_number: Option<String>,
}

/// Query string para DELETE /api/sessions?id=...
#[derive(Debug, Deserialize)]
pub struct SessionIdQuery {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckRequest {
    pub session_id: String,
}
