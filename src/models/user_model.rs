use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Usuario del panel. El hash de contraseña nunca sale en las respuestas.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub username: Option<String>,
    pub role: String, // "admin" | "user"
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Proyección pública que devuelven login y el CRUD de usuarios.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub username: Option<String>,
    pub role: String,
}

impl From<&UserRecord> for PublicUser {
    fn from(user: &UserRecord) -> Self {
        PublicUser {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            username: user.username.clone(),
            role: user.role.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub username: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub username: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub password: Option<String>,
}

/// Query string para DELETE /api/users?id=...
#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub id: Option<String>,
}

/// Claims firmados dentro del cookie `auth_token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // id del usuario
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}
