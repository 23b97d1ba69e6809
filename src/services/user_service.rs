//! services/user_service.rs
//! Cuentas de usuarios del panel y bootstrap del admin inicial.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};
use uuid::Uuid;

use crate::models::user_model::{UpdateUserRequest, UserRecord};
use crate::services::auth_service::AuthService;

const USER_COLUMNS: &str =
    "id, email, password_hash, name, username, role, is_active, last_login, created_at";

#[derive(Clone, Debug)]
pub struct UserService {
    db_pool: Pool<Sqlite>,
}

impl UserService {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        UserService { db_pool }
    }

    /// Crea el admin inicial desde ADMIN_EMAIL / ADMIN_PASSWORD si no existe.
    pub async fn ensure_admin(&self, auth_service: &AuthService) -> Result<()> {
        let (email, password) = match (
            std::env::var("ADMIN_EMAIL"),
            std::env::var("ADMIN_PASSWORD"),
        ) {
            (Ok(e), Ok(p)) if !e.is_empty() && !p.is_empty() => (e, p),
            _ => {
                log::info!("ADMIN_EMAIL/ADMIN_PASSWORD sin definir, se omite el bootstrap de admin");
                return Ok(());
            }
        };

        if self.email_exists(&email).await? {
            return Ok(());
        }

        let hash = auth_service.hash_password(&password)?;
        self.create_user(&email, &hash, "Admin", Some("admin"), "admin", None)
            .await?;
        log::info!("Usuario admin inicial creado ({})", email);
        Ok(())
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM users WHERE email = ?1")
            .bind(email)
            .fetch_one(&self.db_pool)
            .await?;
        Ok(row.get::<i64, _>("cnt") > 0)
    }

    /// Sólo cuentas activas; el login no distingue entre "no existe"
    /// y "desactivada".
    pub async fn find_active_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let sql = format!(
            "SELECT {} FROM users WHERE email = ?1 AND is_active = 1",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.db_pool)
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    pub async fn find_by_id(&self, user_id: &str) -> Result<Option<UserRecord>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
        username: Option<&str>,
        role: &str,
        created_by: Option<&str>,
    ) -> Result<UserRecord> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, username, role, is_active, created_by, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8)
            "#,
        )
        .bind(&id)
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(username)
        .bind(role)
        .bind(created_by)
        .bind(now.to_rfc3339())
        .execute(&self.db_pool)
        .await
        .context("Fallo al insertar user")?;

        Ok(UserRecord {
            id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            name: name.to_string(),
            username: username.map(|u| u.to_string()),
            role: role.to_string(),
            is_active: true,
            last_login: None,
            created_at: now,
        })
    }

    pub async fn list_users(&self) -> Result<Vec<UserRecord>> {
        let sql = format!("SELECT {} FROM users ORDER BY created_at DESC", USER_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.db_pool).await?;
        rows.iter().map(row_to_user).collect()
    }

    /// Actualiza la cuenta; `password_hash` sólo si viene contraseña nueva.
    /// None si el id no existe.
    pub async fn update_user(
        &self,
        req: &UpdateUserRequest,
        password_hash: Option<String>,
    ) -> Result<Option<UserRecord>> {
        let result = if let Some(hash) = &password_hash {
            sqlx::query(
                r#"
                UPDATE users
                SET email = ?1, name = ?2, username = ?3, role = ?4, is_active = ?5, password_hash = ?6
                WHERE id = ?7
                "#,
            )
            .bind(&req.email)
            .bind(&req.name)
            .bind(&req.username)
            .bind(&req.role)
            .bind(req.is_active)
            .bind(hash)
            .bind(&req.user_id)
            .execute(&self.db_pool)
            .await
        } else {
            sqlx::query(
                r#"
                UPDATE users
                SET email = ?1, name = ?2, username = ?3, role = ?4, is_active = ?5
                WHERE id = ?6
                "#,
            )
            .bind(&req.email)
            .bind(&req.name)
            .bind(&req.username)
            .bind(&req.role)
            .bind(req.is_active)
            .bind(&req.user_id)
            .execute(&self.db_pool)
            .await
        }
        .context("Fallo al actualizar user")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(&req.user_id).await
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(user_id)
            .execute(&self.db_pool)
            .await
            .context("Fallo al borrar user")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn touch_last_login(&self, user_id: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE users SET last_login = ?1 WHERE id = ?2")
            .bind(&now)
            .bind(user_id)
            .execute(&self.db_pool)
            .await
            .context("Fallo al actualizar last_login")?;
        Ok(())
    }
}

fn row_to_user(row: &SqliteRow) -> Result<UserRecord> {
    let last_login: Option<String> = row.get("last_login");
    Ok(UserRecord {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        name: row.get("name"),
        username: row.get("username"),
        role: row.get("role"),
        is_active: row.get::<i64, _>("is_active") != 0,
        last_login: match last_login {
            Some(s) => Some(s.parse::<DateTime<Utc>>()?),
            None => None,
        },
        created_at: row.get::<String, _>("created_at").parse::<DateTime<Utc>>()?,
    })
}
