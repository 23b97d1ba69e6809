//! services/session_service.rs
//! CRUD de sesiones (credenciales), siempre acotado al usuario dueño.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};
use uuid::Uuid;

use crate::models::session_model::{CreateSessionRequest, SessionRecord};

const SESSION_COLUMNS: &str =
    "id, user_id, session_string, owner_name, phone_number, is_active, last_used, created_at";

#[derive(Clone, Debug)]
pub struct SessionService {
    db_pool: Pool<Sqlite>,
}

impl SessionService {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        SessionService { db_pool }
    }

    /// Corre migraciones con sqlx
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.db_pool).await?;
        Ok(())
    }

    pub async fn create_session(
        &self,
        user_id: &str,
        req: CreateSessionRequest,
    ) -> Result<SessionRecord> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, session_string, owner_name, phone_number, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&req.session_string)
        .bind(&req.owner_name)
        .bind(&req.phone_number)
        .bind(now.to_rfc3339())
        .execute(&self.db_pool)
        .await
        .context("Fallo al insertar session")?;

        Ok(SessionRecord {
            id,
            user_id: user_id.to_string(),
            session_string: req.session_string,
            owner_name: req.owner_name,
            phone_number: req.phone_number,
            is_active: true,
            last_used: None,
            created_at: now,
        })
    }

    /// Sesiones activas del usuario, más recientes primero.
    pub async fn list_active(&self, user_id: &str) -> Result<Vec<SessionRecord>> {
        let sql = format!(
            "SELECT {} FROM sessions WHERE user_id = ?1 AND is_active = 1 ORDER BY created_at DESC",
            SESSION_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.db_pool)
            .await?;
        rows.iter().map(row_to_session).collect()
    }

    /// Todas las sesiones del usuario (activas o no), para analytics.
    pub async fn list_all(&self, user_id: &str) -> Result<Vec<SessionRecord>> {
        let sql = format!(
            "SELECT {} FROM sessions WHERE user_id = ?1 ORDER BY created_at DESC",
            SESSION_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.db_pool)
            .await?;
        rows.iter().map(row_to_session).collect()
    }

    /// Busca una sesión por id, sólo si pertenece al usuario.
    pub async fn find_owned(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<SessionRecord>> {
        let sql = format!(
            "SELECT {} FROM sessions WHERE id = ?1 AND user_id = ?2",
            SESSION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(session_id)
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await?;
        row.as_ref().map(row_to_session).transpose()
    }

    /// Subconjunto explícito: activas, del usuario y con id en la lista.
    pub async fn find_selected(
        &self,
        user_id: &str,
        session_ids: &[String],
    ) -> Result<Vec<SessionRecord>> {
        if session_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = session_ids
            .iter()
            .map(|_| "?")
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM sessions WHERE user_id = ? AND is_active = 1 AND id IN ({}) ORDER BY created_at DESC",
            SESSION_COLUMNS, placeholders
        );

        let mut query = sqlx::query(&sql).bind(user_id);
        for id in session_ids {
            query = query.bind(id);
        }

        let rows = query.fetch_all(&self.db_pool).await?;
        rows.iter().map(row_to_session).collect()
    }

    /// Borrado lógico: sólo apaga `is_active`, el registro queda.
    pub async fn soft_delete(&self, user_id: &str, session_id: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE sessions SET is_active = 0 WHERE id = ?1 AND user_id = ?2")
            .bind(session_id)
            .bind(user_id)
            .execute(&self.db_pool)
            .await
            .context("Fallo al desactivar session")?;
        Ok(result.rows_affected() > 0)
    }

    /// Resultado del probe de salud: actualiza el flag y `last_used`
    /// incondicionalmente, sin importar el estado previo.
    pub async fn set_health(&self, session_id: &str, is_active: bool) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE sessions SET is_active = ?1, last_used = ?2 WHERE id = ?3")
            .bind(is_active)
            .bind(now)
            .bind(session_id)
            .execute(&self.db_pool)
            .await
            .context("Fallo al actualizar salud de la session")?;
        Ok(())
    }
}

fn row_to_session(row: &SqliteRow) -> Result<SessionRecord> {
    let last_used: Option<String> = row.get("last_used");
    Ok(SessionRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        session_string: row.get("session_string"),
        owner_name: row.get("owner_name"),
        phone_number: row.get("phone_number"),
        is_active: row.get::<i64, _>("is_active") != 0,
        last_used: match last_used {
            Some(s) => Some(s.parse::<DateTime<Utc>>()?),
            None => None,
        },
        created_at: row.get::<String, _>("created_at").parse::<DateTime<Utc>>()?,
    })
}
