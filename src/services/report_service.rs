//! services/report_service.rs
//! Persistencia de los lotes de reportes y orquestación del flujo completo:
//! crear el registro en `processing`, delegar en el worker y reconciliar.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};
use uuid::Uuid;

use crate::models::report_model::{CreateReportRequest, ReportRecord, ReportResult};
use crate::models::session_model::SessionRecord;
use crate::services::worker_service::{WorkerAccount, WorkerService};

const REPORT_COLUMNS: &str = "id, user_id, target, target_type, report_reason, report_message, \
     sessions_used, success_count, failure_count, status, results, created_at, updated_at";

/// Resumen que se devuelve al cliente tras un lote completado.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub report_id: String,
    pub total_reports: i64,
    pub success_count: i64,
    pub failure_count: i64,
}

#[derive(Clone)]
pub struct ReportService {
    db_pool: Pool<Sqlite>,
    worker_service: WorkerService,
}

impl ReportService {
    pub fn new(db_pool: Pool<Sqlite>, worker_service: WorkerService) -> Self {
        Self {
            db_pool,
            worker_service,
        }
    }

    /// Orquesta un lote completo. El registro se crea ANTES de invocar el
    /// worker, así queda rastro auditable aunque el proceso externo falle.
    /// Sin reintentos: un fallo del worker falla el lote exactamente una vez.
    pub async fn execute_report(
        &self,
        user_id: &str,
        req: &CreateReportRequest,
        sessions: &[SessionRecord],
    ) -> Result<ReportOutcome> {
        let report_id = self
            .create_processing(user_id, req, sessions.len() as i64)
            .await?;

        let accounts: Vec<WorkerAccount> = sessions
            .iter()
            .map(|s| WorkerAccount {
                session_string: s.session_string.clone(),
                owner_name: s.owner_name.clone(),
            })
            .collect();

        match self
            .worker_service
            .run_report_batch(
                &req.target,
                &accounts,
                &req.report_reason,
                req.reports_per_session,
                req.delay_between_reports,
            )
            .await
        {
            Ok(results) => {
                let success_count = results.iter().filter(|r| r.status == "success").count() as i64;
                let failure_count = results.iter().filter(|r| r.status == "failed").count() as i64;
                let total_reports = sessions.len() as i64 * req.reports_per_session;

                // El worker no puede reportar más resultados que
                // sesiones * reportes por sesión; si lo hace, el protocolo
                // no se respetó y el lote se trata como fallido.
                if success_count + failure_count > total_reports {
                    self.mark_failed(&report_id).await?;
                    return Err(anyhow!(
                        "El worker devolvió {} resultados para un máximo de {}",
                        success_count + failure_count,
                        total_reports
                    ));
                }

                self.mark_completed(&report_id, success_count, failure_count, &results)
                    .await?;

                Ok(ReportOutcome {
                    report_id,
                    total_reports,
                    success_count,
                    failure_count,
                })
            }
            Err(e) => {
                // El registro queda en `failed` con contadores en cero.
                if let Err(update_err) = self.mark_failed(&report_id).await {
                    log::error!(
                        "No se pudo marcar el reporte {} como fallido: {:?}",
                        report_id,
                        update_err
                    );
                }
                Err(e)
            }
        }
    }

    /// Crea el registro del lote en estado `processing`.
    async fn create_processing(
        &self,
        user_id: &str,
        req: &CreateReportRequest,
        sessions_used: i64,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO report_logs (
                id, user_id, target, target_type, report_reason, report_message,
                sessions_used, success_count, failure_count, status, results,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, 'channel', ?4, ?5, ?6, 0, 0, 'processing', '[]', ?7, ?7)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&req.target)
        .bind(&req.report_reason)
        .bind(&req.report_message)
        .bind(sessions_used)
        .bind(&now)
        .execute(&self.db_pool)
        .await
        .context("Fallo al insertar report_log")?;

        Ok(id)
    }

    async fn mark_completed(
        &self,
        report_id: &str,
        success_count: i64,
        failure_count: i64,
        results: &[ReportResult],
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let results_json = serde_json::to_string(results)?;

        sqlx::query(
            r#"
            UPDATE report_logs
            SET status = 'completed',
                success_count = ?2,
                failure_count = ?3,
                results = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(report_id)
        .bind(success_count)
        .bind(failure_count)
        .bind(results_json)
        .bind(&now)
        .execute(&self.db_pool)
        .await
        .context("Fallo al completar report_log")?;

        Ok(())
    }

    async fn mark_failed(&self, report_id: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE report_logs SET status = 'failed', updated_at = ?2 WHERE id = ?1")
            .bind(report_id)
            .bind(&now)
            .execute(&self.db_pool)
            .await
            .context("Fallo al marcar report_log como failed")?;
        Ok(())
    }

    /// Últimos lotes del usuario, más recientes primero.
    pub async fn list_recent(&self, user_id: &str, limit: i64) -> Result<Vec<ReportRecord>> {
        let sql = format!(
            "SELECT {} FROM report_logs WHERE user_id = ?1 ORDER BY created_at DESC LIMIT ?2",
            REPORT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.db_pool)
            .await?;
        rows.iter().map(row_to_report).collect()
    }

    /// Historial completo del usuario, para analytics.
    pub async fn list_all(&self, user_id: &str) -> Result<Vec<ReportRecord>> {
        let sql = format!(
            "SELECT {} FROM report_logs WHERE user_id = ?1 ORDER BY created_at DESC",
            REPORT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.db_pool)
            .await?;
        rows.iter().map(row_to_report).collect()
    }

    /// Busca un lote por id, sólo si pertenece al usuario.
    pub async fn find_owned(&self, user_id: &str, report_id: &str) -> Result<Option<ReportRecord>> {
        let sql = format!(
            "SELECT {} FROM report_logs WHERE id = ?1 AND user_id = ?2",
            REPORT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(report_id)
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await?;
        row.as_ref().map(row_to_report).transpose()
    }
}

fn row_to_report(row: &SqliteRow) -> Result<ReportRecord> {
    let results_json: String = row.get("results");
    let results: Vec<ReportResult> =
        serde_json::from_str(&results_json).context("Resultados corruptos en report_log")?;

    Ok(ReportRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        target: row.get("target"),
        target_type: row.get("target_type"),
        report_reason: row.get("report_reason"),
        report_message: row.get("report_message"),
        sessions_used: row.get("sessions_used"),
        success_count: row.get("success_count"),
        failure_count: row.get("failure_count"),
        status: row.get("status"),
        results,
        created_at: row.get::<String, _>("created_at").parse::<DateTime<Utc>>()?,
        updated_at: row.get::<String, _>("updated_at").parse::<DateTime<Utc>>()?,
    })
}
