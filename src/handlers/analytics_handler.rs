//! handlers/analytics_handler.rs
//! Agregados sobre el historial: overview, serie de 7 días y top de sesiones.

use std::collections::HashMap;

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{Duration, Utc};
use serde_json::json;

use crate::services::auth_service::AuthService;
use crate::services::report_service::ReportService;
use crate::services::session_service::SessionService;

/// GET /api/analytics
pub async fn analytics_endpoint(
    auth_service: web::Data<AuthService>,
    report_service: web::Data<ReportService>,
    session_service: web::Data<SessionService>,
    req: HttpRequest,
) -> HttpResponse {
    let claims = match auth_service.user_from_request(&req) {
        Some(claims) => claims,
        None => {
            return HttpResponse::Unauthorized()
                .json(json!({ "success": false, "message": "Unauthorized" }));
        }
    };

    let reports = match report_service.list_all(&claims.sub).await {
        Ok(reports) => reports,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({ "success": false, "message": format!("{}", e) }));
        }
    };
    let sessions = match session_service.list_all(&claims.sub).await {
        Ok(sessions) => sessions,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({ "success": false, "message": format!("{}", e) }));
        }
    };

    let total_reports = reports.len() as i64;
    let total_success: i64 = reports.iter().map(|r| r.success_count).sum();
    let total_failure: i64 = reports.iter().map(|r| r.failure_count).sum();
    let success_rate = if total_success + total_failure > 0 {
        format!(
            "{:.1}",
            total_success as f64 / (total_success + total_failure) as f64 * 100.0
        )
    } else {
        "0".to_string()
    };

    // Serie de los últimos 7 días (hoy incluido), en orden cronológico.
    let today = Utc::now().date_naive();
    let mut chart_data = Vec::with_capacity(7);
    for i in (0..7).rev() {
        let day = today - Duration::days(i);
        let mut success = 0i64;
        let mut failed = 0i64;
        for report in &reports {
            if report.created_at.date_naive() == day {
                success += report.success_count;
                failed += report.failure_count;
            }
        }
        chart_data.push(json!({
            "date": day.format("%b %-d").to_string(),
            "success": success,
            "failed": failed
        }));
    }

    // Top 5 de sesiones por volumen de resultados individuales.
    let mut session_stats: HashMap<String, (i64, i64)> = HashMap::new();
    for report in &reports {
        for result in &report.results {
            let entry = session_stats
                .entry(result.session_name.clone())
                .or_insert((0, 0));
            if result.status == "success" {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
        }
    }

    let mut top_sessions: Vec<_> = session_stats
        .into_iter()
        .map(|(name, (success, failed))| {
            let total = success + failed;
            json!({
                "name": name,
                "success": success,
                "failed": failed,
                "total": total,
                "rate": format!("{:.1}", success as f64 / total as f64 * 100.0)
            })
        })
        .collect();
    top_sessions.sort_by(|a, b| b["total"].as_i64().cmp(&a["total"].as_i64()));
    top_sessions.truncate(5);

    let active_sessions = sessions.iter().filter(|s| s.is_active).count();

    HttpResponse::Ok().json(json!({
        "success": true,
        "analytics": {
            "overview": {
                "totalReports": total_reports,
                "totalSuccess": total_success,
                "totalFailure": total_failure,
                "successRate": success_rate,
                "activeSessions": active_sessions,
                "totalSessions": sessions.len()
            },
            "chartData": chart_data,
            "topSessions": top_sessions
        }
    }))
}
