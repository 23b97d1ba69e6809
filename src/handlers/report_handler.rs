//! handlers/report_handler.rs
//! Historial y envío de lotes de reportes.

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::models::report_model::{CreateReportRequest, SubmitReportResponse};
use crate::services::auth_service::AuthService;
use crate::services::report_service::ReportService;
use crate::services::session_service::SessionService;

/// GET /api/reports — últimos 50, más recientes primero.
pub async fn list_reports_endpoint(
    auth_service: web::Data<AuthService>,
    report_service: web::Data<ReportService>,
    req: HttpRequest,
) -> HttpResponse {
    let claims = match auth_service.user_from_request(&req) {
        Some(claims) => claims,
        None => {
            return HttpResponse::Unauthorized()
                .json(json!({ "success": false, "message": "Unauthorized" }));
        }
    };

    match report_service.list_recent(&claims.sub, 50).await {
        Ok(reports) => HttpResponse::Ok().json(json!({ "success": true, "reports": reports })),
        Err(e) => HttpResponse::InternalServerError()
            .json(json!({ "success": false, "message": format!("{}", e) })),
    }
}

/// POST /api/reports
/// Valida, resuelve el conjunto de sesiones y orquesta el lote completo.
/// Si el conjunto resuelto queda vacío no se crea ningún registro.
pub async fn submit_report_endpoint(
    auth_service: web::Data<AuthService>,
    session_service: web::Data<SessionService>,
    report_service: web::Data<ReportService>,
    req: HttpRequest,
    body: web::Json<CreateReportRequest>,
) -> HttpResponse {
    let claims = match auth_service.user_from_request(&req) {
        Some(claims) => claims,
        None => {
            return HttpResponse::Unauthorized()
                .json(json!({ "success": false, "message": "Unauthorized" }));
        }
    };

    let request = body.into_inner();

    if request.target.trim().is_empty()
        || request.report_reason.trim().is_empty()
        || request.report_message.trim().is_empty()
    {
        return HttpResponse::BadRequest()
            .json(json!({ "success": false, "message": "Missing required fields" }));
    }

    // Modo "select": subconjunto explícito; si no, todas las activas.
    let sessions = if request.session_mode == "select" && !request.selected_sessions.is_empty() {
        session_service
            .find_selected(&claims.sub, &request.selected_sessions)
            .await
    } else {
        session_service.list_active(&claims.sub).await
    };

    let sessions = match sessions {
        Ok(sessions) => sessions,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({ "success": false, "message": format!("{}", e) }));
        }
    };

    if sessions.is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({ "success": false, "message": "No active sessions found" }));
    }

    log::info!(
        "Lote de reportes contra {} con {} sesiones (x{} reportes)",
        request.target,
        sessions.len(),
        request.reports_per_session
    );

    match report_service
        .execute_report(&claims.sub, &request, &sessions)
        .await
    {
        Ok(outcome) => HttpResponse::Ok().json(SubmitReportResponse {
            success: true,
            report_id: outcome.report_id,
            total_reports: outcome.total_reports,
            success_count: outcome.success_count,
            failure_count: outcome.failure_count,
        }),
        Err(e) => {
            log::error!("Fallo ejecutando lote de reportes: {:?}", e);
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "message": format!("Failed to execute report: {}", e)
            }))
        }
    }
}
