//! handlers/session_handler.rs
//! CRUD de sesiones (credenciales) y el probe de salud.

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::models::session_model::{CreateSessionRequest, HealthCheckRequest, SessionIdQuery};
use crate::services::auth_service::AuthService;
use crate::services::session_service::SessionService;
use crate::services::worker_service::WorkerService;

/// GET /api/sessions
pub async fn list_sessions_endpoint(
    auth_service: web::Data<AuthService>,
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

    match session_service.list_active(&claims.sub).await {
        Ok(sessions) => HttpResponse::Ok().json(json!({ "success": true, "sessions": sessions })),
        Err(e) => HttpResponse::InternalServerError()
            .json(json!({ "success": false, "message": format!("{}", e) })),
    }
}

/// POST /api/sessions
pub async fn create_session_endpoint(
    auth_service: web::Data<AuthService>,
    session_service: web::Data<SessionService>,
    req: HttpRequest,
    body: web::Json<CreateSessionRequest>,
) -> HttpResponse {
    let claims = match auth_service.user_from_request(&req) {
        Some(claims) => claims,
        None => {
            return HttpResponse::Unauthorized()
                .json(json!({ "success": false, "message": "Unauthorized" }));
        }
    };

    if body.session_string.trim().is_empty() || body.owner_name.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({ "success": false, "message": "Missing required fields" }));
    }

    match session_service
        .create_session(&claims.sub, body.into_inner())
        .await
    {
        Ok(session) => HttpResponse::Ok().json(json!({ "success": true, "session": session })),
        Err(e) => HttpResponse::InternalServerError()
            .json(json!({ "success": false, "message": format!("{}", e) })),
    }
}

/// DELETE /api/sessions?id=...  (borrado lógico)
pub async fn delete_session_endpoint(
    auth_service: web::Data<AuthService>,
    session_service: web::Data<SessionService>,
    req: HttpRequest,
    query: web::Query<SessionIdQuery>,
) -> HttpResponse {
    let claims = match auth_service.user_from_request(&req) {
        Some(claims) => claims,
        None => {
            return HttpResponse::Unauthorized()
                .json(json!({ "success": false, "message": "Unauthorized" }));
        }
    };

    let session_id = match &query.id {
        Some(id) if !id.is_empty() => id.clone(),
        _ => {
            return HttpResponse::BadRequest()
                .json(json!({ "success": false, "message": "Session ID required" }));
        }
    };

    match session_service.soft_delete(&claims.sub, &session_id).await {
        Ok(_) => HttpResponse::Ok().json(json!({ "success": true })),
        Err(e) => HttpResponse::InternalServerError()
            .json(json!({ "success": false, "message": format!("{}", e) })),
    }
}

/// POST /api/session-health
/// Valida una sesión con el worker externo y actualiza su flag,
/// incluso cuando el probe en sí falla (queda inactiva).
pub async fn check_session_endpoint(
    auth_service: web::Data<AuthService>,
    session_service: web::Data<SessionService>,
    worker_service: web::Data<WorkerService>,
    req: HttpRequest,
    body: web::Json<HealthCheckRequest>,
) -> HttpResponse {
    let claims = match auth_service.user_from_request(&req) {
        Some(claims) => claims,
        None => {
            return HttpResponse::Unauthorized()
                .json(json!({ "success": false, "message": "Unauthorized" }));
        }
    };

    let session = match session_service
        .find_owned(&claims.sub, &body.session_id)
        .await
    {
        Ok(Some(session)) => session,
        Ok(None) => {
            return HttpResponse::NotFound()
                .json(json!({ "success": false, "message": "Session not found" }));
        }
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({ "success": false, "message": format!("{}", e) }));
        }
    };

    match worker_service.check_session(&session.session_string).await {
        Ok(is_valid) => {
            if let Err(e) = session_service.set_health(&session.id, is_valid).await {
                log::error!("No se pudo actualizar salud de la sesión: {:?}", e);
            }

            HttpResponse::Ok().json(json!({
                "success": true,
                "isValid": is_valid,
                "message": if is_valid { "Session is active" } else { "Session is invalid" }
            }))
        }
        Err(e) => {
            // Timeout o fallo de ejecución: la sesión se da por inválida.
            log::warn!("Probe de sesión falló: {:?}", e);
            if let Err(e) = session_service.set_health(&session.id, false).await {
                log::error!("No se pudo actualizar salud de la sesión: {:?}", e);
            }

            HttpResponse::Ok().json(json!({
                "success": false,
                "isValid": false,
                "message": "Session check failed"
            }))
        }
    }
}
