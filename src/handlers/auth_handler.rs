//! handlers/auth_handler.rs
//! Login con cookie firmada y verificación de sesión.

use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    web, HttpRequest, HttpResponse,
};
use serde_json::json;

use crate::models::user_model::{LoginRequest, PublicUser};
use crate::services::auth_service::{AuthService, AUTH_COOKIE, TOKEN_TTL_DAYS};
use crate::services::user_service::UserService;

/// POST /api/auth/login
pub async fn login_endpoint(
    auth_service: web::Data<AuthService>,
    user_service: web::Data<UserService>,
    body: web::Json<LoginRequest>,
) -> HttpResponse {
    let user = match user_service.find_active_by_email(&body.email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpResponse::Unauthorized()
                .json(json!({ "success": false, "message": "Invalid credentials" }));
        }
        Err(e) => {
            log::error!("Error buscando usuario en login: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(json!({ "success": false, "message": "Server error" }));
        }
    };

    if !auth_service.verify_password(&body.password, &user.password_hash) {
        return HttpResponse::Unauthorized()
            .json(json!({ "success": false, "message": "Invalid credentials" }));
    }

    if let Err(e) = user_service.touch_last_login(&user.id).await {
        log::warn!("No se pudo actualizar last_login: {:?}", e);
    }

    match auth_service.generate_token(&user) {
        Ok(token) => {
            let cookie = Cookie::build(AUTH_COOKIE, token)
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .max_age(CookieDuration::days(TOKEN_TTL_DAYS))
                .finish();

            HttpResponse::Ok()
                .cookie(cookie)
                .json(json!({ "success": true, "user": PublicUser::from(&user) }))
        }
        Err(e) => {
            log::error!("Error firmando token: {:?}", e);
            HttpResponse::InternalServerError()
                .json(json!({ "success": false, "message": "Server error" }))
        }
    }
}

/// GET /api/auth/check
pub async fn check_endpoint(auth_service: web::Data<AuthService>, req: HttpRequest) -> HttpResponse {
    match auth_service.user_from_request(&req) {
        Some(claims) => HttpResponse::Ok().json(json!({
            "success": true,
            "user": {
                "id": claims.sub,
                "email": claims.email,
                "role": claims.role
            }
        })),
        None => HttpResponse::Unauthorized().json(json!({ "success": false })),
    }
}
