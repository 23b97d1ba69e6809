//! handlers/user_handler.rs
//! CRUD de usuarios, sólo para admins.

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::models::user_model::{Claims, CreateUserRequest, PublicUser, UpdateUserRequest, UserIdQuery};
use crate::services::auth_service::AuthService;
use crate::services::user_service::UserService;

fn admin_from_request(
    auth_service: &AuthService,
    req: &HttpRequest,
) -> Result<Claims, HttpResponse> {
    let claims = match auth_service.user_from_request(req) {
        Some(claims) => claims,
        None => {
            return Err(HttpResponse::Unauthorized()
                .json(json!({ "success": false, "message": "Unauthorized" })));
        }
    };

    if claims.role != "admin" {
        return Err(HttpResponse::Forbidden()
            .json(json!({ "success": false, "message": "Admin access required" })));
    }

    Ok(claims)
}

/// GET /api/users
pub async fn list_users_endpoint(
    auth_service: web::Data<AuthService>,
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> HttpResponse {
    if let Err(resp) = admin_from_request(&auth_service, &req) {
        return resp;
    }

    match user_service.list_users().await {
        Ok(users) => HttpResponse::Ok().json(json!({ "success": true, "users": users })),
        Err(e) => {
            log::error!("Error listando usuarios: {:?}", e);
            HttpResponse::InternalServerError()
                .json(json!({ "success": false, "message": "Failed to fetch users" }))
        }
    }
}

/// POST /api/users
pub async fn create_user_endpoint(
    auth_service: web::Data<AuthService>,
    user_service: web::Data<UserService>,
    req: HttpRequest,
    body: web::Json<CreateUserRequest>,
) -> HttpResponse {
    let claims = match admin_from_request(&auth_service, &req) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };

    match user_service.email_exists(&body.email).await {
        Ok(true) => {
            return HttpResponse::BadRequest()
                .json(json!({ "success": false, "message": "Email already exists" }));
        }
        Ok(false) => {}
        Err(e) => {
            log::error!("Error verificando email: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(json!({ "success": false, "message": "Failed to create user" }));
        }
    }

    let password_hash = match auth_service.hash_password(&body.password) {
        Ok(hash) => hash,
        Err(e) => {
            log::error!("Error hasheando contraseña: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(json!({ "success": false, "message": "Failed to create user" }));
        }
    };

    let role = body.role.as_deref().unwrap_or("user");
    match user_service
        .create_user(
            &body.email,
            &password_hash,
            &body.name,
            body.username.as_deref(),
            role,
            Some(&claims.sub),
        )
        .await
    {
        Ok(user) => {
            HttpResponse::Ok().json(json!({ "success": true, "user": PublicUser::from(&user) }))
        }
        Err(e) => {
            log::error!("Error creando usuario: {:?}", e);
            HttpResponse::InternalServerError()
                .json(json!({ "success": false, "message": "Failed to create user" }))
        }
    }
}

/// PUT /api/users
pub async fn update_user_endpoint(
    auth_service: web::Data<AuthService>,
    user_service: web::Data<UserService>,
    req: HttpRequest,
    body: web::Json<UpdateUserRequest>,
) -> HttpResponse {
    if let Err(resp) = admin_from_request(&auth_service, &req) {
        return resp;
    }

    let request = body.into_inner();

    let password_hash = match &request.password {
        Some(password) if !password.is_empty() => match auth_service.hash_password(password) {
            Ok(hash) => Some(hash),
            Err(e) => {
                log::error!("Error hasheando contraseña: {:?}", e);
                return HttpResponse::InternalServerError()
                    .json(json!({ "success": false, "message": "Failed to update user" }));
            }
        },
        _ => None,
    };

    match user_service.update_user(&request, password_hash).await {
        Ok(Some(user)) => HttpResponse::Ok().json(json!({ "success": true, "user": user })),
        Ok(None) => {
            HttpResponse::NotFound().json(json!({ "success": false, "message": "User not found" }))
        }
        Err(e) => {
            log::error!("Error actualizando usuario: {:?}", e);
            HttpResponse::InternalServerError()
                .json(json!({ "success": false, "message": "Failed to update user" }))
        }
    }
}

/// DELETE /api/users?id=...
pub async fn delete_user_endpoint(
    auth_service: web::Data<AuthService>,
    user_service: web::Data<UserService>,
    req: HttpRequest,
    query: web::Query<UserIdQuery>,
) -> HttpResponse {
    let claims = match admin_from_request(&auth_service, &req) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };

    let user_id = match &query.id {
        Some(id) if !id.is_empty() => id.clone(),
        _ => {
            return HttpResponse::BadRequest()
                .json(json!({ "success": false, "message": "User ID required" }));
        }
    };

    if user_id == claims.sub {
        return HttpResponse::BadRequest()
            .json(json!({ "success": false, "message": "Cannot delete your own account" }));
    }

    // Las cuentas admin no se borran.
    match user_service.find_by_id(&user_id).await {
        Ok(Some(user)) if user.role == "admin" => {
            return HttpResponse::BadRequest()
                .json(json!({ "success": false, "message": "Cannot delete an admin account" }));
        }
        Ok(Some(_)) => {}
        Ok(None) => {
            return HttpResponse::NotFound()
                .json(json!({ "success": false, "message": "User not found" }));
        }
        Err(e) => {
            log::error!("Error buscando usuario: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(json!({ "success": false, "message": "Failed to delete user" }));
        }
    }

    match user_service.delete_user(&user_id).await {
        Ok(_) => HttpResponse::Ok()
            .json(json!({ "success": true, "message": "User deleted successfully" })),
        Err(e) => {
            log::error!("Error borrando usuario: {:?}", e);
            HttpResponse::InternalServerError()
                .json(json!({ "success": false, "message": "Failed to delete user" }))
        }
    }
}
