//! app.rs
use crate::handlers::{
    analytics_handler, auth_handler, report_handler, session_handler, user_handler,
};
use actix_web::web;

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/auth")
                    .route("/login", web::post().to(auth_handler::login_endpoint))
                    .route("/check", web::get().to(auth_handler::check_endpoint)),
            )
            .service(
                web::scope("/sessions")
                    .route("", web::get().to(session_handler::list_sessions_endpoint))
                    .route("", web::post().to(session_handler::create_session_endpoint))
                    .route(
                        "",
                        web::delete().to(session_handler::delete_session_endpoint),
                    ),
            )
            .service(
                web::scope("/session-health")
                    .route("", web::post().to(session_handler::check_session_endpoint)),
            )
            .service(
                web::scope("/reports")
                    .route("", web::get().to(report_handler::list_reports_endpoint))
                    .route("", web::post().to(report_handler::submit_report_endpoint)),
            )
            .service(
                web::scope("/analytics")
                    .route("", web::get().to(analytics_handler::analytics_endpoint)),
            )
            .service(
                web::scope("/users")
                    .route("", web::get().to(user_handler::list_users_endpoint))
                    .route("", web::post().to(user_handler::create_user_endpoint))
                    .route("", web::put().to(user_handler::update_user_endpoint))
                    .route("", web::delete().to(user_handler::delete_user_endpoint)),
            ),
    );
}
