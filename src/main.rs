use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use sqlx::{Pool, Sqlite};

use crate::config::worker_config::WorkerConfig;
use crate::logger::init_logger;
use crate::services::auth_service::AuthService;
use crate::services::report_service::ReportService;
use crate::services::session_service::SessionService;
use crate::services::user_service::UserService;
use crate::services::worker_service::WorkerService;

mod app;
mod config;
mod handlers;
mod logger;
mod models;
mod services;
#[cfg(test)]
mod tests;

async fn setup_database() -> Pool<Sqlite> {
    // 1) Crear carpeta "data"
    std::fs::create_dir_all("data").expect("No se pudo crear directorio 'data'");

    // 2) Ruta final: ./data/reports.db
    let db_path = std::env::current_dir()
        .expect("No se pudo obtener el current_dir")
        .join("data")
        .join("reports.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.to_string_lossy());

    log::info!("Conectando a SQLite en {}", db_url);

    // 3) Conectarnos con SQLx
    let db_pool = Pool::<Sqlite>::connect(&db_url)
        .await
        .expect("No se pudo conectar a la base de datos SQLite.");

    db_pool
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let worker_service = WorkerService::new(WorkerConfig::from_env())
        .expect("No se pudo inicializar WorkerService");

    // Conectarnos a la DB
    let db_pool = setup_database().await;

    // SessionService (corre las migraciones del esquema completo)
    let session_service = SessionService::new(db_pool.clone());
    if let Err(e) = session_service.run_migrations().await {
        panic!("Fallo en migraciones: {:?}", e);
    }

    let auth_service = AuthService::from_env();

    // UserService + admin inicial desde el entorno
    let user_service = UserService::new(db_pool.clone());
    if let Err(e) = user_service.ensure_admin(&auth_service).await {
        log::warn!("No se pudo crear el admin inicial: {:?}", e);
    }

    // ReportService orquesta sobre el worker externo
    let report_service = ReportService::new(db_pool.clone(), worker_service.clone());

    // Levantar servidor
    log::info!("Levantando servidor en 0.0.0.0:5030");
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(session_service.clone()))
            .app_data(web::Data::new(report_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(worker_service.clone()))
            .configure(app::init_app)
    })
    .workers(1)
    .bind(("0.0.0.0", 5030))?
    .run()
    .await
}
