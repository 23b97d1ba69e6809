//! tests/report_tests.rs
//! Pruebas del puente al worker y de la orquestación de lotes.

#[cfg(test)]
mod tests {
    use std::fs;

    use actix_rt::test;
    use actix_web::cookie::Cookie;
    use actix_web::{test as actix_test, web, App};
    use chrono::Utc;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};
    use tempfile::TempDir;

    use crate::config::worker_config::WorkerConfig;
    use crate::models::report_model::CreateReportRequest;
    use crate::models::session_model::CreateSessionRequest;
    use crate::models::user_model::UserRecord;
    use crate::services::auth_service::{AuthService, AUTH_COOKIE};
    use crate::services::report_service::ReportService;
    use crate::services::session_service::SessionService;
    use crate::services::worker_service::{parse_batch_output, WorkerAccount, WorkerService};

    // Helper: pool en memoria con el esquema migrado.
    // Una sola conexión: con :memory: cada conexión sería otra base.
    async fn test_pool() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("No se pudo abrir SQLite en memoria");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Fallo en migraciones");
        pool
    }

    // Helper: WorkerService apuntando a un script de shell stub.
    fn stub_worker(dir: &TempDir, body: &str) -> WorkerService {
        let script = dir.path().join("worker.sh");
        fs::write(&script, body).expect("No se pudo escribir el script stub");

        let config = WorkerConfig {
            interpreter: "sh".to_string(),
            report_script: script.to_string_lossy().to_string(),
            check_script: script.to_string_lossy().to_string(),
            ..WorkerConfig::default()
        };
        WorkerService::new(config).expect("No se pudo crear WorkerService")
    }

    async fn seed_sessions(service: &SessionService, user_id: &str, names: &[&str]) {
        for name in names {
            service
                .create_session(
                    user_id,
                    CreateSessionRequest {
                        session_string: format!("blob-{}", name),
                        owner_name: name.to_string(),
                        phone_number: None,
                    },
                )
                .await
                .expect("No se pudo crear la sesión");
        }
    }

    fn batch_request(reports_per_session: i64) -> CreateReportRequest {
        CreateReportRequest {
            target: "@foo".to_string(),
            report_reason: "spam".to_string(),
            report_message: "m".to_string(),
            reports_per_session,
            session_mode: "all".to_string(),
            selected_sessions: vec![],
            delay_between_reports: 0,
        }
    }

    #[test]
    async fn test_parse_batch_output_tallies() {
        let accounts = vec![WorkerAccount {
            session_string: "s".to_string(),
            owner_name: "a".to_string(),
        }];

        let stdout = "arrancando worker\n\
                      SUCCESS|a|2/2 reports submitted\n\
                      PROGRESS|a|1/2\n\
                      FAILED|b|blocked\n\
                      ERROR|Script|algo raro\n\
                      linea sin formato\n";

        let results = parse_batch_output(stdout, &accounts);
        assert_eq!(results.len(), 2, "Sólo SUCCESS y FAILED cuentan");
        assert_eq!(results[0].session_name, "a");
        assert_eq!(results[0].status, "success");
        assert_eq!(results[0].message, "2/2 reports submitted");
        assert_eq!(results[1].session_name, "b");
        assert_eq!(results[1].status, "failed");
        assert_eq!(results[1].message, "blocked");
    }

    #[test]
    async fn test_parse_batch_output_empty_message_fallback() {
        let results = parse_batch_output("SUCCESS|a|\nFAILED|b|\n", &[]);
        assert_eq!(results[0].message, "Report submitted");
        assert_eq!(results[1].message, "Failed to submit");
    }

    #[test]
    async fn test_parse_batch_output_extra_pipes_discarded() {
        // Sólo nombre y mensaje; pipes de más no se arrastran al mensaje
        let results = parse_batch_output("SUCCESS|a|ok|extra|cola\nFAILED|b|err|x\n", &[]);
        assert_eq!(results[0].session_name, "a");
        assert_eq!(results[0].message, "ok");
        assert_eq!(results[1].session_name, "b");
        assert_eq!(results[1].message, "err");
    }

    #[test]
    async fn test_parse_batch_output_degenerate_synthesizes_unknown() {
        let accounts = vec![
            WorkerAccount {
                session_string: "s1".to_string(),
                owner_name: "a".to_string(),
            },
            WorkerAccount {
                session_string: "s2".to_string(),
                owner_name: "b".to_string(),
            },
        ];

        let results = parse_batch_output("sin lineas reconocibles\n", &accounts);
        assert_eq!(results.len(), 2, "Un unknown por cuenta");
        for (result, account) in results.iter().zip(&accounts) {
            assert_eq!(result.session_name, account.owner_name);
            assert_eq!(result.status, "unknown");
            assert_eq!(result.message, "No response");
        }
    }

    #[test]
    async fn test_execute_report_reconciles_completed() {
        let pool = test_pool().await;
        let dir = tempfile::tempdir().expect("tempdir");
        // 2 éxitos y 1 fallo, más ruido que debe ignorarse
        let worker = stub_worker(
            &dir,
            "echo 'PROGRESS|a|1/2'\n\
             echo 'SUCCESS|a|ok'\n\
             echo 'SUCCESS|c|ok'\n\
             echo 'FAILED|b|blocked'\n",
        );

        let session_service = SessionService::new(pool.clone());
        seed_sessions(&session_service, "op1", &["a", "b", "c"]).await;
        let sessions = session_service
            .list_active("op1")
            .await
            .expect("list_active");
        assert_eq!(sessions.len(), 3);

        let report_service = ReportService::new(pool.clone(), worker);
        let outcome = report_service
            .execute_report("op1", &batch_request(2), &sessions)
            .await
            .expect("El lote debió completarse");

        assert_eq!(outcome.success_count, 2);
        assert_eq!(outcome.failure_count, 1);
        assert_eq!(outcome.total_reports, 6);

        let record = report_service
            .find_owned("op1", &outcome.report_id)
            .await
            .expect("find_owned")
            .expect("El registro debe existir");
        assert_eq!(record.status, "completed");
        assert_eq!(record.sessions_used, 3);
        assert_eq!(record.success_count, 2);
        assert_eq!(record.failure_count, 1);
        assert_eq!(record.results.len(), 3);
    }

    #[test]
    async fn test_execute_report_no_output_keeps_unknown_results() {
        let pool = test_pool().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let worker = stub_worker(&dir, "echo 'arrancando...'\n");

        let session_service = SessionService::new(pool.clone());
        seed_sessions(&session_service, "op1", &["a", "b"]).await;
        let sessions = session_service
            .list_active("op1")
            .await
            .expect("list_active");

        let report_service = ReportService::new(pool.clone(), worker);
        let outcome = report_service
            .execute_report("op1", &batch_request(1), &sessions)
            .await
            .expect("El lote debió completarse");

        assert_eq!(outcome.success_count, 0);
        assert_eq!(outcome.failure_count, 0);

        let record = report_service
            .find_owned("op1", &outcome.report_id)
            .await
            .expect("find_owned")
            .expect("El registro debe existir");
        assert_eq!(record.status, "completed");
        assert_eq!(record.results.len(), 2);
        assert!(record.results.iter().all(|r| r.status == "unknown"));
        assert!(record.results.iter().all(|r| r.message == "No response"));
    }

    #[test]
    async fn test_execute_report_worker_failure_marks_failed() {
        let pool = test_pool().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let worker = stub_worker(&dir, "exit 3\n");

        let session_service = SessionService::new(pool.clone());
        seed_sessions(&session_service, "op1", &["a"]).await;
        let sessions = session_service
            .list_active("op1")
            .await
            .expect("list_active");

        let report_service = ReportService::new(pool.clone(), worker);
        let result = report_service
            .execute_report("op1", &batch_request(1), &sessions)
            .await;
        assert!(result.is_err(), "El fallo del worker debe propagarse");

        // El registro existe igual, en estado failed y con contadores en cero
        let records = report_service.list_recent("op1", 50).await.expect("list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, "failed");
        assert_eq!(records[0].success_count, 0);
        assert_eq!(records[0].failure_count, 0);
        assert!(records[0].results.is_empty());
    }

    #[test]
    async fn test_execute_report_rejects_overflowing_results() {
        let pool = test_pool().await;
        let dir = tempfile::tempdir().expect("tempdir");
        // 3 resultados para un máximo de 1 (1 sesión x 1 reporte)
        let worker = stub_worker(
            &dir,
            "echo 'SUCCESS|a|ok'\n\
             echo 'SUCCESS|a|ok'\n\
             echo 'SUCCESS|a|ok'\n",
        );

        let session_service = SessionService::new(pool.clone());
        seed_sessions(&session_service, "op1", &["a"]).await;
        let sessions = session_service
            .list_active("op1")
            .await
            .expect("list_active");

        let report_service = ReportService::new(pool.clone(), worker);
        let result = report_service
            .execute_report("op1", &batch_request(1), &sessions)
            .await;
        assert!(result.is_err(), "Más resultados que el máximo es protocolo roto");

        let records = report_service.list_recent("op1", 50).await.expect("list");
        assert_eq!(records[0].status, "failed");
    }

    #[test]
    async fn test_check_session_valid_and_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");

        let worker = stub_worker(&dir, "echo 'VALID|me|12345'\n");
        let valid = worker.check_session("blob").await.expect("check");
        assert!(valid);

        let worker = stub_worker(&dir, "echo 'SESSION_DEAD'\n");
        let valid = worker.check_session("blob").await.expect("check");
        assert!(!valid);
    }

    #[test]
    async fn test_check_session_hung_worker_times_out() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = dir.path().join("colgado.sh");
        fs::write(&script, "sleep 30\necho 'VALID'\n").expect("script");

        let config = WorkerConfig {
            interpreter: "sh".to_string(),
            report_script: script.to_string_lossy().to_string(),
            check_script: script.to_string_lossy().to_string(),
            check_timeout_secs: 1,
            ..WorkerConfig::default()
        };
        let worker = WorkerService::new(config).expect("WorkerService");

        let started = Utc::now();
        let result = worker.check_session("blob").await;
        assert!(result.is_err(), "Un worker colgado debe dar error, no esperar");
        // Devuelve en cuanto vence el plazo, no cuando el script termina
        assert!((Utc::now() - started).num_seconds() < 10);
    }

    #[test]
    async fn test_submit_report_without_sessions_creates_no_record() {
        let pool = test_pool().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let worker = stub_worker(&dir, "echo 'SUCCESS|a|ok'\n");

        let auth_service = AuthService::new("secreto".to_string());
        let session_service = SessionService::new(pool.clone());
        let report_service = ReportService::new(pool.clone(), worker);

        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(auth_service.clone()))
                .app_data(web::Data::new(session_service.clone()))
                .app_data(web::Data::new(report_service.clone()))
                .configure(crate::app::init_app),
        )
        .await;

        let operator = UserRecord {
            id: "op1".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: String::new(),
            name: "Ana".to_string(),
            username: None,
            role: "user".to_string(),
            is_active: true,
            last_login: None,
            created_at: Utc::now(),
        };
        let token = auth_service.generate_token(&operator).expect("firmar");

        // Sin ninguna sesión activa registrada
        let req = actix_test::TestRequest::post()
            .uri("/api/reports")
            .cookie(Cookie::new(AUTH_COOKIE, token.clone()))
            .set_json(json!({
                "target": "@foo",
                "reportReason": "spam",
                "reportMessage": "m",
            }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);

        // Modo select con un id ajeno: el conjunto resuelto también queda vacío
        let req = actix_test::TestRequest::post()
            .uri("/api/reports")
            .cookie(Cookie::new(AUTH_COOKIE, token))
            .set_json(json!({
                "target": "@foo",
                "reportReason": "spam",
                "reportMessage": "m",
                "sessionMode": "select",
                "selectedSessions": ["no-existe"],
            }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);

        // Y no quedó ningún registro de lote
        let records = report_service.list_recent("op1", 50).await.expect("list");
        assert!(records.is_empty());
    }
}
