//! tests/auth_tests.rs
//! Pruebas de tokens firmados, hashing de contraseñas y cuentas.

#[cfg(test)]
mod tests {
    use actix_rt::test;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};

    use crate::models::user_model::{Claims, UpdateUserRequest, UserRecord};
    use crate::services::auth_service::AuthService;
    use crate::services::user_service::UserService;

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

    fn sample_user() -> UserRecord {
        UserRecord {
            id: "u1".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: String::new(),
            name: "Ana".to_string(),
            username: Some("ana".to_string()),
            role: "admin".to_string(),
            is_active: true,
            last_login: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    async fn test_token_round_trip() {
        let auth = AuthService::new("secreto-de-prueba".to_string());
        let token = auth.generate_token(&sample_user()).expect("firmar");

        let claims = auth.verify_token(&token).expect("El token debe ser válido");
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.role, "admin");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    async fn test_token_wrong_secret_or_garbage_rejected() {
        let auth = AuthService::new("secreto-de-prueba".to_string());
        let token = auth.generate_token(&sample_user()).expect("firmar");

        let other = AuthService::new("otro-secreto".to_string());
        assert!(other.verify_token(&token).is_none());
        assert!(auth.verify_token("no-es-un-jwt").is_none());
    }

    #[test]
    async fn test_expired_token_rejected() {
        let secret = "secreto-de-prueba";
        let auth = AuthService::new(secret.to_string());

        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "u1".to_string(),
            email: "ana@example.com".to_string(),
            role: "user".to_string(),
            iat: now - 7200,
            exp: now - 3600, // expiró hace una hora
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("firmar");

        assert!(auth.verify_token(&token).is_none());
    }

    #[test]
    async fn test_password_hash_and_verify() {
        let auth = AuthService::new("secreto".to_string());

        let hash = auth.hash_password("hunter2").expect("hash");
        assert_ne!(hash, "hunter2");
        assert!(auth.verify_password("hunter2", &hash));
        assert!(!auth.verify_password("hunter3", &hash));
        assert!(!auth.verify_password("hunter2", "hash-corrupto"));
    }

    #[test]
    async fn test_login_lookup_ignores_inactive_accounts() {
        let pool = test_pool().await;
        let auth = AuthService::new("secreto".to_string());
        let users = UserService::new(pool);

        let hash = auth.hash_password("clave123").expect("hash");
        let user = users
            .create_user("ana@example.com", &hash, "Ana", Some("ana"), "user", None)
            .await
            .expect("create");

        assert!(users.email_exists("ana@example.com").await.expect("exists"));

        let found = users
            .find_active_by_email("ana@example.com")
            .await
            .expect("find")
            .expect("la cuenta activa debe aparecer");
        assert!(auth.verify_password("clave123", &found.password_hash));

        // Desactivada, desaparece del login
        let update = UpdateUserRequest {
            user_id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            username: user.username.clone(),
            role: user.role.clone(),
            is_active: false,
            password: None,
        };
        users.update_user(&update, None).await.expect("update");

        assert!(users
            .find_active_by_email("ana@example.com")
            .await
            .expect("find")
            .is_none());
    }

    #[test]
    async fn test_update_missing_user_returns_none() {
        let users = UserService::new(test_pool().await);

        let update = UpdateUserRequest {
            user_id: "no-existe".to_string(),
            email: "x@example.com".to_string(),
            name: "X".to_string(),
            username: None,
            role: "user".to_string(),
            is_active: true,
            password: None,
        };
        let result = users.update_user(&update, None).await.expect("update");
        assert!(result.is_none());
    }
}
