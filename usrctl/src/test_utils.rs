//! Test utilities for integration testing (available with `test-utils` feature).

use crate::api::models::profiles::ProfileCreate;
use crate::auth::password::Argon2Params;
use crate::config::{Config, DatabaseConfig, PoolSettings};
use crate::db::{
    handlers::Roles,
    models::roles::{RoleCreateDBRequest, RoleDBResponse},
};
use crate::types::RoleId;
use axum_test::TestServer;
use sqlx::PgPool;

pub async fn create_test_app(pool: PgPool) -> TestServer {
    let config = create_test_config();

    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: None,
        database: DatabaseConfig {
            // The pool is injected by the test harness
            url: "postgres://unused".to_string(),
            pool: PoolSettings {
                max_connections: 1,
                min_connections: 0,
                ..Default::default()
            },
        },
        password: Argon2Params::fast(),
        ..Default::default()
    }
}

pub async fn create_test_role(pool: &PgPool, role_name: &str) -> RoleDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut roles = Roles::new(&mut conn);
    roles
        .create(&RoleCreateDBRequest::new(role_name))
        .await
        .expect("Failed to create test role")
}

/// A minimal valid create request: "Ann" with `<username>@x.com` and password `pw123`.
pub fn sample_profile_create(role_id: RoleId, username: &str) -> ProfileCreate {
    ProfileCreate {
        role_id,
        full_name: "Ann".to_string(),
        email: format!("{username}@x.com"),
        username: username.to_string(),
        password: "pw123".to_string(),
        gender: None,
        dob: None,
        mobile_no: None,
        address: None,
        status: None,
        created_by: None,
    }
}
