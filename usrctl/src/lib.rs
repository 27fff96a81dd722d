//! # usrctl: user profile management over PostgreSQL
//!
//! `usrctl` stores user profiles, the login credential that belongs to each profile, and the
//! roles profiles are assigned to. It exposes a small REST API for creating, reading,
//! searching and partially updating profiles.
//!
//! ## Architecture
//!
//! The HTTP layer is built on [Axum](https://github.com/tokio-rs/axum); all persistence goes
//! through [sqlx](https://github.com/launchbadge/sqlx) against PostgreSQL.
//!
//! The **API layer** ([`api`]) validates requests and maps them onto database records.
//!
//! The **database layer** ([`db`]) does the interesting work:
//!
//! - [`db::field_set`] turns the fields a request actually supplied into column, placeholder
//!   and argument lists, so partial writes never touch columns the caller left out.
//! - [`db::handlers::Profiles`] creates a profile and its credential in a single
//!   transaction (role lookup, profile insert, secret hashing, credential insert, commit),
//!   applies partial updates, and composes paginated searches whose count query shares the
//!   page query's predicate.
//! - Every write transaction can be bounded by a deadline; on expiry the transaction is
//!   dropped and rolled back.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use usrctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = usrctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     usrctl::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! Migrations run automatically on startup, or by hand:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! usrctl::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::time::Duration;

use axum::{
    Router,
    http::{self, HeaderValue},
    routing::get,
};
use bon::Builder;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use config::Config;
use openapi::ApiDoc;

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the usrctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Connect the pool described by `config` and bring the schema up to date.
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let settings = &config.database.pool;
    let optional = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(optional(settings.idle_timeout_secs))
        .max_lifetime(optional(settings.max_lifetime_secs))
        .connect(&config.database.url)
        .await?;

    migrator().run(&pool).await?;
    info!("Database migrations applied");

    Ok(pool)
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PATCH])
        .allow_headers([http::header::CONTENT_TYPE]);

    if config.cors_allowed_origins.iter().any(|origin| origin == "*") {
        return Ok(cors.allow_origin(AllowOrigin::any()));
    }

    let origins = config
        .cors_allowed_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(cors.allow_origin(origins))
}

/// Build the application router: profile API under `/api/v1`, health check, API docs, CORS
/// and request tracing.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        .route(
            "/profiles",
            get(api::handlers::profiles::list_profiles).post(api::handlers::profiles::create_profile),
        )
        .route(
            "/profiles/{profile_id}",
            get(api::handlers::profiles::get_profile).patch(api::handlers::profiles::update_profile),
        )
        .with_state(state.clone());

    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance, connecting to the configured database
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create an application on an existing pool (migrations are still applied), or connect
    /// one from the config when `pool` is `None`
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!("Starting usrctl with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => {
                migrator().run(&pool).await?;
                pool
            }
            None => setup_database(&config).await?,
        };

        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(any(test, feature = "test-utils"))]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("usrctl listening on http://{}", bind_addr);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{create_test_app, create_test_config};

    #[sqlx::test]
    #[test_log::test]
    async fn test_healthz_and_docs(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server.get("/healthz").await;
        response.assert_status_ok();
        response.assert_text("OK");

        server.get("/docs").await.assert_status_ok();
    }

    #[test]
    fn test_cors_layer_accepts_wildcard_and_urls() {
        let mut config = create_test_config();
        config.cors_allowed_origins = vec!["*".to_string()];
        assert!(create_cors_layer(&config).is_ok());

        config.cors_allowed_origins = vec!["https://admin.example.com".to_string()];
        assert!(create_cors_layer(&config).is_ok());

        config.cors_allowed_origins = vec!["bad\norigin".to_string()];
        assert!(create_cors_layer(&config).is_err());
    }
}
