//! # Server Configuration
//!
//! Application state, router assembly and the HTTP server loop.

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
    routing::{get, patch, post},
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::handlers;
use crate::remote::RemoteDriver;
use crate::repositories::{ConnectionProfileRepository, ProductCodeRepository};
use crate::services::{
    ConnectionTester, InvoiceQueryService, ProductCodeService, ProfileService,
};
use crate::telemetry;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub driver: Arc<dyn RemoteDriver>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, db: DatabaseConnection, driver: Arc<dyn RemoteDriver>) -> Self {
        Self { config, db, driver }
    }

    pub fn profile_service(&self) -> ProfileService {
        ProfileService::new(self.profile_repository(), self.connection_tester())
    }

    pub fn invoice_service(&self) -> InvoiceQueryService {
        InvoiceQueryService::new(
            self.profile_repository(),
            self.driver.clone(),
            self.config.remote_probe_timeout(),
        )
    }

    pub fn product_code_service(&self) -> ProductCodeService {
        ProductCodeService::new(ProductCodeRepository::new(Arc::new(self.db.clone())))
    }

    fn profile_repository(&self) -> ConnectionProfileRepository {
        ConnectionProfileRepository::new(Arc::new(self.db.clone()))
    }

    fn connection_tester(&self) -> ConnectionTester {
        ConnectionTester::new(self.driver.clone(), self.config.connection_test_timeout())
    }
}

/// Routes mounted under `/api/v1`.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/connections",
            post(handlers::connections::create_connection)
                .get(handlers::connections::list_connections),
        )
        .route(
            "/connections/paginated",
            get(handlers::connections::list_connections_paginated),
        )
        .route("/connections/stats", get(handlers::connections::connection_stats))
        .route(
            "/connections/test",
            post(handlers::connections::test_connection_params),
        )
        .route(
            "/connections/{id}",
            get(handlers::connections::get_connection)
                .put(handlers::connections::update_connection)
                .delete(handlers::connections::delete_connection),
        )
        .route(
            "/connections/{id}/soft-delete",
            patch(handlers::connections::soft_delete_connection),
        )
        .route(
            "/connections/{id}/test",
            post(handlers::connections::test_connection),
        )
        .route("/consultar", post(handlers::invoices::query_invoices))
        .route("/consultar/sucursales", get(handlers::invoices::list_branches))
        .route("/codigoproducto", get(handlers::product_codes::list_product_codes))
        .route(
            "/codigoproducto/{codigo}",
            get(handlers::product_codes::get_product_code),
        )
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static("x-requested-with"),
        ]);

    if config.cors_allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(handlers::root))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(telemetry::trace_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Serves the API until Ctrl-C.
pub async fn run_server(
    config: Arc<AppConfig>,
    db: DatabaseConnection,
    driver: Arc<dyn RemoteDriver>,
) -> anyhow::Result<()> {
    let addr = config
        .bind_addr()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let app = create_app(AppState::new(config, db, driver));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, profile = %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::connections::create_connection,
        crate::handlers::connections::list_connections,
        crate::handlers::connections::list_connections_paginated,
        crate::handlers::connections::connection_stats,
        crate::handlers::connections::get_connection,
        crate::handlers::connections::update_connection,
        crate::handlers::connections::delete_connection,
        crate::handlers::connections::soft_delete_connection,
        crate::handlers::connections::test_connection,
        crate::handlers::connections::test_connection_params,
        crate::handlers::invoices::query_invoices,
        crate::handlers::invoices::list_branches,
        crate::handlers::product_codes::list_product_codes,
        crate::handlers::product_codes::get_product_code,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::handlers::HealthStatus,
            crate::handlers::types::ApiMessage,
            crate::handlers::types::ProfileInfo,
            crate::handlers::types::PaginatedProfiles,
            crate::handlers::invoices::InvoiceQueryRequest,
            crate::services::ProfileInput,
            crate::services::TestConnectionRequest,
            crate::services::ProfileStats,
            crate::services::ConnectionTestResult,
            crate::services::InvoiceRow,
            crate::services::BranchRow,
            crate::services::ProductCodeInfo,
            crate::remote::ServerInfo,
        )
    ),
    tags(
        (name = "root", description = "Service information"),
        (name = "connections", description = "Connection profile management"),
        (name = "consultas", description = "Invoice lookups on remote servers"),
        (name = "codigoproducto", description = "Product code catalog"),
    ),
    info(
        title = "Invoice Gateway API",
        description = "Connection profile registry and invoice lookups against remote SQL Server instances",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
