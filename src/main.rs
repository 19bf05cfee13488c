mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::auth::SessionValidator;
use crate::features::comparison::{routes as comparison_routes, ComparisonService};
use crate::features::proofreading::{
    routes as proofreading_routes, GrammarCheckClient, Proofreader, ProofreadingService,
};
use crate::features::uploads::{routes as uploads_routes, PgUploadRepository, UploadService};
use crate::modules::storage::{DocumentStore, LocalDocumentStore};
use axum::{middleware::from_fn_with_state, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "System info: tokio_worker_threads={}, pid={}",
        worker_threads,
        std::process::id()
    );
    tracing::info!("Configuration loaded successfully");

    // Create database connection pool
    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    database::run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    // Document storage
    let local_store = LocalDocumentStore::new(&config.storage);
    local_store
        .ensure_dirs()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to prepare storage directories: {}", e))?;
    let store: Arc<dyn DocumentStore> = Arc::new(local_store);
    tracing::info!(
        "Document storage ready (uploads={}, json={}, generated={})",
        config.storage.uploads_dir.display(),
        config.storage.json_dir.display(),
        config.storage.generated_dir.display()
    );

    // Session verification
    let session_state = middleware::SessionState {
        validator: Arc::new(SessionValidator::new(
            &config.auth.jwt_secret,
            config.auth.jwt_leeway,
        )),
        cookie_name: Arc::from(config.auth.session_cookie_name.as_str()),
    };
    tracing::info!(
        "Session verification initialized (cookie={})",
        config.auth.session_cookie_name
    );

    // Proofreading service client (optional)
    let proofreader: Option<Arc<dyn Proofreader>> = match &config.proofread.base_url {
        Some(base_url) => {
            let client = GrammarCheckClient::new(base_url, config.proofread.timeout)
                .map_err(|e| anyhow::anyhow!("Failed to initialize proofreading client: {}", e))?;
            tracing::info!(
                "Proofreading client initialized: {} (timeout={}s)",
                base_url,
                config.proofread.timeout.as_secs()
            );
            Some(Arc::new(client))
        }
        None => {
            tracing::warn!("PROOFREAD_API_URL not set; server-driven proofreading disabled");
            None
        }
    };

    // Services
    let upload_service = Arc::new(UploadService::new(
        Arc::new(PgUploadRepository::new(pool)),
        Arc::clone(&store),
        config.app.max_upload_size,
    ));
    let proofreading_service = Arc::new(ProofreadingService::new(
        Arc::clone(&upload_service),
        proofreader.clone(),
    ));
    let comparison_service = Arc::new(ComparisonService::new(
        Arc::clone(&upload_service),
        Arc::clone(&store),
        proofreader,
    ));
    tracing::info!("Services initialized");

    if !shared::templates::template_exists("comparison/page.html") {
        anyhow::bail!("Comparison templates failed to load");
    }

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    // Build swagger router
    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn_with_state(
                Arc::new(credentials),
                middleware::basic_auth_middleware,
            ))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Protected routes (require a session)
    let protected_routes = Router::new()
        .merge(uploads_routes::routes(Arc::clone(&upload_service)))
        .merge(proofreading_routes::routes(proofreading_service))
        .merge(comparison_routes::routes(comparison_service))
        .route_layer(from_fn_with_state(
            session_state,
            middleware::session_middleware,
        ));

    // Simple health check endpoint (no auth required)
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let app = Router::new()
        .merge(swagger)
        .merge(protected_routes)
        .merge(health_route)
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
