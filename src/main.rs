mod core;
mod features;
mod shared;

use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::auth::TokenService;
use crate::features::intake::routes as intake_routes;
use crate::features::intake::routes::IntakeState;
use crate::features::intake::services::address_service::AddressService;
use crate::features::intake::services::classifier_service::ClassifierService;
use crate::features::notifications::channel;
use crate::features::notifications::service::NotificationService;
use crate::features::tickets::routes as tickets_routes;
use crate::features::tickets::routes::TicketsState;
use crate::features::tickets::services::rating_service::RatingService;
use crate::features::tickets::services::stats_service::StatsService;
use crate::features::tickets::services::ticket_service::TicketService;
use crate::shared::cache::ResponseCache;
use crate::shared::llm::LlmClient;
use axum::{middleware::from_fn, Router};
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

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
        worker_threads,
        std::process::id()
    );
    tracing::info!("Configuration loaded successfully");

    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    // Auth: verify-only token service for staff sessions
    let token_service = Arc::new(TokenService::new(&config.auth));
    tracing::info!("Auth token service initialized");

    // LLM client shared by the classifier and the address resolver
    let llm_client = Arc::new(
        LlmClient::new(config.llm.clone())
            .map_err(|e| anyhow::anyhow!("Failed to initialize LLM client: {}", e))?,
    );
    tracing::info!("LLM client initialized (model: {})", config.llm.model);

    let address_service = Arc::new(
        AddressService::new(config.geocoding.clone(), Arc::clone(&llm_client))
            .map_err(|e| anyhow::anyhow!("Failed to initialize address service: {}", e))?,
    );
    let classifier_service = Arc::new(ClassifierService::new(Arc::clone(&llm_client)));
    tracing::info!("Intake services initialized");

    // Notification dispatcher on the configured channel
    let notification_channel = channel::channel_from_config(&config.notify)
        .map_err(|e| anyhow::anyhow!("Failed to initialize notification channel: {}", e))?;
    let notification_service = Arc::new(NotificationService::new(
        pool.clone(),
        notification_channel,
    ));
    tracing::info!(
        "Notification service initialized (provider: {})",
        config.notify.provider
    );

    let ticket_service = Arc::new(TicketService::new(
        pool.clone(),
        Arc::clone(&notification_service),
        config.app.tracking_base_url.clone(),
        config.webhook.photo_host_allowlist.clone(),
    ));
    let rating_service = Arc::new(RatingService::new(
        pool.clone(),
        Arc::clone(&ticket_service),
        Arc::clone(&notification_service),
    ));
    let stats_service = Arc::new(StatsService::new(pool.clone()));
    tracing::info!("Ticket services initialized");

    let cache = Arc::new(ResponseCache::default());

    let tickets_state = TicketsState {
        tickets: Arc::clone(&ticket_service),
        ratings: rating_service,
        stats: stats_service,
        cache: Arc::clone(&cache),
        internal_secret: config.webhook.internal_secret.clone(),
    };

    let intake_state = IntakeState {
        address: address_service,
        classifier: classifier_service,
        tickets: ticket_service,
        notifications: notification_service,
        cache,
        http: reqwest::Client::new(),
    };

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Staff routes behind the session token middleware
    let protected_routes = tickets_routes::staff_routes(tickets_state.clone()).route_layer(
        axum::middleware::from_fn_with_state(token_service.clone(), middleware::auth_middleware),
    );

    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    // Public surface: tracking/rating, internal create, and the
    // platform webhooks
    let public_routes = Router::new()
        .merge(tickets_routes::public_routes(tickets_state))
        .merge(intake_routes::routes(intake_state));

    let app = Router::new()
        .merge(swagger)
        .merge(protected_routes)
        .merge(public_routes)
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
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    socket.set_recv_buffer_size(256 * 1024)?;
    socket.set_send_buffer_size(256 * 1024)?;

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
    socket.listen(65535)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
