use axum::{
    routing::{get, post},
    Router,
};
use gamertag_report::config::Config;
use gamertag_report::gamertag::GamertagResolver;
use gamertag_report::handlers::{self, AppState};
use gamertag_report::random::{RandomSource, ThreadRandom};
use gamertag_report::report::ReportAssembler;
use gamertag_report::sources::{PageSource, XboxPublicClient};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration, builds the shared HTTP client
/// used by every page lookup, and serves the report API.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gamertag_report=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // One client for the whole process, shared by the resolver and the assembler
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

    let rng: Arc<dyn RandomSource> = Arc::new(ThreadRandom::new());
    let source: Arc<dyn PageSource> =
        Arc::new(XboxPublicClient::new(http_client, &config, rng.clone()));
    tracing::info!(
        "✓ Page sources configured: {}, {}",
        config.profile_base_url,
        config.achievements_base_url
    );

    let app_state = Arc::new(AppState {
        resolver: GamertagResolver::new(source.clone()),
        assembler: ReportAssembler::new(source, rng),
    });

    // Each report fans out to several upstream requests: 5 req/sec per IP, burst of 10
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(5)
            .burst_size(10)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let protected_routes = Router::new()
        .route("/api/v1/report", post(handlers::create_report))
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(16 * 1024))
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
