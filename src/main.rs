use axum::Router;
use looproute::config::Config;
use looproute::services::graphhopper::GraphHopperClient;
use looproute::services::overpass::OverpassClient;
use looproute::services::popularity::{HttpPopularityScorer, NoPopularityScorer};
use looproute::services::providers::PopularityScorer;
use looproute::services::route_generator::RouteGenerator;
use looproute::AppState;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "looproute=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| format!("Failed to load configuration: {}", e))?;

    tracing::info!("Starting looproute API server");
    tracing::info!(
        graphhopper = %config.graphhopper_url,
        profile = %config.graphhopper_profile,
        overpass = %config.overpass_url,
        "Configuration loaded successfully"
    );

    // Initialize providers
    let generator_config = config.route_generator.clone();
    let graphhopper = Arc::new(
        GraphHopperClient::new(
            config.graphhopper_url.clone(),
            config.graphhopper_api_key.clone(),
            config.graphhopper_profile.clone(),
        )
        .with_timeout(generator_config.routing_timeout()),
    );
    if config.graphhopper_api_key.is_none() {
        tracing::warn!("GRAPHHOPPER_API_KEY not set; requests will only work against a self-hosted instance");
    }

    let overpass = Arc::new(
        OverpassClient::new(config.overpass_url.clone())
            .with_timeout(generator_config.discovery_timeout()),
    );

    let popularity: Arc<dyn PopularityScorer> = match config.popularity_url {
        Some(ref url) => {
            tracing::info!("Popularity scoring via {}", url);
            Arc::new(
                HttpPopularityScorer::new(url.clone())
                    .with_timeout(generator_config.popularity_timeout()),
            )
        }
        None => {
            tracing::info!("POPULARITY_URL not configured. Popularity scores default to 0.");
            Arc::new(NoPopularityScorer)
        }
    };

    let route_generator = RouteGenerator::new(
        graphhopper.clone(),
        graphhopper,
        overpass,
        popularity,
        generator_config,
    );

    // Create application state
    let state = Arc::new(AppState { route_generator });

    // Build router with CORS and tracing
    let app = Router::new()
        .nest("/api/v1", looproute::routes::create_router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.server_address();
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
