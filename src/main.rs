use axum::{Router, Server, http::HeaderValue, middleware::from_fn};
use diesel::{
    PgConnection,
    r2d2::{self, ConnectionManager as DbConnectionManager},
};
use lead_engine::{
    AppState,
    activity::{ActivitySink, RedisActivitySink},
    config::Config,
    db::DbPool,
    error::{AppError, AppResult},
    middleware::{auth::auth_middleware, request_tracking_middleware},
    routes::create_router,
    services::lead_sources::LeadSourceRegistry,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::cors::{Any, CorsLayer};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    lead_engine::init_tracing(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server stopped");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> AppResult<()> {
    let db_config = config.database();
    let manager = DbConnectionManager::<PgConnection>::new(&db_config.url);
    let db: DbPool = r2d2::Pool::builder()
        .max_size(db_config.max_connections)
        .min_idle(Some(db_config.min_connections))
        .connection_timeout(Duration::from_secs(db_config.connection_timeout))
        .build(manager)?;

    let redis = redis::Client::open(config.redis_url.as_str())?;
    let activity: Arc<dyn ActivitySink> = Arc::new(RedisActivitySink::new(redis, &config.activity()));
    let lead_sources = LeadSourceRegistry::from_config(config.lead_sources.as_deref())?;

    let server = config.server();
    let addr: SocketAddr = config
        .server_address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid server address: {}", e)))?;

    let state = Arc::new(AppState::new(db, config, lead_sources, activity));

    let cors = if server.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins = server
            .cors_origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o).ok())
            .collect::<Vec<_>>();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let protected_routes = create_router(state.clone()).layer(
        axum::middleware::from_fn_with_state(state.clone(), auth_middleware),
    );

    let app = Router::new()
        .nest("/api", protected_routes)
        .layer(cors)
        .layer(from_fn(request_tracking_middleware));

    tracing::info!(address = %addr, "Lead engine listening");
    Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))
}
