mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod models;
mod routes;
mod service;

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE}, HeaderValue, Method};
use config::Config;
use db::{db::DBClient, memorydb::MemoryStore, MarketStore};
use dotenv::dotenv;
use routes::create_router;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use tower_http::cors::{AllowOrigin, CorsLayer};

use service::{
    bidding_service::BiddingService, cashout_service::CashoutService, job_service::JobService,
    worker_service::WorkerService,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub store: Arc<dyn MarketStore>,
    pub job_service: Arc<JobService>,
    pub bidding_service: Arc<BiddingService>,
    pub cashout_service: Arc<CashoutService>,
    pub worker_service: Arc<WorkerService>,
}

impl AppState {
    pub fn new(store: Arc<dyn MarketStore>, config: Config) -> Self {
        let retries = config.max_conflict_retries;

        let job_service = Arc::new(JobService::new(
            store.clone(),
            config.settlement_terms(),
            retries,
        ));
        let bidding_service = Arc::new(BiddingService::new(
            store.clone(),
            config.bid_payout_timing,
            retries,
        ));
        let cashout_service = Arc::new(CashoutService::new(store.clone(), retries));
        let worker_service = Arc::new(WorkerService::new(store.clone(), retries));

        Self {
            env: config,
            store,
            job_service,
            bidding_service,
            cashout_service,
            worker_service,
        }
    }
}

fn spawn_pool_monitor(pool: Pool<Postgres>, max_connections: u32) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        loop {
            interval.tick().await;
            let size = pool.size();
            let idle = pool.num_idle() as u32;
            tracing::debug!(
                "Pool status - active: {}, idle: {}, total: {}",
                size.saturating_sub(idle),
                idle,
                size
            );

            if size >= max_connections * 8 / 10 {
                tracing::warn!("Connection pool at 80% capacity, consider raising DB_MAX_CONNECTIONS");
            }
        }
    });
}

async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn MarketStore>> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL is not set; running on the in-memory store, data will not survive a restart");
        return Ok(Arc::new(MemoryStore::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect(database_url)
        .await
        .context("failed to connect to the database")?;

    tracing::info!(
        "Connected to the database (max connections {}, min connections {})",
        config.db_max_connections,
        config.db_min_connections
    );
    spawn_pool_monitor(pool.clone(), config.db_max_connections);

    let db_client = DBClient::new(pool);
    if config.run_migrations {
        db_client.migrate().await.context("failed to run migrations")?;
        tracing::info!("Database migrations applied");
    }

    Ok(Arc::new(db_client))
}

fn cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let allowed_origins = config
        .cors_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin {}", origin))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT]))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::init()?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    let store = connect_store(&config).await?;
    let cors = cors_layer(&config)?;

    let app_state = Arc::new(AppState::new(store, config.clone()));
    let app = create_router(app_state.clone()).layer(cors);

    tracing::info!(
        "Server is running on http://localhost:{} ({} store, commission {}%, bid payout {:?})",
        config.port,
        app_state.store.backend(),
        config.commission_rate,
        config.bid_payout_timing
    );

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;

    axum::serve(listener, app).await?;
    Ok(())
}
