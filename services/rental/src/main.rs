use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod error;
mod jwt;
mod middleware;
mod models;
mod notifier;
mod oauth;
mod payments;
mod repositories;
mod routes;
mod scheduler;
mod state;
mod stats;
mod validation;
mod ws;

use common::{cache, database};

use crate::jwt::{JwtConfig, JwtService};
use crate::notifier::NotificationService;
use crate::oauth::{KakaoOAuthClient, KakaoOAuthConfig};
use crate::payments::{KakaoPayConfig, KakaoPayService};
use crate::repositories::{
    CatalogRepository, NoticeRepository, NotificationRepository, PaymentMethodRepository,
    ReservationRepository, UserRepository,
};
use crate::state::AppState;
use crate::stats::StatsService;
use crate::ws::NotificationHub;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting rental service");

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied");

    // Initialize Redis connection pool
    let redis_config = cache::RedisConfig::from_env()?;
    let redis_pool = cache::RedisPool::new(&redis_config).await?;

    // Services
    let jwt = JwtService::new(&JwtConfig::from_env()?);
    let oauth = KakaoOAuthClient::new(&KakaoOAuthConfig::from_env())?;
    let payments = KakaoPayService::new(KakaoPayConfig::from_env());

    // Repositories
    let users = UserRepository::new(pool.clone());
    let reservations = ReservationRepository::new(pool.clone());
    let notifications = NotificationRepository::new(pool.clone());
    let catalog = CatalogRepository::new(pool.clone());
    let payment_methods = PaymentMethodRepository::new(pool.clone());
    let notices = NoticeRepository::new(pool.clone());

    let hub = NotificationHub::new();
    let notifier = NotificationService::new(notifications.clone(), hub.clone());
    let stats = StatsService::new(
        reservations.clone(),
        users.clone(),
        catalog.clone(),
        redis_pool.clone(),
    );

    // Background jobs: notification dispatcher + stats cache evictions. The
    // scheduler handle must stay alive for the jobs to keep firing.
    let _scheduler = scheduler::start_jobs(notifier.clone(), stats.clone()).await?;

    let app_state = AppState {
        db_pool: pool,
        redis_pool,
        jwt,
        oauth,
        users,
        reservations,
        notifications,
        catalog,
        payment_methods,
        notices,
        notifier,
        payments,
        hub,
        stats,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_addr =
        std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Rental service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
