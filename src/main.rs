// src/main.rs

use dotenvy::dotenv;
use lms::cache::{Cache, RedisCache, redis_store};
use lms::config::Config;
use lms::routes;
use lms::state::AppState;
use lms::utils::hash::hash_password;
use lms::utils::jwt::ROLE_ADMIN;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "lms.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Initialize Database Pool with Retry
    let mut retry_count = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    if let Err(e) = seed_admin_user(&pool, &config).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    if config.collab_doc_pool.is_empty() {
        tracing::warn!("COLLAB_DOC_POOL is empty, new lectures get no collaboration doc");
    }

    let cache = build_cache(&config).await;

    let state = AppState {
        pool: pool.clone(),
        config: config.clone(),
        cache,
    };

    let app = routes::create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listening address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}

async fn build_cache(config: &Config) -> Cache {
    let ttl = Some(Duration::from_secs(config.cache_ttl_secs));

    if let Some(redis_url) = &config.redis_url {
        match redis_store::connect(redis_url).await {
            Ok(connection) => {
                tracing::info!("Using Redis cache store");
                return Cache::new(Arc::new(RedisCache::new(connection, ttl)));
            }
            Err(e) => tracing::error!("Redis unavailable, falling back to in-memory cache: {}", e),
        }
    }

    Cache::in_memory(ttl)
}

async fn seed_admin_user(pool: &PgPool, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
        let user_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(pool)
            .await?;

        if user_exists.is_none() {
            tracing::info!("Seeding admin user: {}", username);
            let hashed_password = hash_password(password)?;

            let mut tx = pool.begin().await?;
            let id: i64 = sqlx::query_scalar(
                "INSERT INTO users (username, password, role) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(username)
            .bind(hashed_password)
            .bind(ROLE_ADMIN)
            .fetch_one(&mut *tx)
            .await?;
            sqlx::query("INSERT INTO user_profiles (user_id) VALUES ($1)")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            tracing::info!("Admin user created successfully.");
        }
    }
    Ok(())
}
