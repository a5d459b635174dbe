use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use todo_backend::{
    AppState,
    cache::{CounterStore, MemoryCounterStore, RedisCounterStore},
    config::Config,
    database::Repositories,
    error::AppError,
    router::create_router,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env()?;

    // 设置记录存储
    let repositories = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .after_connect(|conn, _meta| {
                    Box::pin(async move {
                        conn.execute("SET application_name = 'todo_backend';")
                            .await?;
                        Ok(())
                    })
                })
                .connect(database_url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Connected to Postgres, migrations applied");
            Repositories::postgres(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory record stores");
            Repositories::memory()
        }
    };

    // 设置限流计数器存储
    let store: Arc<dyn CounterStore> = match &config.redis_url {
        Some(redis_url) => {
            tracing::info!("Using Redis rate limit counters");
            Arc::new(RedisCounterStore::open(redis_url)?)
        }
        None => {
            tracing::warn!("REDIS_URL not set, rate limit counters are process-local");
            let memory = Arc::new(MemoryCounterStore::new());
            memory.spawn_purge(config.counter_purge_interval());
            memory
        }
    };

    // 设置应用状态，资源在这里注册
    let state = AppState::new(config.clone(), store, repositories)?;
    let router = create_router(state);

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
