// src/main.rs
use portal_backend::api::{app_router, AppState};
use portal_backend::config::Config;
use portal_backend::db;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // トレーシングの設定
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_backend=info,tower_http=info".into()),
        )
        .with(fmt::layer())
        .init();

    tracing::info!("Starting portal backend server...");

    // 設定を読み込む
    let app_config = Config::from_env()?;
    tracing::info!(
        server_addr = %app_config.server_addr,
        db_schema = ?app_config.db_schema,
        "Configuration loaded"
    );

    // データベース接続（スキーマ指定時は存在を保証してから接続）
    let db_pool = db::connect(&app_config).await?;
    tracing::info!("Database pool created successfully.");

    let app_state = AppState::new(db_pool);
    let app = app_router(app_state);

    tracing::info!("Router configured. Server listening on {}", app_config.server_addr);

    let listener = TcpListener::bind(&app_config.server_addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
