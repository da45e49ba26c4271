// src/db.rs
use crate::config::Config;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use std::time::Duration;

pub type DbPool = DatabaseConnection;

fn connect_options(config: &Config) -> ConnectOptions {
    let mut opt = ConnectOptions::new(config.database_url.clone());

    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8 * 60))
        .sqlx_logging(false);

    opt
}

pub async fn create_db_pool(config: &Config) -> Result<DbPool, DbErr> {
    Database::connect(connect_options(config)).await
}

// スキーマを指定して接続する（プール内の全接続に search_path を設定）
pub async fn create_db_pool_with_schema(config: &Config, schema: &str) -> Result<DbPool, DbErr> {
    let mut opt = connect_options(config);
    opt.set_schema_search_path(schema.to_string());

    Database::connect(opt).await
}

// スキーマが存在しなければ作成する
pub async fn ensure_schema(conn: &DbPool, schema: &str) -> Result<(), DbErr> {
    let create_schema = format!("CREATE SCHEMA IF NOT EXISTS \"{}\";", schema);
    conn.execute(Statement::from_string(
        sea_orm::DatabaseBackend::Postgres,
        create_schema,
    ))
    .await?;
    Ok(())
}

/// 設定に応じた接続プールを作る
pub async fn connect(config: &Config) -> Result<DbPool, DbErr> {
    match &config.db_schema {
        Some(schema) => {
            let base_pool = create_db_pool(config).await?;
            ensure_schema(&base_pool, schema).await?;
            create_db_pool_with_schema(config, schema).await
        }
        None => create_db_pool(config).await,
    }
}
