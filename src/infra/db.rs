use crate::types::{AppConfig, InfraError, InfraResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// データベース接続プールを作成
/// 接続先と接続数は`AppConfig`から読み込みます
pub async fn create_pool(config: &AppConfig) -> InfraResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.database_url)
        .await
        .map_err(InfraError::database_connection)
}

/// データベースの初期化（マイグレーション実行）
pub async fn initialize_database(pool: &PgPool) -> InfraResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(InfraError::migration)
}

/// プールの作成とデータベース初期化を一括で行う便利関数
pub async fn setup_database(config: &AppConfig) -> InfraResult<PgPool> {
    let pool = create_pool(config).await?;
    initialize_database(&pool).await?;
    tracing::info!(
        max_connections = config.max_connections,
        "データベースの初期化が完了しました"
    );
    Ok(pool)
}

/// ヘルスチェックの結果
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// データベースへの疎通を確認する
pub async fn health_check(pool: &PgPool) -> InfraResult<HealthStatus> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map_err(|e| InfraError::database_query("ヘルスチェック", e))?;

    Ok(HealthStatus {
        status: "ok",
        timestamp: Utc::now(),
    })
}
