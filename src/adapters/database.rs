// データベース接続アダプター
//
// SQLxを使用したデータベース接続の管理を行います。
// PostgreSQL、MySQL、SQLiteに対応した統一されたインターフェースを提供します。

use crate::adapters::connection_string::build_connection_string;
use crate::core::config::{DatabaseConfig, Dialect};
use crate::core::error::DatabaseError;
use sqlx::pool::PoolOptions;
use sqlx::{Any, AnyPool};
use std::time::Duration;
use tracing::debug;

/// 接続取得の既定タイムアウト（秒）
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// データベース接続サービス
///
/// データベース接続プールの初期化と管理を行います。
#[derive(Debug, Clone, Default)]
pub struct DatabaseConnectionService {}

impl DatabaseConnectionService {
    /// 新しいDatabaseConnectionServiceを作成
    pub fn new() -> Self {
        Self {}
    }

    /// データベース接続プールを作成
    ///
    /// # Arguments
    ///
    /// * `dialect` - データベース方言
    /// * `config` - データベース設定
    ///
    /// # Returns
    ///
    /// 接続プールまたはエラー
    pub async fn create_pool(
        &self,
        dialect: Dialect,
        config: &DatabaseConfig,
    ) -> Result<AnyPool, DatabaseError> {
        let connection_string = build_connection_string(dialect, config);
        debug!(dialect = %dialect, host = %config.host, database = %config.database, "Connecting");

        self.pool_options(dialect, config.timeout)
            .connect(&connection_string)
            .await
            .map_err(|e| DatabaseError::Connection {
                message: format!("データベース接続プールの作成に失敗しました: {}", dialect),
                cause: e.to_string(),
            })
    }

    /// 接続テストを実行
    pub async fn test_connection(&self, pool: &AnyPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1")
            .execute(pool)
            .await
            .map(|_| ())
            .map_err(|e| DatabaseError::Connection {
                message: "データベース接続テストに失敗しました".to_string(),
                cause: e.to_string(),
            })
    }

    /// プールオプションを作成
    ///
    /// SQLiteはファイルロックの競合を避けるため単一接続に制限します。
    pub fn pool_options(&self, dialect: Dialect, timeout_secs: Option<u64>) -> PoolOptions<Any> {
        let max_connections = match dialect {
            Dialect::SQLite => 1,
            Dialect::MySQL | Dialect::PostgreSQL => 5,
        };
        PoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(
                timeout_secs.unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_SECS),
            ))
    }
}
