// 設定ファイル管理
//
// 移行元ワークブック、移行先データベース接続、カラム型オーバーライドを
// 1つの明示的な設定構造体として表現します。プロセス全体の可変状態は持ちません。

use crate::core::error::ConfigError;
use crate::core::schema::ColumnTypeOverrides;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// 既定のバッチサイズ（1回のINSERTトランザクションの行数）
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// データベース方言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[serde(rename = "postgresql")]
    PostgreSQL,
    #[serde(rename = "mysql")]
    MySQL,
    #[serde(rename = "sqlite")]
    SQLite,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::PostgreSQL => write!(f, "postgresql"),
            Dialect::MySQL => write!(f, "mysql"),
            Dialect::SQLite => write!(f, "sqlite"),
        }
    }
}

impl Dialect {
    /// Dialectに応じたデフォルトポートを返す
    ///
    /// - PostgreSQL: 5432
    /// - MySQL: 3306
    /// - SQLite: None（ファイルベースのためポート不要）
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Dialect::PostgreSQL => Some(5432),
            Dialect::MySQL => Some(3306),
            Dialect::SQLite => None,
        }
    }
}

fn default_dialect() -> Dialect {
    Dialect::MySQL
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// 移行設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 設定ファイルのバージョン
    pub version: String,

    /// 移行元ワークブックのパス
    #[serde(default)]
    pub source: PathBuf,

    /// データベース方言
    #[serde(default = "default_dialect")]
    pub dialect: Dialect,

    /// 移行先データベース設定
    pub database: DatabaseConfig,

    /// バッチサイズ
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// カラム型オーバーライド（`table.column` または `column` → 型宣言）
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub column_types: BTreeMap<String, String>,
}

impl Config {
    /// デフォルトの設定ファイルパス
    pub const DEFAULT_CONFIG_PATH: &'static str = crate::core::naming::CONFIG_FILE;

    /// 設定の妥当性を検証
    pub fn validate(&self) -> Result<(), ConfigError> {
        // バージョンチェック
        if self.version.is_empty() {
            return Err(ConfigError::MissingVersion);
        }

        if self.source.as_os_str().is_empty() {
            return Err(ConfigError::MissingSource);
        }

        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }

        self.database.validate()?;

        // 型宣言が解釈できることを確認
        self.column_type_overrides()?;

        Ok(())
    }

    /// 型宣言文字列をカラム型オーバーライドに変換
    pub fn column_type_overrides(&self) -> Result<ColumnTypeOverrides, ConfigError> {
        ColumnTypeOverrides::from_declarations(&self.column_types)
    }
}

/// データベース接続設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// ホスト名（SQLiteの場合は不要）
    #[serde(default = "default_host", skip_serializing_if = "String::is_empty")]
    pub host: String,

    /// ポート番号（Noneの場合はDialectのデフォルトポートを使用）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// データベース名（SQLiteの場合はファイルパス）
    pub database: String,

    /// ユーザー名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// パスワード
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// 文字セット（MySQL）
    #[serde(default = "default_charset")]
    pub charset: String,

    /// 照合順序（MySQL）
    #[serde(default = "default_collation")]
    pub collation: String,

    /// 接続タイムアウト（秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_charset() -> String {
    // §やダッシュなどのマルチバイト文字を保持するためutf8mb4が必須
    "utf8mb4".to_string()
}

fn default_collation() -> String {
    "utf8mb4_unicode_ci".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
            database: String::new(),
            user: None,
            password: None,
            charset: default_charset(),
            collation: default_collation(),
            timeout: None,
        }
    }
}

impl DatabaseConfig {
    /// Dialectに応じた解決済みポート番号を取得
    ///
    /// portがSomeの場合はその値を返し、Noneの場合はDialectのデフォルトポートを返します。
    /// SQLiteなどデフォルトポートがないDialectの場合は0を返します。
    pub fn resolved_port(&self, dialect: Dialect) -> u16 {
        self.port
            .unwrap_or_else(|| dialect.default_port().unwrap_or(0))
    }

    /// Validate database configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.is_empty() {
            return Err(ConfigError::MissingDatabaseName);
        }

        Ok(())
    }
}
