// コマンド共通コンテキスト
//
// 設定ファイル読み込み、ワークブックのパス解決、データベース接続をCLI層で集約する。

use crate::adapters::database_sink::SqlxDatabaseSink;
use crate::adapters::workbook::XlsxWorkbook;
use crate::core::config::{Config, DatabaseConfig, Dialect};
use crate::core::error::MigrationError;
use crate::services::config_loader::ConfigLoader;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// CLIコマンド共通の実行コンテキスト
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub project_path: PathBuf,
    pub config_path: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// カスタム設定ファイルパスを指定してコンテキストを作成
    pub fn load_with_config(
        project_path: PathBuf,
        custom_config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let config_path = custom_config_path
            .unwrap_or_else(|| project_path.join(Config::DEFAULT_CONFIG_PATH));

        if !config_path.exists() {
            return Err(anyhow!(
                "Config file not found: {:?}. Please create one first with the `init` command.",
                config_path
            ));
        }

        let config =
            ConfigLoader::from_file(&config_path).with_context(|| "Failed to read config file")?;

        Ok(Self {
            project_path,
            config_path,
            config,
        })
    }

    /// データベース方言を取得
    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    /// 移行元ワークブックのパスを解決（`--file` 指定があれば優先）
    ///
    /// 相対パスは設定ファイルのあるディレクトリを基準にします。
    pub fn workbook_path(&self, custom_path: Option<&Path>) -> PathBuf {
        let path = custom_path.unwrap_or(&self.config.source);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        self.config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(&self.project_path)
            .join(path)
    }

    /// ワークブックを開く
    pub fn open_workbook(&self, custom_path: Option<&Path>) -> Result<XlsxWorkbook> {
        let path = self.workbook_path(custom_path);
        XlsxWorkbook::open(&path)
            .map_err(|e| MigrationError::SourceUnavailable {
                path: path.display().to_string(),
                cause: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// タイムアウト上書きを反映したデータベース設定
    pub fn database_config(&self, timeout: Option<u64>) -> DatabaseConfig {
        let mut config = self.config.database.clone();
        if let Some(t) = timeout {
            config.timeout = Some(t);
        }
        config
    }

    /// 移行先データベースに接続
    pub async fn connect_sink(&self, timeout: Option<u64>) -> Result<SqlxDatabaseSink> {
        let db_config = self.database_config(timeout);
        SqlxDatabaseSink::connect(self.dialect(), &db_config)
            .await
            .map_err(|e| MigrationError::DestinationUnavailable {
                cause: e.to_string(),
            })
            .with_context(|| "Failed to connect to database")
    }
}
