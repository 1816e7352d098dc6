// initコマンドハンドラー
//
// 設定ファイルのテンプレート（.strata-sheets.yaml）を生成します。
// - 既存の設定ファイルの検出と上書き防止
// - パスワードを含み得る設定ファイルの.gitignore確認

use crate::core::config::{Config, DatabaseConfig, Dialect, DEFAULT_BATCH_SIZE};
use crate::services::config_loader::ConfigLoader;
use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// initコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct InitCommand {
    /// 設定ファイルを置くディレクトリ
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// データベース方言
    pub dialect: Dialect,
    /// 移行元ワークブックのパス
    pub source: PathBuf,
    /// データベース名
    pub database_name: String,
    /// 強制的に上書き
    pub force: bool,
}

/// initコマンドハンドラー
#[derive(Debug, Default)]
pub struct InitCommandHandler {}

impl InitCommandHandler {
    /// 新しいInitCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// initコマンドを実行
    ///
    /// # Returns
    ///
    /// 成功時は書き込んだ設定ファイルのパス
    pub fn execute(&self, command: &InitCommand) -> Result<PathBuf> {
        let config_path = command
            .config_path
            .clone()
            .unwrap_or_else(|| command.project_path.join(Config::DEFAULT_CONFIG_PATH));

        if config_path.exists() && !command.force {
            return Err(anyhow!(
                "Config file already exists: {:?}. Use --force option to overwrite it.",
                config_path
            ));
        }

        let yaml = ConfigLoader::to_yaml(&self.template(command))?;
        fs::write(&config_path, yaml)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        if command.dialect != Dialect::SQLite {
            self.warn_gitignore(&command.project_path);
        }

        Ok(config_path)
    }

    /// 設定テンプレートを作成
    pub fn template(&self, command: &InitCommand) -> Config {
        let database = match command.dialect {
            Dialect::SQLite => DatabaseConfig {
                host: String::new(),
                database: command.database_name.clone(),
                ..Default::default()
            },
            _ => DatabaseConfig {
                database: command.database_name.clone(),
                user: Some("root".to_string()),
                timeout: Some(30),
                ..Default::default()
            },
        };

        Config {
            version: "1.0".to_string(),
            source: command.source.clone(),
            dialect: command.dialect,
            database,
            batch_size: DEFAULT_BATCH_SIZE,
            column_types: BTreeMap::new(),
        }
    }

    /// .gitignoreに設定ファイルが含まれているかチェックし、警告を出力
    fn warn_gitignore(&self, project_path: &Path) {
        let config_file_name = Config::DEFAULT_CONFIG_PATH;
        let gitignore_path = project_path.join(".gitignore");

        let listed = fs::read_to_string(&gitignore_path)
            .map(|content| {
                content.lines().any(|line| {
                    let trimmed = line.trim();
                    trimmed == config_file_name || trimmed == format!("/{}", config_file_name)
                })
            })
            .unwrap_or(false);

        if !listed {
            eprintln!(
                "Warning: '{}' is not listed in .gitignore. Consider supplying the password through the DB_PASSWORD environment variable instead.",
                config_file_name
            );
        }
    }
}
