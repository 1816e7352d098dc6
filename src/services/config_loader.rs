// 設定ファイル読み込みサービス
//
// core::config の純粋性を保つため、ファイルI/Oと環境変数の適用はこのサービスに集約する。

use crate::core::config::Config;
use crate::services::database_config_resolver::DatabaseConfigResolver;
use anyhow::{Context, Result};
use std::path::Path;

/// 設定ファイル読み込みサービス
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// YAMLファイルから設定を読み込む
    ///
    /// 環境変数による接続設定の上書きを適用したうえで検証します。
    pub fn from_file(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let mut config = Self::from_yaml(&content)?;
        config.database = DatabaseConfigResolver::apply_env_overrides(&config.database);
        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path))?;
        Ok(config)
    }

    /// YAML文字列を解析する（検証は行わない）
    pub fn from_yaml(content: &str) -> Result<Config> {
        serde_saphyr::from_str(content).with_context(|| "Failed to parse config file")
    }

    /// ConfigをYAML文字列に変換
    pub fn to_yaml(config: &Config) -> Result<String> {
        serde_saphyr::to_string(config).with_context(|| "Failed to serialize config file")
    }
}
