// データベース設定の解決サービス
//
// 環境変数による上書きをサービス層で扱い、coreは純粋な構造体に保つ。

use crate::core::config::DatabaseConfig;

/// 上書きに使う環境変数
pub const ENV_HOST: &str = "DB_HOST";
pub const ENV_PORT: &str = "DB_PORT";
pub const ENV_DATABASE: &str = "DB_DATABASE";
pub const ENV_USER: &str = "DB_USER";
pub const ENV_PASSWORD: &str = "DB_PASSWORD";

/// データベース設定の解決ユーティリティ
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfigResolver;

impl DatabaseConfigResolver {
    /// プロセスの環境変数による上書きを適用
    pub fn apply_env_overrides(base: &DatabaseConfig) -> DatabaseConfig {
        Self::apply_overrides(base, |key| std::env::var(key).ok())
    }

    /// 任意の変数ソースによる上書きを適用
    ///
    /// 解釈できないポート番号は無視し、設定ファイルの値を残します。
    pub fn apply_overrides<F>(base: &DatabaseConfig, lookup: F) -> DatabaseConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = base.clone();

        if let Some(host) = lookup(ENV_HOST) {
            config.host = host;
        }
        if let Some(port) = lookup(ENV_PORT).and_then(|p| p.parse::<u16>().ok()) {
            config.port = Some(port);
        }
        if let Some(database) = lookup(ENV_DATABASE) {
            config.database = database;
        }
        if let Some(user) = lookup(ENV_USER) {
            config.user = Some(user);
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            config.password = Some(password);
        }

        config
    }
}
