// 接続文字列ビルダー
//
// DatabaseConfig と Dialect から接続文字列を生成する。

use crate::core::config::{DatabaseConfig, Dialect};
use urlencoding::encode;

/// 接続文字列を生成
///
/// ユーザー名とパスワードはパーセントエンコードされます。
/// MySQLの場合は文字セットと照合順序を接続パラメータとして付与し、
/// マルチバイト文字が接続段階で欠落しないようにします。
pub fn build_connection_string(dialect: Dialect, config: &DatabaseConfig) -> String {
    match dialect {
        Dialect::PostgreSQL => {
            let auth = encoded_auth(config, "postgres");
            let port = config.resolved_port(dialect);
            format!(
                "postgresql://{}@{}:{}/{}",
                auth, config.host, port, config.database
            )
        }
        Dialect::MySQL => {
            let auth = encoded_auth(config, "root");
            let port = config.resolved_port(dialect);
            let mut url = format!(
                "mysql://{}@{}:{}/{}",
                auth, config.host, port, config.database
            );

            let params = [("charset", &config.charset), ("collation", &config.collation)]
                .into_iter()
                .filter(|(_, value)| !value.is_empty())
                .map(|(key, value)| format!("{}={}", key, encode(value)))
                .collect::<Vec<_>>();
            if !params.is_empty() {
                url.push('?');
                url.push_str(&params.join("&"));
            }
            url
        }
        Dialect::SQLite => format!("sqlite://{}?mode=rwc", config.database),
    }
}

fn encoded_auth(config: &DatabaseConfig, default_user: &str) -> String {
    let user = encode(config.user.as_deref().unwrap_or(default_user));
    match config.password.as_deref() {
        Some(password) if !password.is_empty() => format!("{}:{}", user, encode(password)),
        _ => user.to_string(),
    }
}
