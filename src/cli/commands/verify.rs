// verifyコマンドハンドラー
//
// 移行先データベースのテーブルと行数を一覧します。

use crate::cli::command_context::CommandContext;
use crate::cli::commands::migrate::format_tables;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::migration::TableVerification;
use crate::services::sheet_migrator::SheetMigrator;
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

/// verifyコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct VerifyOutput {
    pub tables: Vec<TableVerification>,
    #[serde(skip)]
    pub text_message: String,
}

impl CommandOutput for VerifyOutput {
    fn to_text(&self) -> String {
        self.text_message.clone()
    }
}

/// verifyコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct VerifyCommand {
    pub project_path: PathBuf,
    pub config_path: Option<PathBuf>,
    /// 接続タイムアウト（秒）
    pub timeout: Option<u64>,
    pub format: OutputFormat,
}

/// verifyコマンドハンドラー
#[derive(Debug, Default)]
pub struct VerifyCommandHandler {}

impl VerifyCommandHandler {
    /// 新しいVerifyCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// verifyコマンドを実行
    pub async fn execute(&self, command: &VerifyCommand) -> Result<String> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;
        let sink = context.connect_sink(command.timeout).await?;

        let tables = SheetMigrator::new().verify(&sink).await;
        sink.close().await;
        let tables = tables?;

        let text_message = if tables.is_empty() {
            "No tables found.\n".to_string()
        } else {
            format!("=== Tables ===\n\n{}", format_tables(&tables))
        };
        render_output(
            &VerifyOutput {
                tables,
                text_message,
            },
            &command.format,
        )
    }
}
