// migrateコマンドハンドラー
//
// ワークブックの全シートを移行先データベースへロードします。
// - シートごとの結果行（成功・失敗・スキップ）の表示
// - 成功・失敗・スキップ数と所要時間のサマリー
// - ロード後のテーブル行数一覧
//
// 一部のシートが失敗しても正常終了とし、移行元・移行先に到達できない場合のみエラーを返します。
// ロード後の行数確認に失敗してもサマリーは必ず出力します。

use crate::adapters::database_sink::DatabaseSink;
use crate::adapters::workbook::WorkbookReader;
use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::migration::{
    CancellationFlag, MigrationSummary, SheetStatus, TableVerification,
};
use crate::services::sheet_migrator::{MigrationOptions, SheetMigrator};
use anyhow::{anyhow, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, warn};

/// migrateコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct MigrateOutput {
    /// 移行結果のサマリー
    pub summary: MigrationSummary,
    /// ロード後のテーブル行数
    pub verification: Vec<TableVerification>,
    /// 行数確認に失敗した場合の理由
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_error: Option<String>,
    /// テキスト出力メッセージ
    #[serde(skip)]
    pub text_message: String,
}

impl CommandOutput for MigrateOutput {
    fn to_text(&self) -> String {
        self.text_message.clone()
    }
}

/// migrateコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct MigrateCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// ワークブックパスの上書き
    pub file: Option<PathBuf>,
    /// バッチサイズの上書き
    pub batch_size: Option<usize>,
    /// 接続タイムアウト（秒）
    pub timeout: Option<u64>,
    /// 出力フォーマット
    pub format: OutputFormat,
    /// Ctrl-Cで立てられるキャンセルフラグ
    pub cancel: CancellationFlag,
}

/// migrateコマンドハンドラー
#[derive(Debug, Default)]
pub struct MigrateCommandHandler {}

impl MigrateCommandHandler {
    /// 新しいMigrateCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// migrateコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `command` - migrateコマンドのパラメータ
    ///
    /// # Returns
    ///
    /// 成功時は移行結果のレポート、致命的なエラー時はエラーメッセージ
    pub async fn execute(&self, command: &MigrateCommand) -> Result<String> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;

        let batch_size = command.batch_size.unwrap_or(context.config.batch_size);
        if batch_size == 0 {
            return Err(anyhow!("batch_size must be greater than 0"));
        }
        let options = MigrationOptions::new(context.config.column_type_overrides()?, batch_size)
            .with_cancellation(command.cancel.clone());
        debug!(
            overrides = options.overrides.len(),
            batch_size, "Resolved migration options"
        );

        let mut workbook = context.open_workbook(command.file.as_deref())?;
        let sink = context.connect_sink(command.timeout).await?;

        let output = self.run(&mut workbook, &sink, &options).await;
        sink.close().await;
        render_output(&output?, &command.format)
    }

    /// 移行と行数確認を行い、出力を組み立てる
    ///
    /// 行数確認の失敗はレポート内に記録し、エラーにはしません。
    pub async fn run(
        &self,
        workbook: &mut dyn WorkbookReader,
        sink: &dyn DatabaseSink,
        options: &MigrationOptions,
    ) -> Result<MigrateOutput> {
        let migrator = SheetMigrator::new();
        let summary = migrator.migrate(workbook, sink, options).await?;

        // ロードしたテーブルだけを一覧する
        let (verification, verification_error) = match migrator.verify(sink).await {
            Ok(tables) => {
                let loaded = tables
                    .into_iter()
                    .filter(|t| {
                        summary
                            .outcomes
                            .iter()
                            .any(|o| o.success() && o.table_name == t.table_name)
                    })
                    .collect::<Vec<_>>();
                (loaded, None)
            }
            Err(e) => {
                warn!(error = %e, "Verification failed");
                (Vec::new(), Some(e.to_string()))
            }
        };

        let text_message =
            self.format_report(&summary, &verification, verification_error.as_deref());
        Ok(MigrateOutput {
            summary,
            verification,
            verification_error,
            text_message,
        })
    }

    /// 移行結果をフォーマット
    pub fn format_report(
        &self,
        summary: &MigrationSummary,
        verification: &[TableVerification],
        verification_error: Option<&str>,
    ) -> String {
        let mut output = String::new();

        output.push_str("=== Migration ===\n\n");
        for outcome in &summary.outcomes {
            let status = match outcome.status {
                SheetStatus::Loaded => "✓".green().to_string(),
                SheetStatus::Failed => "✗".red().to_string(),
                SheetStatus::Skipped | SheetStatus::Pending => "-".yellow().to_string(),
            };
            let mut line = format!(
                "{} {} → {} ({} rows)",
                status, outcome.sheet_name, outcome.table_name, outcome.row_count
            );
            if let Some(detail) = &outcome.detail {
                if outcome.status == SheetStatus::Skipped {
                    line.push_str(&format!(" [{}]", detail));
                }
            }
            output.push_str(&line);
            output.push('\n');
        }

        let failures: Vec<_> = summary.failures().collect();
        if !failures.is_empty() {
            output.push_str(&format!("\n{}\n", "--- Failures ---".red().bold()));
            for outcome in failures {
                output.push_str(&format!(
                    "  {}: {}\n",
                    outcome.sheet_name,
                    outcome.detail.as_deref().unwrap_or("unknown error").red()
                ));
            }
        }

        output.push_str("\n--- Summary ---\n");
        output.push_str(&format!(
            "Sheets: {} ({}, {}, {})\n",
            summary.total,
            format!("{} succeeded", summary.succeeded).green(),
            if summary.failed > 0 {
                format!("{} failed", summary.failed).red()
            } else {
                format!("{} failed", summary.failed).normal()
            },
            format!("{} skipped", summary.skipped).yellow()
        ));
        output.push_str(&format!("Rows loaded: {}\n", summary.total_rows));
        output.push_str(&format!(
            "Duration: {:.2}s\n",
            summary.duration().num_milliseconds() as f64 / 1000.0
        ));
        if summary.cancelled {
            output.push_str(&format!("{}\n", "Migration was cancelled.".yellow().bold()));
        }

        if let Some(error) = verification_error {
            output.push_str("\n--- Verification ---\n");
            output.push_str(&format!("{} {}\n", "✗ Verification failed:".red(), error));
        } else if !verification.is_empty() {
            output.push_str("\n--- Verification ---\n");
            output.push_str(&format_tables(verification));
        }

        output
    }
}

/// テーブル行数一覧をフォーマット
pub(crate) fn format_tables(tables: &[TableVerification]) -> String {
    let width = tables
        .iter()
        .map(|t| t.table_name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Table".len());

    let mut output = format!("{:<width$}  {:>10}\n", "Table", "Rows", width = width);
    output.push_str(&format!("{}\n", "-".repeat(width + 12)));
    for table in tables {
        output.push_str(&format!(
            "{:<width$}  {:>10}\n",
            table.table_name,
            table.row_count,
            width = width
        ));
    }
    output
}
