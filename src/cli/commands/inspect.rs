// inspectコマンドハンドラー
//
// データベースに接続せず、移行で作成されるテーブルスキーマを表示します（ドライラン）。

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::migration::SheetStatus;
use crate::core::schema::TypeOrigin;
use crate::services::sheet_migrator::{SheetMigrator, SheetPlan};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

/// inspectコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct InspectOutput {
    pub sheets: Vec<SheetPlan>,
    #[serde(skip)]
    pub text_message: String,
}

impl CommandOutput for InspectOutput {
    fn to_text(&self) -> String {
        self.text_message.clone()
    }
}

/// inspectコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct InspectCommand {
    pub project_path: PathBuf,
    pub config_path: Option<PathBuf>,
    /// ワークブックパスの上書き
    pub file: Option<PathBuf>,
    pub format: OutputFormat,
}

/// inspectコマンドハンドラー
#[derive(Debug, Default)]
pub struct InspectCommandHandler {}

impl InspectCommandHandler {
    /// 新しいInspectCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// inspectコマンドを実行
    pub fn execute(&self, command: &InspectCommand) -> Result<String> {
        let context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;
        let overrides = context.config.column_type_overrides()?;
        let mut workbook = context.open_workbook(command.file.as_deref())?;

        let sheets = SheetMigrator::new().inspect(&mut workbook, &overrides)?;

        let output = InspectOutput {
            text_message: self.format_plans(&sheets),
            sheets,
        };
        render_output(&output, &command.format)
    }

    /// スキーマ一覧をフォーマット
    pub fn format_plans(&self, plans: &[SheetPlan]) -> String {
        let mut output = String::new();
        output.push_str("=== Inferred Schemas ===\n");

        for plan in plans {
            output.push_str(&format!(
                "\n{} → {} ({} rows)\n",
                plan.sheet_name.bold(),
                plan.schema.table_name.cyan(),
                plan.row_count
            ));

            match plan.status {
                SheetStatus::Skipped => {
                    output.push_str(&format!("  {}\n", "skipped: no data rows".yellow()));
                    continue;
                }
                SheetStatus::Failed => {
                    let detail = plan.detail.as_deref().unwrap_or("unreadable sheet");
                    output.push_str(&format!("  {} {}\n", "✗".red(), detail.red()));
                    continue;
                }
                SheetStatus::Pending | SheetStatus::Loaded => {}
            }

            for column in &plan.schema.columns {
                let origin = match column.origin {
                    TypeOrigin::Override => " (override)".yellow().to_string(),
                    TypeOrigin::Inferred => String::new(),
                };
                output.push_str(&format!(
                    "  {:<30} {}{}",
                    column.name, column.storage_type, origin
                ));
                if column.source_label != column.name {
                    output.push_str(&format!("  ← \"{}\"", column.source_label));
                }
                output.push('\n');
            }
        }

        output
    }
}
