// シート移行サービス
//
// ワークブックの全シートをワークブック順に1つずつ移行する実行のエントリーポイント。
// シートごとの失敗は結果として記録し、移行元・移行先に到達できない場合のみ実行全体を中断します。

use crate::adapters::database_sink::DatabaseSink;
use crate::adapters::workbook::WorkbookReader;
use crate::core::config::DEFAULT_BATCH_SIZE;
use crate::core::error::MigrationError;
use crate::core::migration::{
    CancellationFlag, MigrationOutcome, MigrationSummary, SheetStatus, TableVerification,
    SKIPPED_CANCELLED, SKIPPED_EMPTY,
};
use crate::core::naming::{NameKind, NameRegistry};
use crate::core::schema::{ColumnTypeOverrides, TableSchema};
use crate::services::migration_report;
use crate::services::schema_builder::SchemaBuilder;
use crate::services::table_loader::TableLoader;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

/// 移行オプション
#[derive(Debug, Clone)]
pub struct MigrationOptions {
    /// カラム型オーバーライド
    pub overrides: ColumnTypeOverrides,
    /// 1トランザクションあたりの行数
    pub batch_size: usize,
    /// キャンセルフラグ
    pub cancel: CancellationFlag,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            overrides: ColumnTypeOverrides::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            cancel: CancellationFlag::new(),
        }
    }
}

impl MigrationOptions {
    pub fn new(overrides: ColumnTypeOverrides, batch_size: usize) -> Self {
        Self {
            overrides,
            batch_size,
            ..Default::default()
        }
    }

    /// 外部から操作するキャンセルフラグを設定
    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }
}

/// ドライランで得られるシートの移行計画
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetPlan {
    pub sheet_name: String,
    pub row_count: usize,
    /// 空シートはSkipped、読み込めないシートはFailed、それ以外はPending
    pub status: SheetStatus,
    pub schema: TableSchema,
    /// 読み込みに失敗した理由
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// シート移行サービス
#[derive(Debug, Clone, Default)]
pub struct SheetMigrator {
    schema_builder: SchemaBuilder,
}

impl SheetMigrator {
    /// 新しいSheetMigratorを作成
    pub fn new() -> Self {
        Self {
            schema_builder: SchemaBuilder::new(),
        }
    }

    /// ワークブックの全シートを移行
    ///
    /// # Arguments
    ///
    /// * `reader` - 移行元ワークブック
    /// * `sink` - 移行先データベース
    /// * `options` - オーバーライド、バッチサイズ、キャンセルフラグ
    ///
    /// # Returns
    ///
    /// 全シートの結果を集計したサマリー。シート一覧が取得できない場合のみエラー
    pub async fn migrate(
        &self,
        reader: &mut dyn WorkbookReader,
        sink: &dyn DatabaseSink,
        options: &MigrationOptions,
    ) -> Result<MigrationSummary, MigrationError> {
        let started_at = Utc::now();
        let source = reader.source_name();
        let sheets = reader
            .list_sheets()
            .map_err(|e| MigrationError::SourceUnavailable {
                path: source.clone(),
                cause: e.to_string(),
            })?;

        info!(source = %source, sheets = sheets.len(), "Starting migration");

        let loader = TableLoader::new(options.batch_size);
        let mut tables = NameRegistry::new();
        let mut outcomes = Vec::with_capacity(sheets.len());

        for (index, sheet_name) in sheets.iter().enumerate() {
            let table_name = tables.claim(sheet_name, NameKind::Table);

            let outcome = if options.cancel.is_cancelled() {
                MigrationOutcome::skipped(sheet_name, &table_name, SKIPPED_CANCELLED)
            } else {
                info!(
                    sheet = %sheet_name,
                    table = %table_name,
                    "[{}/{}] Migrating sheet",
                    index + 1,
                    sheets.len()
                );
                self.migrate_sheet(reader, sink, &loader, sheet_name, &table_name, options)
                    .await
            };

            log_outcome(&outcome);
            outcomes.push(outcome);
        }

        let mut summary = migration_report::aggregate(outcomes, started_at, Utc::now());
        // 最終シートのバッチ間で中断された場合も中断扱い
        summary.cancelled |= options.cancel.is_cancelled();
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            rows = summary.total_rows,
            "Migration finished"
        );
        Ok(summary)
    }

    async fn migrate_sheet(
        &self,
        reader: &mut dyn WorkbookReader,
        sink: &dyn DatabaseSink,
        loader: &TableLoader,
        sheet_name: &str,
        table_name: &str,
        options: &MigrationOptions,
    ) -> MigrationOutcome {
        let sheet = match reader.read_sheet(sheet_name) {
            Ok(sheet) => sheet,
            Err(e) => {
                let error = MigrationError::SchemaOrLoad {
                    sheet: sheet_name.to_string(),
                    cause: e.to_string(),
                };
                return MigrationOutcome::failed(
                    sheet_name,
                    table_name,
                    0,
                    error.to_string(),
                    chrono::Duration::zero(),
                );
            }
        };

        // 空シートには型推論を行わない
        if sheet.is_empty() {
            let reason = MigrationError::SheetEmpty {
                sheet: sheet_name.to_string(),
            };
            debug!("{}", reason);
            return MigrationOutcome::skipped(sheet_name, table_name, SKIPPED_EMPTY);
        }

        let schema = self
            .schema_builder
            .build(table_name, &sheet.columns, &options.overrides);
        loader.load(&sheet, &schema, sink, &options.cancel).await
    }

    /// ドライラン：スキーマだけを構築する
    ///
    /// 読み込めないシートは `migrate` と同じくそのシートだけをFailedとして記録します。
    pub fn inspect(
        &self,
        reader: &mut dyn WorkbookReader,
        overrides: &ColumnTypeOverrides,
    ) -> Result<Vec<SheetPlan>, MigrationError> {
        let path = reader.source_name();
        let sheets = reader
            .list_sheets()
            .map_err(|e| MigrationError::SourceUnavailable {
                path,
                cause: e.to_string(),
            })?;

        let mut tables = NameRegistry::new();
        let mut plans = Vec::with_capacity(sheets.len());
        for sheet_name in &sheets {
            let table_name = tables.claim(sheet_name, NameKind::Table);
            let sheet = match reader.read_sheet(sheet_name) {
                Ok(sheet) => sheet,
                Err(e) => {
                    let error = MigrationError::SchemaOrLoad {
                        sheet: sheet_name.clone(),
                        cause: e.to_string(),
                    };
                    warn!(sheet = %sheet_name, "{}", error);
                    plans.push(SheetPlan {
                        sheet_name: sheet_name.clone(),
                        row_count: 0,
                        status: SheetStatus::Failed,
                        schema: TableSchema::new(&table_name),
                        detail: Some(error.to_string()),
                    });
                    continue;
                }
            };

            let status = if sheet.is_empty() {
                SheetStatus::Skipped
            } else {
                SheetStatus::Pending
            };
            let schema = self
                .schema_builder
                .build(&table_name, &sheet.columns, overrides);

            plans.push(SheetPlan {
                sheet_name: sheet_name.clone(),
                row_count: sheet.row_count(),
                status,
                schema,
                detail: None,
            });
        }
        Ok(plans)
    }

    /// 移行先のテーブルと行数を一覧する
    pub async fn verify(
        &self,
        sink: &dyn DatabaseSink,
    ) -> Result<Vec<TableVerification>, MigrationError> {
        let destination_unavailable = |cause: String| MigrationError::DestinationUnavailable { cause };

        let tables = sink
            .list_tables()
            .await
            .map_err(|e| destination_unavailable(e.to_string()))?;

        let mut verifications = Vec::with_capacity(tables.len());
        for table_name in tables {
            let row_count = sink
                .count_rows(&table_name)
                .await
                .map_err(|e| destination_unavailable(e.to_string()))?;
            verifications.push(TableVerification {
                table_name,
                row_count,
            });
        }
        Ok(verifications)
    }
}

fn log_outcome(outcome: &MigrationOutcome) {
    match outcome.status {
        SheetStatus::Failed => warn!(
            sheet = %outcome.sheet_name,
            table = %outcome.table_name,
            detail = outcome.detail.as_deref().unwrap_or_default(),
            "Sheet failed"
        ),
        _ => info!(
            sheet = %outcome.sheet_name,
            table = %outcome.table_name,
            status = %outcome.status,
            rows = outcome.row_count,
            "Sheet finished"
        ),
    }
}
