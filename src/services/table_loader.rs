// テーブルロードサービス
//
// 1シート分のテーブルを作り直し、行をバッチ単位で書き込み、行数を検証します。
// 失敗はシート境界で結果に変換され、呼び出し元には伝播しません。

use crate::adapters::database_sink::{DatabaseSink, SqlValue};
use crate::core::config::DEFAULT_BATCH_SIZE;
use crate::core::error::MigrationError;
use crate::core::migration::{CancellationFlag, MigrationOutcome, SKIPPED_EMPTY};
use crate::core::schema::{StorageType, TableSchema};
use crate::core::sheet::{CellValue, SheetSource};
use chrono::Utc;
use tracing::{debug, warn};

/// 日時値をバインドするときの書式
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// テーブルロードサービス
#[derive(Debug, Clone)]
pub struct TableLoader {
    batch_size: usize,
}

impl Default for TableLoader {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl TableLoader {
    /// 新しいTableLoaderを作成（0は1として扱う）
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    /// シートをテーブルにロード
    ///
    /// # Arguments
    ///
    /// * `sheet` - 読み込み済みシート
    /// * `schema` - シートから構築したテーブルスキーマ
    /// * `sink` - 書き込み先
    /// * `cancel` - バッチ間で確認するキャンセルフラグ
    ///
    /// # Returns
    ///
    /// シートの移行結果。空シートはテーブルを作成せずにスキップします。
    pub async fn load(
        &self,
        sheet: &SheetSource,
        schema: &TableSchema,
        sink: &dyn DatabaseSink,
        cancel: &CancellationFlag,
    ) -> MigrationOutcome {
        if sheet.is_empty() {
            return MigrationOutcome::skipped(&sheet.name, &schema.table_name, SKIPPED_EMPTY);
        }

        let started_at = Utc::now();
        let total = sheet.row_count() as u64;
        let mut written = 0u64;

        let result = self
            .write_rows(sheet, schema, sink, cancel, &mut written)
            .await;
        let elapsed = Utc::now().signed_duration_since(started_at);

        match result {
            Ok(()) => MigrationOutcome::loaded(&sheet.name, &schema.table_name, written, elapsed),
            Err(error) => {
                warn!(
                    sheet = %sheet.name,
                    table = %schema.table_name,
                    written,
                    total,
                    error = %error,
                    "Sheet load failed"
                );
                let detail = format!(
                    "{} ({} of {} rows written before failure)",
                    error, written, total
                );
                MigrationOutcome::failed(&sheet.name, &schema.table_name, written, detail, elapsed)
            }
        }
    }

    async fn write_rows(
        &self,
        sheet: &SheetSource,
        schema: &TableSchema,
        sink: &dyn DatabaseSink,
        cancel: &CancellationFlag,
        written: &mut u64,
    ) -> Result<(), MigrationError> {
        let load_error = |cause: String| MigrationError::SchemaOrLoad {
            sheet: sheet.name.clone(),
            cause,
        };

        sink.create_or_replace_table(schema)
            .await
            .map_err(|e| load_error(e.to_string()))?;

        let row_count = sheet.row_count();
        let mut start = 0;
        while start < row_count {
            if cancel.is_cancelled() {
                return Err(load_error("cancelled".to_string()));
            }

            let end = (start + self.batch_size).min(row_count);
            let batch = coerce_rows(sheet, schema, start, end);
            let inserted = sink
                .insert_batch(schema, &batch)
                .await
                .map_err(|e| load_error(e.to_string()))?;
            *written += inserted;
            debug!(table = %schema.table_name, start, end, "Committed batch");

            start = end;
        }

        let stored = sink
            .count_rows(&schema.table_name)
            .await
            .map_err(|e| load_error(e.to_string()))?;
        if stored != row_count as i64 {
            return Err(load_error(format!(
                "row count mismatch: expected {}, found {}",
                row_count, stored
            )));
        }

        Ok(())
    }
}

/// 指定範囲の行をバインド値に変換
fn coerce_rows(
    sheet: &SheetSource,
    schema: &TableSchema,
    start: usize,
    end: usize,
) -> Vec<Vec<SqlValue>> {
    sheet
        .rows(start, end)
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&schema.columns)
                .map(|(value, column)| coerce_value(value, &column.storage_type))
                .collect()
        })
        .collect()
}

/// セル値を格納型に合わせたバインド値に変換
///
/// 変換できない値は文字列のまま渡し、データベース側の判断に委ねます。
pub fn coerce_value(value: &CellValue, storage_type: &StorageType) -> SqlValue {
    if value.is_missing() {
        return SqlValue::Null;
    }

    match storage_type {
        StorageType::SmallInt | StorageType::Int | StorageType::BigInt => match value {
            CellValue::Integer(v) => SqlValue::Integer(*v),
            CellValue::Float(v) => SqlValue::Float(*v),
            CellValue::Boolean(v) => SqlValue::Integer(i64::from(*v)),
            CellValue::Text(text) => text
                .trim()
                .parse::<i64>()
                .map(SqlValue::Integer)
                .unwrap_or_else(|_| SqlValue::Text(text.clone())),
            other => SqlValue::Text(render(other)),
        },
        StorageType::DecimalFixed { .. } => match value {
            CellValue::Integer(v) => SqlValue::Float(*v as f64),
            CellValue::Float(v) => SqlValue::Float(*v),
            CellValue::Boolean(v) => SqlValue::Float(if *v { 1.0 } else { 0.0 }),
            CellValue::Text(text) => text
                .trim()
                .parse::<f64>()
                .map(SqlValue::Float)
                .unwrap_or_else(|_| SqlValue::Text(text.clone())),
            other => SqlValue::Text(render(other)),
        },
        StorageType::Boolean => match value {
            CellValue::Boolean(v) => SqlValue::Boolean(*v),
            CellValue::Integer(v) => SqlValue::Boolean(*v != 0),
            CellValue::Float(v) => SqlValue::Boolean(*v != 0.0),
            CellValue::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" => SqlValue::Boolean(true),
                "false" => SqlValue::Boolean(false),
                _ => SqlValue::Text(text.clone()),
            },
            other => SqlValue::Text(render(other)),
        },
        StorageType::DateTime | StorageType::VarChar { .. } | StorageType::Text => {
            SqlValue::Text(render(value))
        }
    }
}

fn render(value: &CellValue) -> String {
    match value {
        CellValue::DateTime(datetime) => datetime.format(DATETIME_FORMAT).to_string(),
        other => other.to_string(),
    }
}
