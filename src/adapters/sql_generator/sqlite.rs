// SQLite用SQLジェネレーター
//
// テーブルスキーマからSQLite用のDDL/DML文を生成します。
// SQLiteは型親和性のみを持つため、格納型は親和性の型名にマッピングします。

use crate::adapters::sql_generator::SqlGenerator;
use crate::core::schema::StorageType;

/// SQLiteのバインドパラメータ上限（SQLITE_MAX_VARIABLE_NUMBER, 3.32.0以降）
const SQLITE_MAX_BIND_PARAMETERS: usize = 32_766;

/// SQLite用SQLジェネレーター
#[derive(Debug, Clone, Default)]
pub struct SqliteSqlGenerator {}

impl SqliteSqlGenerator {
    /// 新しいSqliteSqlGeneratorを作成
    pub fn new() -> Self {
        Self {}
    }
}

impl SqlGenerator for SqliteSqlGenerator {
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn map_storage_type(&self, storage_type: &StorageType) -> String {
        match storage_type {
            StorageType::SmallInt | StorageType::Int | StorageType::BigInt => {
                "INTEGER".to_string()
            }
            StorageType::DecimalFixed { .. } => "REAL".to_string(),
            StorageType::Boolean => "INTEGER".to_string(),
            StorageType::DateTime => "TEXT".to_string(),
            StorageType::VarChar { .. } | StorageType::Text => "TEXT".to_string(),
        }
    }

    fn placeholder(&self, _index: usize, _storage_type: &StorageType) -> String {
        "?".to_string()
    }

    fn max_bind_parameters(&self) -> usize {
        SQLITE_MAX_BIND_PARAMETERS
    }

    fn generate_list_tables(&self) -> String {
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
            .to_string()
    }
}
