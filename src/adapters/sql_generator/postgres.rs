// PostgreSQL用SQLジェネレーター
//
// テーブルスキーマからPostgreSQL用のDDL/DML文を生成します。

use crate::adapters::sql_generator::SqlGenerator;
use crate::core::schema::StorageType;

/// PostgreSQLのバインドパラメータ上限（i16の範囲を超えるとプロトコルエラー）
const POSTGRES_MAX_BIND_PARAMETERS: usize = 32_767;

/// PostgreSQL用SQLジェネレーター
#[derive(Debug, Clone, Default)]
pub struct PostgresSqlGenerator {}

impl PostgresSqlGenerator {
    /// 新しいPostgresSqlGeneratorを作成
    pub fn new() -> Self {
        Self {}
    }
}

impl SqlGenerator for PostgresSqlGenerator {
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn map_storage_type(&self, storage_type: &StorageType) -> String {
        match storage_type {
            StorageType::SmallInt => "SMALLINT".to_string(),
            StorageType::Int => "INTEGER".to_string(),
            StorageType::BigInt => "BIGINT".to_string(),
            StorageType::DecimalFixed { precision, scale } => {
                format!("NUMERIC({}, {})", precision, scale)
            }
            StorageType::Boolean => "BOOLEAN".to_string(),
            StorageType::DateTime => "TIMESTAMP".to_string(),
            StorageType::VarChar { length } => format!("VARCHAR({})", length),
            StorageType::Text => "TEXT".to_string(),
        }
    }

    fn placeholder(&self, index: usize, storage_type: &StorageType) -> String {
        // 日時は文字列でバインドするため、TEXTからの代入キャストがない型は明示的にキャストする
        match storage_type {
            StorageType::DateTime => format!("CAST(${} AS TIMESTAMP)", index),
            _ => format!("${}", index),
        }
    }

    fn max_bind_parameters(&self) -> usize {
        POSTGRES_MAX_BIND_PARAMETERS
    }

    fn generate_list_tables(&self) -> String {
        "SELECT table_name::text FROM information_schema.tables \
         WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' ORDER BY table_name"
            .to_string()
    }
}
