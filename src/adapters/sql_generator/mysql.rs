// MySQL用SQLジェネレーター
//
// テーブルスキーマからMySQL用のDDL/DML文を生成します。
// マルチバイト文字を保持するため、テーブルには文字セットと照合順序を明示します。

use crate::adapters::sql_generator::SqlGenerator;
use crate::core::schema::StorageType;

/// MySQLのプレースホルダー上限（u16）
const MYSQL_MAX_BIND_PARAMETERS: usize = 65_535;

/// MySQL用SQLジェネレーター
#[derive(Debug, Clone)]
pub struct MysqlSqlGenerator {
    charset: String,
    collation: String,
}

impl MysqlSqlGenerator {
    /// 新しいMysqlSqlGeneratorを作成
    pub fn new(charset: &str, collation: &str) -> Self {
        Self {
            charset: charset.to_string(),
            collation: collation.to_string(),
        }
    }
}

impl SqlGenerator for MysqlSqlGenerator {
    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn map_storage_type(&self, storage_type: &StorageType) -> String {
        match storage_type {
            StorageType::SmallInt => "SMALLINT".to_string(),
            StorageType::Int => "INT".to_string(),
            StorageType::BigInt => "BIGINT".to_string(),
            StorageType::DecimalFixed { precision, scale } => {
                format!("DECIMAL({}, {})", precision, scale)
            }
            StorageType::Boolean => "BOOLEAN".to_string(),
            StorageType::DateTime => "DATETIME".to_string(),
            StorageType::VarChar { length } => format!("VARCHAR({})", length),
            StorageType::Text => "TEXT".to_string(),
        }
    }

    fn placeholder(&self, _index: usize, _storage_type: &StorageType) -> String {
        "?".to_string()
    }

    fn max_bind_parameters(&self) -> usize {
        MYSQL_MAX_BIND_PARAMETERS
    }

    fn generate_list_tables(&self) -> String {
        "SELECT CAST(table_name AS CHAR) FROM information_schema.tables \
         WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE' ORDER BY table_name"
            .to_string()
    }

    fn table_options(&self) -> String {
        let mut options = Vec::new();
        if !self.charset.is_empty() {
            options.push(format!("DEFAULT CHARSET={}", self.charset));
        }
        if !self.collation.is_empty() {
            options.push(format!("COLLATE={}", self.collation));
        }
        options.join(" ")
    }
}
