// SQL生成アダプター
//
// テーブルスキーマから各データベース方言用のDDL/DML文を生成するアダプター層。
// 識別子のクォート、格納型のSQL型へのマッピング、プレースホルダー構文を方言ごとに切り替えます。

pub mod mysql;
pub mod postgres;
pub mod sqlite;

use crate::core::config::{DatabaseConfig, Dialect};
use crate::core::schema::{StorageType, TableSchema};

/// SQLジェネレータートレイト
///
/// 各データベース方言用のSQLジェネレーターが実装すべきインターフェース。
pub trait SqlGenerator: Send + Sync {
    /// 識別子をクォート
    fn quote_identifier(&self, name: &str) -> String;

    /// 格納型を方言のSQL型文字列にマッピング
    fn map_storage_type(&self, storage_type: &StorageType) -> String;

    /// 1-basedのパラメータ番号に対応するプレースホルダーを生成
    fn placeholder(&self, index: usize, storage_type: &StorageType) -> String;

    /// 1文あたりのバインドパラメータ上限
    fn max_bind_parameters(&self) -> usize;

    /// テーブル一覧取得のSELECT文を生成
    fn generate_list_tables(&self) -> String;

    /// CREATE TABLE文の末尾に付与するテーブルオプション
    fn table_options(&self) -> String {
        String::new()
    }

    /// DROP TABLE IF EXISTS文を生成
    fn generate_drop_table(&self, table_name: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", self.quote_identifier(table_name))
    }

    /// CREATE TABLE文を生成
    ///
    /// # Arguments
    ///
    /// * `schema` - テーブルスキーマ
    ///
    /// # Returns
    ///
    /// CREATE TABLE文のSQL文字列
    fn generate_create_table(&self, schema: &TableSchema) -> String {
        let columns = schema
            .columns
            .iter()
            .map(|column| {
                format!(
                    "    {} {}",
                    self.quote_identifier(&column.name),
                    self.map_storage_type(&column.storage_type)
                )
            })
            .collect::<Vec<_>>()
            .join(",\n");

        let mut sql = format!(
            "CREATE TABLE {} (\n{}\n)",
            self.quote_identifier(&schema.table_name),
            columns
        );

        let options = self.table_options();
        if !options.is_empty() {
            sql.push(' ');
            sql.push_str(&options);
        }
        sql
    }

    /// 複数行INSERT文を生成
    ///
    /// # Arguments
    ///
    /// * `schema` - テーブルスキーマ
    /// * `row_count` - VALUES句に含める行数
    ///
    /// # Returns
    ///
    /// プレースホルダー付きINSERT文のSQL文字列
    fn generate_insert(&self, schema: &TableSchema, row_count: usize) -> String {
        let column_list = schema
            .columns
            .iter()
            .map(|c| self.quote_identifier(&c.name))
            .collect::<Vec<_>>()
            .join(", ");

        let width = schema.columns.len();
        let rows = (0..row_count)
            .map(|row| {
                let values = schema
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(col, c)| self.placeholder(row * width + col + 1, &c.storage_type))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({})", values)
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.quote_identifier(&schema.table_name),
            column_list,
            rows
        )
    }

    /// 行数取得のSELECT文を生成
    fn generate_count_rows(&self, table_name: &str) -> String {
        format!("SELECT COUNT(*) FROM {}", self.quote_identifier(table_name))
    }

    /// 1つのINSERT文に含められる最大行数
    fn rows_per_statement(&self, column_count: usize) -> usize {
        (self.max_bind_parameters() / column_count.max(1)).max(1)
    }
}

/// 方言に応じたSQLジェネレーターを作成
pub fn create_generator(dialect: Dialect, config: &DatabaseConfig) -> Box<dyn SqlGenerator> {
    match dialect {
        Dialect::MySQL => Box::new(mysql::MysqlSqlGenerator::new(
            &config.charset,
            &config.collation,
        )),
        Dialect::PostgreSQL => Box::new(postgres::PostgresSqlGenerator::new()),
        Dialect::SQLite => Box::new(sqlite::SqliteSqlGenerator::new()),
    }
}
