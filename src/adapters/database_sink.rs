// データベース書き込みアダプター
//
// テーブルの作り直し、バッチINSERT、行数取得、テーブル一覧取得を抽象化します。
// 1バッチは1トランザクションで書き込まれ、失敗したバッチはロールバックされます。

use crate::adapters::database::DatabaseConnectionService;
use crate::adapters::sql_generator::{create_generator, SqlGenerator};
use crate::core::config::{DatabaseConfig, Dialect};
use crate::core::error::DatabaseError;
use crate::core::schema::{StorageType, TableSchema};
use async_trait::async_trait;
use sqlx::any::AnyArguments;
use sqlx::query::Query;
use sqlx::{Any, AnyPool, Row};
use tracing::debug;

/// バインドする値
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

/// データベース書き込みインターフェース
///
/// テスト時にはインメモリ実装や失敗を注入する実装に差し替えられます。
#[async_trait]
pub trait DatabaseSink: Send + Sync {
    /// 既存テーブルを削除してから新しいスキーマで作成
    async fn create_or_replace_table(&self, schema: &TableSchema) -> Result<(), DatabaseError>;

    /// 行をまとめて挿入し、書き込んだ行数を返す
    ///
    /// 各行の値はスキーマのカラム順に並んでいる必要があります。
    /// 全行が1トランザクションで書き込まれ、途中で失敗した場合は1行も残りません。
    async fn insert_batch(
        &self,
        schema: &TableSchema,
        rows: &[Vec<SqlValue>],
    ) -> Result<u64, DatabaseError>;

    /// テーブルの行数を取得
    async fn count_rows(&self, table_name: &str) -> Result<i64, DatabaseError>;

    /// ユーザーテーブル名の一覧を取得
    async fn list_tables(&self) -> Result<Vec<String>, DatabaseError>;
}

/// SQLxによるDatabaseSink実装
pub struct SqlxDatabaseSink {
    pool: AnyPool,
    generator: Box<dyn SqlGenerator>,
}

impl SqlxDatabaseSink {
    /// 既存の接続プールからSqlxDatabaseSinkを作成
    pub fn new(pool: AnyPool, generator: Box<dyn SqlGenerator>) -> Self {
        Self { pool, generator }
    }

    /// 接続して疎通確認を行い、SqlxDatabaseSinkを作成
    pub async fn connect(dialect: Dialect, config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let service = DatabaseConnectionService::new();
        let pool = service.create_pool(dialect, config).await?;
        service.test_connection(&pool).await?;

        Ok(Self::new(pool, create_generator(dialect, config)))
    }

    /// 接続プールを閉じる
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn execute(&self, sql: String, message: &str) -> Result<(), DatabaseError> {
        debug!(sql = %sql, "Executing statement");
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| DatabaseError::Query {
                message: format!("{}: {}", message, e),
                sql: Some(sql),
            })
    }
}

/// 値をバインド
///
/// NULLは方言側で型を推定できるよう、カラムの格納型に合わせた型付きNoneとして渡します。
fn bind_value<'q>(
    query: Query<'q, Any, AnyArguments<'q>>,
    value: &SqlValue,
    storage_type: &StorageType,
) -> Query<'q, Any, AnyArguments<'q>> {
    match value {
        SqlValue::Integer(v) => query.bind(*v),
        SqlValue::Float(v) => query.bind(*v),
        SqlValue::Boolean(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.clone()),
        SqlValue::Null => match storage_type {
            StorageType::SmallInt | StorageType::Int | StorageType::BigInt => {
                query.bind(None::<i64>)
            }
            StorageType::DecimalFixed { .. } => query.bind(None::<f64>),
            StorageType::Boolean => query.bind(None::<bool>),
            StorageType::DateTime | StorageType::VarChar { .. } | StorageType::Text => {
                query.bind(None::<String>)
            }
        },
    }
}

#[async_trait]
impl DatabaseSink for SqlxDatabaseSink {
    async fn create_or_replace_table(&self, schema: &TableSchema) -> Result<(), DatabaseError> {
        self.execute(
            self.generator.generate_drop_table(&schema.table_name),
            &format!("Failed to drop table '{}'", schema.table_name),
        )
        .await?;

        self.execute(
            self.generator.generate_create_table(schema),
            &format!("Failed to create table '{}'", schema.table_name),
        )
        .await
    }

    async fn insert_batch(
        &self,
        schema: &TableSchema,
        rows: &[Vec<SqlValue>],
    ) -> Result<u64, DatabaseError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let column_count = schema.column_count();
        if let Some(row) = rows.iter().find(|row| row.len() != column_count) {
            return Err(DatabaseError::Query {
                message: format!(
                    "Row has {} values but table '{}' has {} columns",
                    row.len(),
                    schema.table_name,
                    column_count
                ),
                sql: None,
            });
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::Transaction {
                message: format!("Failed to start transaction: {}", e),
            })?;

        let mut written = 0u64;
        for chunk in rows.chunks(self.generator.rows_per_statement(column_count)) {
            let sql = self.generator.generate_insert(schema, chunk.len());

            let mut query = sqlx::query(&sql);
            for row in chunk {
                for (value, column) in row.iter().zip(&schema.columns) {
                    query = bind_value(query, value, &column.storage_type);
                }
            }

            let result = query
                .execute(&mut *tx)
                .await
                .map_err(|e| DatabaseError::Query {
                    message: format!(
                        "Failed to insert into '{}': {}",
                        schema.table_name, e
                    ),
                    sql: Some(sql.clone()),
                })?;
            written += result.rows_affected();
        }

        tx.commit().await.map_err(|e| DatabaseError::Transaction {
            message: format!("Failed to commit transaction: {}", e),
        })?;

        Ok(written)
    }

    async fn count_rows(&self, table_name: &str) -> Result<i64, DatabaseError> {
        let sql = self.generator.generate_count_rows(table_name);
        let row = sqlx::query(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::Query {
                message: format!("Failed to count rows in '{}': {}", table_name, e),
                sql: Some(sql.clone()),
            })?;

        row.try_get::<i64, _>(0).map_err(|e| DatabaseError::Query {
            message: format!("Failed to read row count of '{}': {}", table_name, e),
            sql: Some(sql),
        })
    }

    async fn list_tables(&self) -> Result<Vec<String>, DatabaseError> {
        let sql = self.generator.generate_list_tables();
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::Query {
                message: format!("Failed to list tables: {}", e),
                sql: Some(sql.clone()),
            })?;

        rows.iter()
            .map(|row| row.try_get::<String, _>(0))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DatabaseError::Query {
                message: format!("Failed to read table name: {}", e),
                sql: Some(sql),
            })
    }
}
