// エラー型定義
//
// アプリケーション全体で使用されるカスタムエラー型を提供します。
// thiserrorを使用して、MigrationError, DatabaseError, WorkbookError, ConfigError を定義します。

use thiserror::Error;

/// マイグレーションエラー
///
/// 実行全体を中断する致命的なエラーと、シート境界で捕捉される
/// 非致命的なエラーを区別します。
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Source workbook unavailable (fatal)
    #[error("Source workbook unavailable: {path} (cause: {cause})")]
    SourceUnavailable {
        /// ワークブックのパス
        path: String,
        /// エラー原因
        cause: String,
    },

    /// Destination database unavailable (fatal)
    #[error("Destination database unavailable (cause: {cause})")]
    DestinationUnavailable {
        /// エラー原因
        cause: String,
    },

    /// Sheet has no data rows (recorded as skipped)
    #[error("Sheet '{sheet}' has no data rows")]
    SheetEmpty {
        /// シート名
        sheet: String,
    },

    /// Schema creation or load failure for one sheet (recorded as failed)
    #[error("Failed to migrate sheet '{sheet}': {cause}")]
    SchemaOrLoad {
        /// シート名
        sheet: String,
        /// エラー原因
        cause: String,
    },
}

impl MigrationError {
    /// 実行全体を中断すべきエラーかどうか
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MigrationError::SourceUnavailable { .. } | MigrationError::DestinationUnavailable { .. }
        )
    }
}

/// データベースエラー
///
/// データベース操作時に発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Connection error
    #[error("Database connection error: {message} (cause: {cause})")]
    Connection {
        /// エラーメッセージ
        message: String,
        /// エラー原因
        cause: String,
    },

    /// Query execution error
    #[error("Query execution error: {message}")]
    Query {
        /// エラーメッセージ
        message: String,
        /// 失敗したSQL
        sql: Option<String>,
    },

    /// Transaction error
    #[error("Transaction error: {message}")]
    Transaction {
        /// エラーメッセージ
        message: String,
    },
}

/// ワークブック読み込みエラー
#[derive(Debug, Error)]
pub enum WorkbookError {
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound {
        /// ファイルパス
        path: String,
    },

    /// File read error
    #[error("Failed to read file: {path} (cause: {cause})")]
    FileRead {
        /// ファイルパス
        path: String,
        /// エラー原因
        cause: String,
    },

    /// Broken or unsupported archive
    #[error("Invalid workbook archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// XML parse error
    #[error("Invalid workbook XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML text encoding error
    #[error("Invalid workbook XML encoding: {0}")]
    XmlEncoding(#[from] quick_xml::encoding::EncodingError),

    /// XML attribute error
    #[error("Invalid workbook XML attribute: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    /// Unknown XML entity or character reference
    #[error("Invalid XML entity: {0}")]
    XmlEntity(String),

    /// Required part missing from the archive
    #[error("Workbook part not found: {0}")]
    MissingPart(String),

    /// Sheet name not present in the workbook
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Cell value could not be decoded
    #[error("Invalid cell value '{value}' at {reference} in sheet '{sheet}'")]
    CellValue {
        /// シート名
        sheet: String,
        /// セル参照（例: B12）
        reference: String,
        /// 生の値
        value: String,
    },
}

impl WorkbookError {
    /// ファイルが見つからないエラーかどうか
    pub fn is_file_not_found(&self) -> bool {
        matches!(self, WorkbookError::FileNotFound { .. })
    }
}

/// 設定エラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// バージョン未指定
    #[error("Config file version is not specified")]
    MissingVersion,

    /// ソースファイル未指定
    #[error("Source workbook path is not specified")]
    MissingSource,

    /// データベース名未指定
    #[error("Database name is not specified")]
    MissingDatabaseName,

    /// バッチサイズ不正
    #[error("batch_size must be greater than 0")]
    InvalidBatchSize,

    /// カラム型宣言の不正
    #[error("Invalid column type '{declaration}' for '{key}'")]
    InvalidColumnType {
        /// オーバーライドキー
        key: String,
        /// 型宣言文字列
        declaration: String,
    },
}

/// 解釈できない型宣言
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown column type: {0}")]
pub struct UnknownStorageType(pub String);
