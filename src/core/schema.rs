// スキーマドメインモデル
//
// 格納型記述子（StorageType）、テーブルスキーマ、カラム型オーバーライドを
// 表現する型システムを提供します。方言固有のSQL型への変換はadapters層が担当します。

use crate::core::error::{ConfigError, UnknownStorageType};
use crate::core::naming::{sanitize, NameKind};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// VARCHARとして扱う最大長（これを超える宣言はTEXTになる）
pub const MAX_VARCHAR_LENGTH: u32 = 5000;

/// 型宣言文字列のパターン（例: `DECIMAL(10, 2)`, `VARCHAR(100)`, `TEXT`）
static TYPE_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z]+)\s*(?:\(\s*(\d+)\s*(?:,\s*(\d+)\s*)?\))?\s*$")
        .expect("valid type declaration regex")
});

/// 格納型記述子
///
/// 方言に依存しないカラムの物理的な格納形式を表します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageType {
    SmallInt,
    Int,
    BigInt,
    /// 固定小数点数
    DecimalFixed { precision: u32, scale: u32 },
    Boolean,
    DateTime,
    /// 可変長文字列（1..=MAX_VARCHAR_LENGTH）
    VarChar { length: u32 },
    Text,
}

impl StorageType {
    /// 長さを正規化してVARCHAR型を作成
    ///
    /// MAX_VARCHAR_LENGTHを超える長さはTEXTになります。
    pub fn varchar(length: u32) -> Self {
        if length > MAX_VARCHAR_LENGTH {
            StorageType::Text
        } else {
            StorageType::VarChar {
                length: length.max(1),
            }
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageType::SmallInt => write!(f, "SMALLINT"),
            StorageType::Int => write!(f, "INT"),
            StorageType::BigInt => write!(f, "BIGINT"),
            StorageType::DecimalFixed { precision, scale } => {
                write!(f, "DECIMAL({},{})", precision, scale)
            }
            StorageType::Boolean => write!(f, "BOOLEAN"),
            StorageType::DateTime => write!(f, "DATETIME"),
            StorageType::VarChar { length } => write!(f, "VARCHAR({})", length),
            StorageType::Text => write!(f, "TEXT"),
        }
    }
}

impl Serialize for StorageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for StorageType {
    type Err = UnknownStorageType;

    fn from_str(declaration: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownStorageType(declaration.to_string());
        let captures = TYPE_DECLARATION.captures(declaration).ok_or_else(unknown)?;

        let name = captures[1].to_ascii_uppercase();
        let first = captures
            .get(2)
            .map(|m| m.as_str().parse::<u32>())
            .transpose()
            .map_err(|_| unknown())?;
        let second = captures
            .get(3)
            .map(|m| m.as_str().parse::<u32>())
            .transpose()
            .map_err(|_| unknown())?;

        match name.as_str() {
            // 整数型の括弧はMySQLの表示幅なので無視する
            "SMALLINT" | "TINYINT" => Ok(StorageType::SmallInt),
            "INT" | "INTEGER" | "MEDIUMINT" => Ok(StorageType::Int),
            "BIGINT" => Ok(StorageType::BigInt),
            "DECIMAL" | "NUMERIC" => {
                let precision = first.unwrap_or(10);
                let scale = second.unwrap_or(0);
                if precision == 0 || precision > 65 || scale > precision {
                    return Err(unknown());
                }
                Ok(StorageType::DecimalFixed { precision, scale })
            }
            "BOOLEAN" | "BOOL" => Ok(StorageType::Boolean),
            "DATETIME" | "TIMESTAMP" | "DATE" => Ok(StorageType::DateTime),
            "VARCHAR" | "STRING" | "CHAR" if second.is_none() => match first {
                Some(0) => Err(unknown()),
                Some(length) => Ok(StorageType::varchar(length)),
                None => Ok(StorageType::VarChar { length: 255 }),
            },
            "TEXT" | "MEDIUMTEXT" | "LONGTEXT" => Ok(StorageType::Text),
            _ => Err(unknown()),
        }
    }
}

/// カラム型の決定元
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeOrigin {
    /// サンプル値から推論
    Inferred,
    /// オーバーライドで明示指定
    Override,
}

/// カラム定義
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDefinition {
    /// サニタイズ済みカラム名
    pub name: String,
    /// ヘッダー行の元ラベル
    pub source_label: String,
    /// 格納型
    pub storage_type: StorageType,
    /// 型の決定元
    pub origin: TypeOrigin,
}

/// テーブルスキーマ
///
/// シートごとに新規作成され、シート間でマージされることはありません。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSchema {
    /// サニタイズ済みテーブル名
    pub table_name: String,
    /// ソース順のカラム定義
    pub columns: Vec<ColumnDefinition>,
}

impl TableSchema {
    /// 新しい空のスキーマを作成
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
        }
    }

    /// カラムを追加
    pub fn add_column(&mut self, column: ColumnDefinition) {
        self.columns.push(column);
    }

    /// 名前でカラムを検索
    pub fn get_column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// カラム名のリスト
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// カラム数
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// カラム型オーバーライド
///
/// キーは `table.column` または `column`。登録時にキーをサニタイズするため、
/// 元ラベル（`"Unit Price"`）でもサニタイズ後の名前（`unit_price`）でも一致します。
/// 検索ではテーブル修飾キーが素のカラムキーより優先されます。
/// `"Price (U.S.)"` のようにドットを含むキーは、ラベル全体を1つのカラム名とする
/// 解釈でも一致します（最も優先度が低い）。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnTypeOverrides {
    entries: HashMap<String, StorageType>,
    /// ドットを含むキーをカラムラベル全体として解釈したもの
    dotted_labels: HashMap<String, StorageType>,
}

impl ColumnTypeOverrides {
    /// 新しい空のオーバーライドマップを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 型宣言文字列のマップからオーバーライドを作成
    pub fn from_declarations<'a, I>(declarations: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut overrides = Self::new();
        for (key, declaration) in declarations {
            let storage_type =
                declaration
                    .parse::<StorageType>()
                    .map_err(|e| ConfigError::InvalidColumnType {
                        key: key.clone(),
                        declaration: e.0,
                    })?;
            overrides.insert(key, storage_type);
        }
        Ok(overrides)
    }

    /// オーバーライドを登録
    pub fn insert(&mut self, key: &str, storage_type: StorageType) {
        match key.split_once('.') {
            Some((table, column)) => {
                let qualified = format!(
                    "{}.{}",
                    sanitize(table, NameKind::Table),
                    sanitize(column, NameKind::Column)
                );
                self.entries.insert(qualified, storage_type);
                self.dotted_labels
                    .insert(sanitize(key, NameKind::Column), storage_type);
            }
            None => {
                self.entries
                    .insert(sanitize(key, NameKind::Column), storage_type);
            }
        }
    }

    /// サニタイズ済みのテーブル名・カラム名でオーバーライドを検索
    pub fn lookup(&self, table_name: &str, column_name: &str) -> Option<StorageType> {
        self.entries
            .get(&format!("{}.{}", table_name, column_name))
            .or_else(|| self.entries.get(column_name))
            .or_else(|| self.dotted_labels.get(column_name))
            .copied()
    }

    /// 登録数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
