// シートドメインモデル
//
// ワークブックから読み込んだ1シート分の矩形データを表現します。
// セル値は読み込み時に一度だけ分類され、以降は閉じた種類として扱います。

use chrono::NaiveDateTime;
use std::fmt;

/// セル値の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Integer,
    Float,
    Boolean,
    DateTime,
    Text,
    Missing,
}

/// 分類済みのセル値
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// 整数値
    Integer(i64),
    /// 浮動小数点数
    Float(f64),
    /// 真偽値
    Boolean(bool),
    /// 日時
    DateTime(NaiveDateTime),
    /// 文字列
    Text(String),
    /// 欠損値（空セル、エラーセル、NAマーカー）
    Missing,
}

impl CellValue {
    /// 欠損値かどうか
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// 文字列表現の文字数（バイト数ではない）
    pub fn rendered_length(&self) -> usize {
        match self {
            CellValue::Text(text) => text.chars().count(),
            CellValue::Missing => 0,
            other => other.to_string().chars().count(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Integer(value) => write!(f, "{}", value),
            CellValue::Float(value) => write!(f, "{}", value),
            CellValue::Boolean(value) => write!(f, "{}", value),
            CellValue::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S%.f")),
            CellValue::Text(value) => f.write_str(value),
            CellValue::Missing => Ok(()),
        }
    }
}

/// シートの1カラム
#[derive(Debug, Clone, PartialEq)]
pub struct SheetColumn {
    /// ヘッダー行の元ラベル
    pub label: String,
    /// 行順のセル値
    pub values: Vec<CellValue>,
}

impl SheetColumn {
    pub fn new(label: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }
}

/// ワークブックの1シート
///
/// すべてのカラムは同じ行数を持ちます。
#[derive(Debug, Clone, PartialEq)]
pub struct SheetSource {
    /// シート名
    pub name: String,
    /// ソース順のカラム
    pub columns: Vec<SheetColumn>,
}

impl SheetSource {
    /// カラムからシートを作成
    ///
    /// 行数が揃っていないカラムは末尾を欠損値で埋めます。
    pub fn new(name: impl Into<String>, mut columns: Vec<SheetColumn>) -> Self {
        let row_count = columns.iter().map(|c| c.values.len()).max().unwrap_or(0);
        for column in &mut columns {
            column.values.resize(row_count, CellValue::Missing);
        }
        Self {
            name: name.into(),
            columns,
        }
    }

    /// データ行数（ヘッダー行を除く）
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    /// カラム数
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// データ行が存在しないかどうか
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// 指定範囲の行を行優先で取り出す
    pub fn rows(&self, start: usize, end: usize) -> Vec<Vec<&CellValue>> {
        let end = end.min(self.row_count());
        (start..end)
            .map(|row| self.columns.iter().map(|c| &c.values[row]).collect())
            .collect()
    }
}
