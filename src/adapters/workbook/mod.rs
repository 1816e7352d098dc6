// ワークブック読み込みアダプター
//
// 移行元ワークブックのシート一覧取得とシート読み込みを抽象化します。
// セルの値はここで一度だけCellValueに分類され、以降の層は生の文字列を扱いません。

mod number_format;
pub mod xlsx;
mod xml;

pub use xlsx::XlsxWorkbook;

use crate::core::error::WorkbookError;
use crate::core::sheet::{CellValue, SheetColumn, SheetSource};
use std::collections::BTreeMap;

/// 欠損値として扱う文字列
pub const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NULL", "null", "NaN", "nan", "#N/A", "None",
];

/// ワークブック読み込みインターフェース
pub trait WorkbookReader: Send {
    /// ワークブックの表示名（ログとエラーメッセージ用）
    fn source_name(&self) -> String;

    /// シート名をワークブック順に取得
    fn list_sheets(&mut self) -> Result<Vec<String>, WorkbookError>;

    /// シートを読み込む
    ///
    /// 先頭行をヘッダー行として扱い、以降の行をデータ行とします。
    fn read_sheet(&mut self, name: &str) -> Result<SheetSource, WorkbookError>;
}

/// 欠損マーカーの文字列をMissingに置き換える
pub fn normalize_missing(value: CellValue) -> CellValue {
    match value {
        CellValue::Text(text) if MISSING_MARKERS.contains(&text.as_str()) => CellValue::Missing,
        other => other,
    }
}

/// 疎なセル集合からシートを組み立てる
///
/// `cells` は行番号→(列番号→値) の0-based疎行列。最初に値を持つ行をヘッダー行とし、
/// 空のヘッダーは `column_<n>`（1-based）になります。末尾の全欠損行は除去されます。
pub(crate) fn assemble_sheet(
    name: &str,
    cells: BTreeMap<usize, BTreeMap<usize, CellValue>>,
) -> SheetSource {
    let mut rows = cells.into_iter();
    let Some((header_row, header)) = rows.next() else {
        return SheetSource::new(name, Vec::new());
    };

    let data: Vec<(usize, BTreeMap<usize, CellValue>)> = rows
        .map(|(row, values)| {
            let values = values
                .into_iter()
                .map(|(col, value)| (col, normalize_missing(value)))
                .filter(|(_, value)| !value.is_missing())
                .collect::<BTreeMap<_, _>>();
            (row, values)
        })
        .collect();

    let width = header
        .keys()
        .chain(data.iter().flat_map(|(_, values)| values.keys()))
        .max()
        .map_or(0, |max| max + 1);

    // 末尾の全欠損行を除いた最終データ行
    let last_row = data
        .iter()
        .rev()
        .find(|(_, values)| !values.is_empty())
        .map(|(row, _)| *row);
    let row_count = last_row.map_or(0, |last| last - header_row);

    let mut columns: Vec<SheetColumn> = (0..width)
        .map(|col| {
            let label = match header.get(&col) {
                Some(CellValue::Text(text)) if !text.trim().is_empty() => text.clone(),
                Some(value @ (CellValue::Integer(_)
                | CellValue::Float(_)
                | CellValue::Boolean(_)
                | CellValue::DateTime(_))) => value.to_string(),
                _ => format!("column_{}", col + 1),
            };
            SheetColumn::new(label, vec![CellValue::Missing; row_count])
        })
        .collect();

    for (row, values) in data {
        let index = row - header_row - 1;
        if index >= row_count {
            break;
        }
        for (col, value) in values {
            columns[col].values[index] = value;
        }
    }

    SheetSource::new(name, columns)
}
