// XLSX/XLSMワークブックリーダー
//
// Office Open XML形式のワークブックをzipアーカイブとして開き、
// workbook.xml・リレーション・共有文字列・スタイル・ワークシートの各パートを読みます。

use crate::adapters::workbook::number_format::{serial_to_datetime, NumberFormat};
use crate::adapters::workbook::xml::{attribute_value, match_xml_events, push_general_ref, XmlReader};
use crate::adapters::workbook::{assemble_sheet, WorkbookReader};
use crate::core::error::WorkbookError;
use crate::core::sheet::{CellValue, SheetSource};
use chrono::{NaiveDate, NaiveDateTime};
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::debug;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

const PART_WORKBOOK: &str = "xl/workbook.xml";
const PART_WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
const PART_SHARED_STRINGS: &str = "xl/sharedStrings.xml";
const PART_STYLES: &str = "xl/styles.xml";

const TAG_RELATIONSHIP: &[u8] = b"Relationship";
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr");
const TAG_SHEET: QName = QName(b"sheet");
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts");
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");
const TAG_CELL_FORMATS: QName = QName(b"cellXfs");
const TAG_CELL_FORMAT: QName = QName(b"xf");
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");
const TAG_PHONETIC_RUN: QName = QName(b"rPh");
const TAG_TEXT: QName = QName(b"t");
const TAG_ROW: QName = QName(b"row");
const TAG_CELL: QName = QName(b"c");
const TAG_INLINE_STRING: QName = QName(b"is");
const TAG_VALUE: QName = QName(b"v");

type PartReader<'a, R> = XmlReader<BufReader<ZipFile<'a, R>>>;

/// XLSX/XLSMワークブック
#[derive(Debug)]
pub struct XlsxWorkbook<R: Read + Seek = BufReader<File>> {
    name: String,
    zip: ZipArchive<R>,
    /// (シート名, パート名) をワークブック順に保持
    sheets: Vec<(String, String)>,
    /// cellXfsのインデックス順の数値書式
    number_formats: Vec<NumberFormat>,
    is_1904: bool,
    shared_strings: Option<Vec<String>>,
}

impl XlsxWorkbook {
    /// ファイルからワークブックを開く
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WorkbookError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(WorkbookError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let file = File::open(path).map_err(|e| WorkbookError::FileRead {
            path: path.display().to_string(),
            cause: e.to_string(),
        })?;

        Self::from_reader(path.display().to_string(), BufReader::new(file))
    }
}

impl<R: Read + Seek> XlsxWorkbook<R> {
    /// 任意のリーダーからワークブックを開く
    pub fn from_reader(name: impl Into<String>, reader: R) -> Result<Self, WorkbookError> {
        let mut zip = ZipArchive::new(reader)?;
        let (sheets, is_1904) = load_workbook(&mut zip)?;
        let number_formats = load_number_formats(&mut zip)?;

        Ok(Self {
            name: name.into(),
            zip,
            sheets,
            number_formats,
            is_1904,
            shared_strings: None,
        })
    }

    /// 共有文字列を初回のみ読み込む
    fn ensure_shared_strings(&mut self) -> Result<(), WorkbookError> {
        if self.shared_strings.is_none() {
            self.shared_strings = Some(load_shared_strings(&mut self.zip)?);
        }
        Ok(())
    }

    fn number_format(&self, style: Option<usize>) -> NumberFormat {
        style
            .and_then(|index| self.number_formats.get(index).copied())
            .unwrap_or_default()
    }
}

impl<R: Read + Seek + Send> WorkbookReader for XlsxWorkbook<R> {
    fn source_name(&self) -> String {
        self.name.clone()
    }

    fn list_sheets(&mut self) -> Result<Vec<String>, WorkbookError> {
        Ok(self.sheets.iter().map(|(name, _)| name.clone()).collect())
    }

    fn read_sheet(&mut self, name: &str) -> Result<SheetSource, WorkbookError> {
        let part = self
            .sheets
            .iter()
            .find(|(sheet, _)| sheet == name)
            .map(|(_, part)| part.clone())
            .ok_or_else(|| WorkbookError::SheetNotFound(name.to_string()))?;

        self.ensure_shared_strings()?;

        let raw_cells = read_worksheet(&mut self.zip, &part)?;
        let shared_strings = self.shared_strings.as_deref().unwrap_or_default();

        let mut cells: BTreeMap<usize, BTreeMap<usize, CellValue>> = BTreeMap::new();
        for raw in raw_cells {
            let value = decode_cell(
                &raw,
                self.number_format(raw.style),
                self.is_1904,
                shared_strings,
            )
            .map_err(|value| WorkbookError::CellValue {
                sheet: name.to_string(),
                reference: cell_reference(raw.row, raw.col),
                value,
            })?;
            cells.entry(raw.row).or_default().insert(raw.col, value);
        }

        let sheet = assemble_sheet(name, cells);
        debug!(
            sheet = name,
            rows = sheet.row_count(),
            columns = sheet.column_count(),
            "Read worksheet"
        );
        Ok(sheet)
    }
}

/// ワークシートXMLから読み取った未解釈のセル
#[derive(Debug, Clone, PartialEq)]
struct RawCell {
    row: usize,
    col: usize,
    /// `t` 属性
    cell_type: Option<String>,
    /// `s` 属性（cellXfsのインデックス）
    style: Option<usize>,
    value: String,
}

/// パートを大文字小文字を区別せずに開く
fn open_part<'a, R: Read + Seek>(
    zip: &'a mut ZipArchive<R>,
    name: &str,
) -> Result<Option<PartReader<'a, R>>, WorkbookError> {
    let pattern = name.replace('\\', "/");
    let Some(file_name) = zip
        .file_names()
        .find(|file_name| pattern.eq_ignore_ascii_case(file_name))
        .map(str::to_owned)
    else {
        return Ok(None);
    };

    match zip.by_name(&file_name) {
        Ok(file) => Ok(Some(XmlReader::new(BufReader::new(file)))),
        Err(ZipError::FileNotFound) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

fn require_part<'a, R: Read + Seek>(
    zip: &'a mut ZipArchive<R>,
    name: &str,
) -> Result<PartReader<'a, R>, WorkbookError> {
    open_part(zip, name)?.ok_or_else(|| WorkbookError::MissingPart(name.to_string()))
}

/// リレーションのターゲットをアーカイブ内のパス名に正規化
fn to_part_name(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_string()
    } else if target.starts_with("xl/") {
        target.to_string()
    } else {
        format!("xl/{}", target)
    }
}

/// workbook.xmlからシート一覧と日付基準を読む
fn load_workbook<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
) -> Result<(Vec<(String, String)>, bool), WorkbookError> {
    let mut relationships = HashMap::new();
    {
        let mut reader = require_part(zip, PART_WORKBOOK_RELS)?;
        match_xml_events!(reader => {
            Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
                let id = attribute_value(&event, "Id")?;
                let kind = attribute_value(&event, "Type")?;
                let target = attribute_value(&event, "Target")?;
                if kind.map_or(true, |kind| kind.ends_with("/worksheet")) {
                    if let Some((id, target)) = id.zip(target) {
                        relationships.insert(id, to_part_name(&target));
                    }
                }
            }
        });
    }

    let mut sheets = Vec::new();
    let mut is_1904 = false;
    let mut reader = require_part(zip, PART_WORKBOOK)?;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let name = attribute_value(&event, "name")?;
            let id = attribute_value(&event, "id")?;
            // グラフシートなどワークシート以外のリレーションは対象外
            if let Some((name, part)) = name.zip(id.and_then(|id| relationships.get(&id).cloned())) {
                sheets.push((name, part));
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = attribute_value(&event, "date1904")?
                .is_some_and(|value| value == "1" || value == "true");
        }
    });

    Ok((sheets, is_1904))
}

/// styles.xmlからcellXfs順の数値書式を読む
fn load_number_formats<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
) -> Result<Vec<NumberFormat>, WorkbookError> {
    let Some(mut reader) = open_part(zip, PART_STYLES)? else {
        return Ok(Vec::new());
    };

    let mut custom_formats = HashMap::<u32, NumberFormat>::new();
    let mut format_ids = Vec::<u32>::new();
    let mut in_custom_formats = false;
    let mut in_cell_formats = false;

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => in_custom_formats = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => in_custom_formats = false,
        Event::Start(event) if in_custom_formats && event.name() == TAG_CUSTOM_FORMAT => {
            let id = attribute_value(&event, "numFmtId")?.and_then(|id| id.parse::<u32>().ok());
            let code = attribute_value(&event, "formatCode")?;
            if let Some((id, code)) = id.zip(code) {
                custom_formats.insert(id, NumberFormat::from_format_code(&code));
            }
        }
        Event::Start(event) if event.name() == TAG_CELL_FORMATS => in_cell_formats = true,
        Event::End(event) if event.name() == TAG_CELL_FORMATS => in_cell_formats = false,
        Event::Start(event) if in_cell_formats && event.name() == TAG_CELL_FORMAT => {
            let id = attribute_value(&event, "numFmtId")?
                .and_then(|id| id.parse::<u32>().ok())
                .unwrap_or(0);
            format_ids.push(id);
        }
    });

    Ok(format_ids
        .into_iter()
        .map(|id| {
            custom_formats
                .get(&id)
                .copied()
                .unwrap_or_else(|| NumberFormat::from_builtin_id(id))
        })
        .collect())
}

/// sharedStrings.xmlを読む
fn load_shared_strings<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
) -> Result<Vec<String>, WorkbookError> {
    let Some(mut reader) = open_part(zip, PART_SHARED_STRINGS)? else {
        return Ok(Vec::new());
    };

    let mut strings = Vec::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            strings.push(read_string(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
        }
    });
    Ok(strings)
}

/// 終了タグまでのテキストを読む
///
/// リッチテキストの各 `<t>` を連結し、ふりがな（`<rPh>`）は読み飛ばします。
fn read_string<R: Read + Seek>(
    reader: &mut PartReader<'_, R>,
    end_tag: QName,
    text_content: bool,
) -> Result<String, WorkbookError> {
    let mut in_phonetic = false;
    let mut in_text = text_content;
    let mut text = String::new();

    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_RUN => in_phonetic = true,
        Event::End(event) if event.name() == TAG_PHONETIC_RUN => in_phonetic = false,
        Event::Start(event) if !in_phonetic && event.name() == TAG_TEXT => in_text = true,
        Event::End(event) if event.name() == TAG_TEXT => in_text = text_content,
        Event::Text(event) if in_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if in_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if in_text => push_general_ref(&mut text, &event)?,
    });
    Ok(text)
}

/// ワークシートXMLから値を持つセルを読む
fn read_worksheet<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    part: &str,
) -> Result<Vec<RawCell>, WorkbookError> {
    let mut reader = require_part(zip, part)?;
    let mut cells = Vec::new();

    let mut next_row = 0usize;
    let mut next_col = 0usize;
    let mut current: Option<RawCell> = None;

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_ROW => {
            if let Some(row) = attribute_value(&event, "r")?.and_then(|r| r.parse::<usize>().ok()) {
                next_row = row.saturating_sub(1);
            }
            next_col = 0;
        }
        Event::End(event) if event.name() == TAG_ROW => next_row += 1,
        Event::Start(event) if event.name() == TAG_CELL => {
            let (row, col) = attribute_value(&event, "r")?
                .and_then(|reference| parse_cell_reference(&reference))
                .unwrap_or((next_row, next_col));
            next_col = col + 1;
            current = Some(RawCell {
                row,
                col,
                cell_type: attribute_value(&event, "t")?,
                style: attribute_value(&event, "s")?.and_then(|s| s.parse().ok()),
                value: String::new(),
            });
        }
        Event::Start(event) if current.is_some() && event.name() == TAG_VALUE => {
            let value = read_string(&mut reader, TAG_VALUE, true)?;
            if let Some(cell) = current.as_mut() {
                cell.value = value;
            }
        }
        Event::Start(event) if current.is_some() && event.name() == TAG_INLINE_STRING => {
            let value = read_string(&mut reader, TAG_INLINE_STRING, false)?;
            if let Some(cell) = current.as_mut() {
                cell.value = value;
            }
        }
        Event::End(event) if event.name() == TAG_CELL => {
            // 値を持たないセルは書式だけなので空セル扱い
            if let Some(cell) = current.take() {
                if !cell.value.is_empty() || cell.cell_type.as_deref() == Some("inlineStr") {
                    cells.push(cell);
                }
            }
        }
    });

    Ok(cells)
}

/// 生のセルをCellValueに分類
///
/// 解釈できない値は Err(生の値) を返します。
fn decode_cell(
    cell: &RawCell,
    format: NumberFormat,
    is_1904: bool,
    shared_strings: &[String],
) -> Result<CellValue, String> {
    let raw = cell.value.as_str();
    match cell.cell_type.as_deref() {
        Some("s") => raw
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|index| shared_strings.get(index))
            .map(|text| CellValue::Text(text.clone()))
            .ok_or_else(|| raw.to_string()),
        Some("str") | Some("inlineStr") => Ok(CellValue::Text(raw.to_string())),
        Some("b") => match raw.trim() {
            "1" | "true" | "TRUE" => Ok(CellValue::Boolean(true)),
            "0" | "false" | "FALSE" => Ok(CellValue::Boolean(false)),
            _ => Err(raw.to_string()),
        },
        Some("e") => Ok(CellValue::Missing),
        Some("d") => Ok(parse_iso_datetime(raw)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(raw.to_string()))),
        _ => {
            let number = raw.trim().parse::<f64>().map_err(|_| raw.to_string())?;
            if format == NumberFormat::DateTime {
                if let Some(datetime) = serial_to_datetime(number, is_1904) {
                    return Ok(CellValue::DateTime(datetime));
                }
            }
            Ok(number_value(number))
        }
    }
}

/// 整数値で表せる数値はIntegerにする
fn number_value(number: f64) -> CellValue {
    const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
    if number.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&number) {
        CellValue::Integer(number as i64)
    } else {
        CellValue::Float(number)
    }
}

fn parse_iso_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// "B12" のようなセル参照を0-basedの (行, 列) に変換
fn parse_cell_reference(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() {
        return None;
    }

    let mut col = 0usize;
    for letter in letters.chars() {
        if !letter.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (letter.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    let row = digits.parse::<usize>().ok()?;
    Some((row.checked_sub(1)?, col - 1))
}

/// 0-basedの (行, 列) をセル参照に変換
fn cell_reference(row: usize, col: usize) -> String {
    let mut letters = Vec::new();
    let mut n = col + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect::<String>() + &(row + 1).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(cell_type: Option<&str>, style: Option<usize>, value: &str) -> RawCell {
        RawCell {
            row: 0,
            col: 0,
            cell_type: cell_type.map(str::to_string),
            style,
            value: value.to_string(),
        }
    }

    fn decode(cell: RawCell, format: NumberFormat) -> Result<CellValue, String> {
        decode_cell(&cell, format, false, &["§ 1 — Scope".to_string()])
    }

    #[test]
    fn test_cell_reference_round_trip_examples() {
        assert_eq!(parse_cell_reference("A1"), Some((0, 0)));
        assert_eq!(parse_cell_reference("B12"), Some((11, 1)));
        assert_eq!(parse_cell_reference("AA3"), Some((2, 26)));
        assert_eq!(parse_cell_reference("12"), None);
        assert_eq!(parse_cell_reference("A0"), None);
        assert_eq!(cell_reference(11, 1), "B12");
        assert_eq!(cell_reference(0, 27), "AB1");
    }

    #[test]
    fn test_decode_strings_and_booleans() {
        assert_eq!(
            decode(raw(Some("s"), None, "0"), NumberFormat::General),
            Ok(CellValue::Text("§ 1 — Scope".to_string()))
        );
        assert!(decode(raw(Some("s"), None, "7"), NumberFormat::General).is_err());
        assert_eq!(
            decode(raw(Some("str"), None, "total"), NumberFormat::General),
            Ok(CellValue::Text("total".to_string()))
        );
        assert_eq!(
            decode(raw(Some("b"), None, "1"), NumberFormat::General),
            Ok(CellValue::Boolean(true))
        );
        assert_eq!(
            decode(raw(Some("e"), None, "#N/A"), NumberFormat::General),
            Ok(CellValue::Missing)
        );
    }

    #[test]
    fn test_decode_numbers() {
        assert_eq!(
            decode(raw(None, None, "42"), NumberFormat::General),
            Ok(CellValue::Integer(42))
        );
        assert_eq!(
            decode(raw(Some("n"), None, "3.0"), NumberFormat::General),
            Ok(CellValue::Integer(3))
        );
        assert_eq!(
            decode(raw(None, None, "2.5"), NumberFormat::General),
            Ok(CellValue::Float(2.5))
        );
        assert_eq!(
            decode(raw(None, None, "1e20"), NumberFormat::General),
            Ok(CellValue::Float(1e20))
        );
        assert!(decode(raw(None, None, "abc"), NumberFormat::General).is_err());
    }

    #[test]
    fn test_decode_dates() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(
            decode(raw(None, Some(1), "45292.5"), NumberFormat::DateTime),
            Ok(CellValue::DateTime(expected))
        );
        assert_eq!(
            decode(raw(Some("d"), None, "2024-01-01T12:00:00"), NumberFormat::General),
            Ok(CellValue::DateTime(expected))
        );
    }

    #[test]
    fn test_to_part_name() {
        assert_eq!(to_part_name("worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(to_part_name("/xl/worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(to_part_name("xl/worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
    }
}
