// 統合テスト共通ヘルパー
//
// テスト内でXLSXファイルを組み立てるフィクスチャと、SQLiteの移行先を用意するヘルパー。

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use strata_sheets::adapters::database_sink::SqlxDatabaseSink;
use strata_sheets::core::config::{DatabaseConfig, Dialect};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// スタイルインデックス：組み込みの日付書式（numFmtId=14）
pub const STYLE_DATE: usize = 1;
/// スタイルインデックス：カスタムの日時書式（numFmtId=164）
pub const STYLE_DATETIME: usize = 2;

/// フィクスチャのセル
#[derive(Debug, Clone)]
pub enum Cell {
    /// 共有文字列
    Shared(String),
    /// インライン文字列
    Inline(String),
    /// 数値（書式なし）
    Number(String),
    /// 日付書式付きのシリアル値
    Date(f64, usize),
    Bool(bool),
    /// エラーセル（#N/Aなど）
    Error(String),
    /// `t` 属性と値をそのまま書き込む
    Raw(Option<String>, String),
    Empty,
}

pub fn s(text: &str) -> Cell {
    Cell::Shared(text.to_string())
}

pub fn n(number: impl ToString) -> Cell {
    Cell::Number(number.to_string())
}

/// ワークブックフィクスチャ
#[derive(Debug, Clone, Default)]
pub struct WorkbookFixture {
    sheets: Vec<(String, Vec<Vec<Cell>>)>,
    date1904: bool,
}

impl WorkbookFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet(mut self, name: &str, rows: Vec<Vec<Cell>>) -> Self {
        self.sheets.push((name.to_string(), rows));
        self
    }

    pub fn date1904(mut self) -> Self {
        self.date1904 = true;
        self
    }

    /// ファイルに書き出す
    pub fn write(&self, path: &Path) -> PathBuf {
        let mut shared_strings: Vec<String> = Vec::new();
        let mut worksheets = Vec::new();
        for (_, rows) in &self.sheets {
            worksheets.push(worksheet_xml(rows, &mut shared_strings));
        }

        let mut parts = vec![
            ("[Content_Types].xml".to_string(), CONTENT_TYPES.to_string()),
            ("_rels/.rels".to_string(), ROOT_RELS.to_string()),
            ("xl/workbook.xml".to_string(), self.workbook_xml()),
            ("xl/_rels/workbook.xml.rels".to_string(), self.workbook_rels()),
            ("xl/styles.xml".to_string(), STYLES.to_string()),
            (
                "xl/sharedStrings.xml".to_string(),
                shared_strings_xml(&shared_strings),
            ),
        ];
        for (index, xml) in worksheets.into_iter().enumerate() {
            parts.push((format!("xl/worksheets/sheet{}.xml", index + 1), xml));
        }

        write_parts(path, &parts);
        path.to_path_buf()
    }

    fn workbook_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        );
        if self.date1904 {
            xml.push_str(r#"<workbookPr date1904="1"/>"#);
        }
        xml.push_str("<sheets>");
        for (index, (name, _)) in self.sheets.iter().enumerate() {
            xml.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape(name),
                index + 1,
                index + 1
            ));
        }
        xml.push_str("</sheets></workbook>");
        xml
    }

    fn workbook_rels(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for index in 1..=self.sheets.len() {
            xml.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                index, index
            ));
        }
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
            self.sheets.len() + 1
        ));
        xml.push_str("</Relationships>");
        xml
    }
}

/// 任意のパートでzipアーカイブを書き出す
pub fn write_parts(path: &Path, parts: &[(String, String)]) {
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    for (name, content) in parts {
        zip.start_file(name.as_str(), SimpleFileOptions::default())
            .unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

fn worksheet_xml(rows: &[Vec<Cell>], shared_strings: &mut Vec<String>) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (row_index, row) in rows.iter().enumerate() {
        xml.push_str(&format!(r#"<row r="{}">"#, row_index + 1));
        for (col_index, cell) in row.iter().enumerate() {
            let reference = format!("{}{}", column_letters(col_index), row_index + 1);
            xml.push_str(&cell_xml(&reference, cell, shared_strings));
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn cell_xml(reference: &str, cell: &Cell, shared_strings: &mut Vec<String>) -> String {
    match cell {
        Cell::Shared(text) => {
            let index = match shared_strings.iter().position(|s| s == text) {
                Some(index) => index,
                None => {
                    shared_strings.push(text.clone());
                    shared_strings.len() - 1
                }
            };
            format!(r#"<c r="{}" t="s"><v>{}</v></c>"#, reference, index)
        }
        Cell::Inline(text) => format!(
            r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
            reference,
            escape(text)
        ),
        Cell::Number(number) => format!(r#"<c r="{}"><v>{}</v></c>"#, reference, number),
        Cell::Date(serial, style) => format!(
            r#"<c r="{}" s="{}"><v>{}</v></c>"#,
            reference, style, serial
        ),
        Cell::Bool(value) => format!(
            r#"<c r="{}" t="b"><v>{}</v></c>"#,
            reference,
            u8::from(*value)
        ),
        Cell::Error(code) => format!(
            r#"<c r="{}" t="e"><v>{}</v></c>"#,
            reference,
            escape(code)
        ),
        Cell::Raw(cell_type, value) => match cell_type {
            Some(t) => format!(r#"<c r="{}" t="{}"><v>{}</v></c>"#, reference, t, value),
            None => format!(r#"<c r="{}"><v>{}</v></c>"#, reference, value),
        },
        Cell::Empty => format!(r#"<c r="{}" s="0"/>"#, reference),
    }
}

fn shared_strings_xml(strings: &[String]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    );
    for text in strings {
        xml.push_str(&format!(
            r#"<si><t xml:space="preserve">{}</t></si>"#,
            escape(text)
        ));
    }
    xml.push_str("</sst>");
    xml
}

fn column_letters(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        letters.push((b'A' + ((n - 1) % 26) as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy\-mm\-dd\ hh:mm"/></numFmts><cellXfs count="3"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/><xf numFmtId="164" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs></styleSheet>"#;

/// SQLiteの移行先データベースのパス
pub fn sqlite_path(temp_dir: &TempDir) -> String {
    temp_dir
        .path()
        .join("destination.db")
        .to_string_lossy()
        .to_string()
}

/// SQLiteの移行先に接続
pub async fn sqlite_sink(temp_dir: &TempDir) -> SqlxDatabaseSink {
    sqlx::any::install_default_drivers();
    let config = DatabaseConfig {
        database: sqlite_path(temp_dir),
        ..Default::default()
    };
    SqlxDatabaseSink::connect(Dialect::SQLite, &config)
        .await
        .unwrap()
}

/// SQLiteの移行先に直接接続して検証クエリを実行するためのプール
pub async fn sqlite_pool(temp_dir: &TempDir) -> sqlx::AnyPool {
    sqlx::any::install_default_drivers();
    sqlx::any::AnyPoolOptions::new()
        .max_connections(1)
        .connect(&format!("sqlite://{}?mode=rwc", sqlite_path(temp_dir)))
        .await
        .unwrap()
}
