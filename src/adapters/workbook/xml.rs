// XML読み込みヘルパー
//
// ワークブック内のXMLパートを読むためのquick-xmlラッパー。
// 属性値の取得とテキスト・実体参照の連結を提供します。

use crate::core::error::WorkbookError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;

/// スプレッドシート用に設定したXMLリーダー
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        // <c r="A1"/> も Start/End の組として扱う
        config.expand_empty_elements = true;
        config.trim_text(false);

        Self {
            reader,
            buffer: Vec::with_capacity(1024),
        }
    }

    /// 次のイベントを読む（EOFでNone）
    pub(crate) fn next(&mut self) -> Result<Option<Event<'_>>, WorkbookError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer)? {
            Event::Eof => Ok(None),
            event => Ok(Some(event)),
        }
    }
}

/// 要素の属性値を取得
///
/// 名前空間プレフィックスは無視してローカル名で照合します（`r:id` は `id`）。
pub(crate) fn attribute_value(
    element: &BytesStart<'_>,
    local_name: &str,
) -> Result<Option<String>, WorkbookError> {
    for attribute in element.attributes() {
        let attribute = attribute?;
        if attribute.key.local_name().as_ref() == local_name.as_bytes() {
            return Ok(Some(attribute.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// 実体参照・文字参照を解決して追加
pub(crate) fn push_general_ref(text: &mut String, reference: &BytesRef<'_>) -> Result<(), WorkbookError> {
    let raw = reference.xml_content()?;
    if let Some(number) = raw.strip_prefix('#') {
        let code = match number.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => number.parse::<u32>(),
        }
        .map_err(|_| WorkbookError::XmlEntity(raw.to_string()))?;
        if let Some(character) = char::from_u32(code) {
            text.push(character);
        }
    } else if let Some(entity) = resolve_xml_entity(&raw) {
        text.push_str(entity);
    } else {
        return Err(WorkbookError::XmlEntity(raw.to_string()));
    }
    Ok(())
}

/// EOFまでイベントを読み、一致したアームを実行する
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(event) = $reader.next()? {
            match event {
                $($arms)*
                _ => (),
            }
        }
    };
}

pub(crate) use match_xml_events;
