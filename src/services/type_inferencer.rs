// 型推論サービス
//
// カラムのサンプル値から格納型を決定します。
// 値は1回の走査で分類（ColumnProfile）され、その結果を判定表に通して型を選びます。
// オーバーライドが存在するカラムは値を一切検査しません。

use crate::core::schema::{ColumnTypeOverrides, StorageType, TypeOrigin};
use crate::core::sheet::{CellValue, ValueKind};

/// この値未満の最大値はSMALLINT
pub const SMALLINT_THRESHOLD: i64 = 127;

/// この値未満の最大値はINT（以上はBIGINT）
pub const INT_THRESHOLD: i64 = 32767;

/// 浮動小数点カラムの格納型
pub const FLOAT_STORAGE_TYPE: StorageType = StorageType::DecimalFixed {
    precision: 15,
    scale: 4,
};

/// 文字列長が不明なときの既定長
pub const DEFAULT_TEXT_LENGTH: usize = 255;

/// バッファ付きVARCHARの上限
pub const VARCHAR_CAP: u32 = 1000;

/// 長文VARCHARの長さ
pub const WIDE_VARCHAR_LENGTH: u32 = 5000;

/// カラム値の分類結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnProfile {
    /// 欠損でない値の数
    pub present: usize,
    pub integers: usize,
    pub floats: usize,
    pub booleans: usize,
    pub datetimes: usize,
    pub texts: usize,
    /// 整数値の最大値
    pub max_integer: Option<i64>,
    /// 文字列表現の最大文字数
    pub max_length: usize,
}

impl ColumnProfile {
    /// 値を1回走査して分類
    pub fn classify<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a CellValue>,
    {
        let mut profile = Self::default();
        for value in values {
            match value {
                CellValue::Missing => continue,
                CellValue::Integer(number) => {
                    profile.integers += 1;
                    profile.max_integer = Some(
                        profile
                            .max_integer
                            .map_or(*number, |max| max.max(*number)),
                    );
                }
                CellValue::Float(_) => profile.floats += 1,
                CellValue::Boolean(_) => profile.booleans += 1,
                CellValue::DateTime(_) => profile.datetimes += 1,
                CellValue::Text(_) => profile.texts += 1,
            }
            profile.present += 1;
            profile.max_length = profile.max_length.max(value.rendered_length());
        }
        profile
    }

    /// カラム全体としての値の種類
    ///
    /// 欠損値は無視します。欠損値しかないカラムはTextとして扱います。
    pub fn column_kind(&self) -> ValueKind {
        if self.present == 0 {
            ValueKind::Text
        } else if self.integers == self.present {
            ValueKind::Integer
        } else if self.integers + self.floats == self.present {
            ValueKind::Float
        } else if self.booleans == self.present {
            ValueKind::Boolean
        } else if self.datetimes == self.present {
            ValueKind::DateTime
        } else {
            ValueKind::Text
        }
    }
}

/// 型推論サービス
#[derive(Debug, Clone, Default)]
pub struct TypeInferencer {}

impl TypeInferencer {
    /// 新しいTypeInferencerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// カラムの格納型を決定
    ///
    /// # Arguments
    ///
    /// * `table_name` - サニタイズ済みテーブル名
    /// * `column_name` - サニタイズ済みカラム名
    /// * `values` - カラムのサンプル値
    /// * `overrides` - カラム型オーバーライド
    ///
    /// # Returns
    ///
    /// 格納型とその決定元
    pub fn infer(
        &self,
        table_name: &str,
        column_name: &str,
        values: &[CellValue],
        overrides: &ColumnTypeOverrides,
    ) -> (StorageType, TypeOrigin) {
        if let Some(declared) = overrides.lookup(table_name, column_name) {
            return (declared, TypeOrigin::Override);
        }

        let profile = ColumnProfile::classify(values);
        (self.infer_from_profile(&profile), TypeOrigin::Inferred)
    }

    /// 分類結果から格納型を決定
    pub fn infer_from_profile(&self, profile: &ColumnProfile) -> StorageType {
        match profile.column_kind() {
            ValueKind::Integer => integer_type(profile.max_integer.unwrap_or(0)),
            ValueKind::Float => FLOAT_STORAGE_TYPE,
            ValueKind::Boolean => StorageType::Boolean,
            ValueKind::DateTime => StorageType::DateTime,
            ValueKind::Text | ValueKind::Missing => text_type(profile.max_length),
        }
    }
}

/// 最大値から整数型を選択
///
/// 閾値は8/16ビットの範囲ではなく、既存データとの互換性のために固定された値です。
fn integer_type(max_value: i64) -> StorageType {
    if max_value < SMALLINT_THRESHOLD {
        StorageType::SmallInt
    } else if max_value < INT_THRESHOLD {
        StorageType::Int
    } else {
        StorageType::BigInt
    }
}

/// 最大文字数から文字列型を選択
fn text_type(max_length: usize) -> StorageType {
    let max_length = if max_length == 0 {
        DEFAULT_TEXT_LENGTH
    } else {
        max_length
    };

    if max_length > WIDE_VARCHAR_LENGTH as usize {
        StorageType::Text
    } else if max_length > VARCHAR_CAP as usize {
        StorageType::VarChar {
            length: WIDE_VARCHAR_LENGTH,
        }
    } else {
        // 観測された最大長に50%のバッファを加える（端数は四捨五入）
        let buffered = (max_length as f64 * 1.5).round() as u32;
        StorageType::VarChar {
            length: buffered.min(VARCHAR_CAP),
        }
    }
}
