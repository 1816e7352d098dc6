// 数値書式の判定
//
// セルのスタイルが日付・時刻書式かどうかを判定し、
// Excelのシリアル値を日時に変換します。

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

/// Excelが表現できる最大のシリアル値（9999-12-31）
const MAX_SERIAL: f64 = 2_958_465.0;

/// セルスタイルの数値書式区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum NumberFormat {
    #[default]
    General,
    /// 日付・時刻・日時のいずれか
    DateTime,
}

impl NumberFormat {
    /// 組み込み書式IDから判定
    pub(crate) fn from_builtin_id(id: u32) -> Self {
        match id {
            14..=22 | 45..=47 => NumberFormat::DateTime,
            _ => NumberFormat::General,
        }
    }

    /// カスタム書式コードから判定
    ///
    /// 引用符内のリテラル、角括弧内の色・ロケール指定、エスケープ文字を除いて
    /// 年・日・時・秒のトークンが含まれていれば日時書式とみなします。
    pub(crate) fn from_format_code(code: &str) -> Self {
        let mut escaped = false;
        let mut literal = false;
        let mut bracket = false;

        for character in code.chars() {
            match character {
                _ if escaped => escaped = false,
                '\\' | '_' if !literal => escaped = true,
                '"' => literal = !literal,
                _ if literal => (),
                '[' => bracket = true,
                ']' => bracket = false,
                _ if bracket => (),
                'y' | 'Y' | 'd' | 'D' | 'h' | 'H' | 's' | 'S' => return NumberFormat::DateTime,
                _ => (),
            }
        }
        NumberFormat::General
    }
}

/// シリアル値を日時に変換
///
/// 1900年基準では1900-02-29が存在するものとして数える既知の不具合を再現します。
/// 範囲外の値はNoneを返します。
pub(crate) fn serial_to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }

    let days = serial.trunc() as i64;
    let millis = (serial.fract() * 86_400_000f64).round() as i64;
    let offset = if is_1904 {
        1_462
    } else if days < 60 {
        1
    } else {
        0
    };

    NaiveDate::from_ymd_opt(1899, 12, 30)?
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(TimeDelta::try_days(days + offset)?)?
        .checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}
