// 命名ポリシー
//
// バイナリ名と設定ファイル名の単一ソース、および
// シート名・列ラベルから安全なSQL識別子を導出するサニタイザーを提供します。

use std::collections::HashSet;

/// 既定の設定ファイル名
pub const CONFIG_FILE: &str = ".strata-sheets.yaml";

/// バイナリ名
pub const BINARY_NAME: &str = "strata-sheets";

/// 識別子の最大長（MySQLの制限）
pub const MAX_IDENTIFIER_LENGTH: usize = 64;

/// 識別子の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    /// テーブル名（シート名から導出）
    Table,
    /// カラム名（ヘッダーラベルから導出）
    Column,
}

impl NameKind {
    /// 数字で始まる識別子に付与するプレフィックス
    fn digit_prefix(&self) -> &'static str {
        match self {
            NameKind::Table => "table_",
            NameKind::Column => "column_",
        }
    }

    /// サニタイズ結果が空の場合の代替名
    fn fallback(&self) -> &'static str {
        match self {
            NameKind::Table => "table",
            NameKind::Column => "column",
        }
    }
}

/// ラベルを安全な小文字の識別子に変換
///
/// 1. 前後の空白を除去
/// 2. `[A-Za-z0-9_]` 以外の文字（空白・ハイフンを含む）を `_` に置換
/// 3. 数字で始まる場合は種類に応じたプレフィックスを付与
/// 4. 小文字化し、64文字に切り詰め
///
/// サニタイズ済みの名前を再度渡しても結果は変わりません。
pub fn sanitize(label: &str, kind: NameKind) -> String {
    let replaced: String = label
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    let mut name = if replaced.is_empty() {
        kind.fallback().to_string()
    } else if replaced.starts_with(|c: char| c.is_ascii_digit()) {
        format!("{}{}", kind.digit_prefix(), replaced)
    } else {
        replaced
    };

    name.make_ascii_lowercase();
    // ASCIIのみなのでバイト境界で切り詰めて問題ない
    name.truncate(MAX_IDENTIFIER_LENGTH);
    name
}

/// 使用済み識別子のレジストリ
///
/// サニタイズ後に衝突した名前へ `_2`, `_3`, ... を付与して一意にします。
/// テーブル名は実行単位、カラム名はテーブル単位で1つずつ使用します。
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    used: HashSet<String>,
}

impl NameRegistry {
    /// 新しい空のレジストリを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// ラベルをサニタイズし、未使用の識別子を確保する
    pub fn claim(&mut self, label: &str, kind: NameKind) -> String {
        let base = sanitize(label, kind);
        if self.used.insert(base.clone()) {
            return base;
        }

        let mut counter = 2usize;
        loop {
            let suffix = format!("_{}", counter);
            let mut candidate = base.clone();
            candidate.truncate(MAX_IDENTIFIER_LENGTH - suffix.len());
            candidate.push_str(&suffix);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            counter += 1;
        }
    }

    /// 識別子が使用済みかどうか
    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_spaces_and_hyphens() {
        assert_eq!(sanitize("  Sales Data-2024 ", NameKind::Table), "sales_data_2024");
    }

    #[test]
    fn test_sanitize_replaces_special_characters() {
        assert_eq!(sanitize("Price (€)", NameKind::Column), "price____");
        assert_eq!(sanitize("§ 12.3", NameKind::Column), "__12_3");
    }

    #[test]
    fn test_sanitize_digit_prefix_per_kind() {
        assert_eq!(sanitize("2024 Results", NameKind::Table), "table_2024_results");
        assert_eq!(sanitize("1st", NameKind::Column), "column_1st");
    }

    #[test]
    fn test_sanitize_empty_label_falls_back() {
        assert_eq!(sanitize("   ", NameKind::Table), "table");
        assert_eq!(sanitize("", NameKind::Column), "column");
    }

    #[test]
    fn test_sanitize_truncates_to_identifier_limit() {
        let label = "a".repeat(100);
        assert_eq!(sanitize(&label, NameKind::Table).len(), MAX_IDENTIFIER_LENGTH);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let labels = [
            "Customer Orders",
            "9 lives",
            "Ünïcödé — name",
            "already_clean",
            "",
            &"Long Label ".repeat(10),
        ];
        for label in labels {
            for kind in [NameKind::Table, NameKind::Column] {
                let once = sanitize(label, kind);
                assert_eq!(sanitize(&once, kind), once, "label: {:?}", label);
            }
        }
    }

    #[test]
    fn test_registry_suffixes_collisions() {
        let mut registry = NameRegistry::new();
        assert_eq!(registry.claim("Sales Data", NameKind::Table), "sales_data");
        assert_eq!(registry.claim("sales-data", NameKind::Table), "sales_data_2");
        assert_eq!(registry.claim("SALES DATA", NameKind::Table), "sales_data_3");
        assert!(registry.contains("sales_data_2"));
    }

    #[test]
    fn test_registry_suffix_respects_length_limit() {
        let mut registry = NameRegistry::new();
        let label = "x".repeat(80);
        let first = registry.claim(&label, NameKind::Column);
        let second = registry.claim(&label, NameKind::Column);

        assert_eq!(first.len(), MAX_IDENTIFIER_LENGTH);
        assert_eq!(second.len(), MAX_IDENTIFIER_LENGTH);
        assert!(second.ends_with("_2"));
    }

    #[test]
    fn test_registry_skips_taken_suffix() {
        let mut registry = NameRegistry::new();
        registry.claim("name_2", NameKind::Column);
        assert_eq!(registry.claim("name", NameKind::Column), "name");
        assert_eq!(registry.claim("Name", NameKind::Column), "name_3");
    }
}
