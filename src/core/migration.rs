// マイグレーションドメインモデル
//
// シート単位の移行結果（MigrationOutcome）と実行全体の集計（MigrationSummary）を
// 表現する型システム。

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 空シートをスキップしたときの詳細メッセージ
pub const SKIPPED_EMPTY: &str = "skipped: empty";

/// キャンセルによりスキップしたときの詳細メッセージ
pub const SKIPPED_CANCELLED: &str = "skipped: cancelled";

/// シートの最終状態
///
/// `Pending → {Skipped | Loaded | Failed}` の遷移のみを持ち、再試行はありません。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetStatus {
    /// 未処理
    Pending,
    /// 空シートまたはキャンセルによりスキップ
    Skipped,
    /// ロード成功
    Loaded,
    /// スキーマ作成またはロードに失敗
    Failed,
}

impl std::fmt::Display for SheetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetStatus::Pending => write!(f, "pending"),
            SheetStatus::Skipped => write!(f, "skipped"),
            SheetStatus::Loaded => write!(f, "loaded"),
            SheetStatus::Failed => write!(f, "failed"),
        }
    }
}

/// シート単位の移行結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationOutcome {
    /// 元のシート名
    pub sheet_name: String,
    /// 移行先テーブル名
    pub table_name: String,
    /// ロードした行数（スキップ・失敗時は書き込み済みの行数）
    pub row_count: u64,
    /// 最終状態
    pub status: SheetStatus,
    /// スキップ理由またはエラー詳細
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// 処理時間（ミリ秒）
    pub duration_ms: i64,
}

impl MigrationOutcome {
    /// ロード成功の結果を作成
    pub fn loaded(sheet_name: &str, table_name: &str, row_count: u64, duration: Duration) -> Self {
        Self {
            sheet_name: sheet_name.to_string(),
            table_name: table_name.to_string(),
            row_count,
            status: SheetStatus::Loaded,
            detail: None,
            duration_ms: duration.num_milliseconds(),
        }
    }

    /// スキップの結果を作成
    pub fn skipped(sheet_name: &str, table_name: &str, reason: &str) -> Self {
        Self {
            sheet_name: sheet_name.to_string(),
            table_name: table_name.to_string(),
            row_count: 0,
            status: SheetStatus::Skipped,
            detail: Some(reason.to_string()),
            duration_ms: 0,
        }
    }

    /// 失敗の結果を作成
    ///
    /// `rows_written` には失敗前にコミット済みのバッチの行数を渡します。
    pub fn failed(
        sheet_name: &str,
        table_name: &str,
        rows_written: u64,
        detail: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            sheet_name: sheet_name.to_string(),
            table_name: table_name.to_string(),
            row_count: rows_written,
            status: SheetStatus::Failed,
            detail: Some(detail.into()),
            duration_ms: duration.num_milliseconds(),
        }
    }

    /// ロードに成功したかどうか（スキップは成功ではない）
    pub fn success(&self) -> bool {
        self.status == SheetStatus::Loaded
    }
}

/// 実行全体の集計結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationSummary {
    /// 処理対象シート数
    pub total: usize,
    /// 成功数
    pub succeeded: usize,
    /// 失敗数
    pub failed: usize,
    /// スキップ数
    pub skipped: usize,
    /// ロードした総行数
    pub total_rows: u64,
    /// 開始時刻
    pub started_at: DateTime<Utc>,
    /// 終了時刻
    pub finished_at: DateTime<Utc>,
    /// キャンセルされたかどうか
    pub cancelled: bool,
    /// シートごとの結果
    pub outcomes: Vec<MigrationOutcome>,
}

impl MigrationSummary {
    /// 実行時間
    pub fn duration(&self) -> Duration {
        self.finished_at.signed_duration_since(self.started_at)
    }

    /// 失敗したシートの結果
    pub fn failures(&self) -> impl Iterator<Item = &MigrationOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == SheetStatus::Failed)
    }
}

/// 協調的キャンセルのフラグ
///
/// Ctrl-Cハンドラーなど別タスクから立てられ、シート間・バッチ間で確認されます。
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// キャンセルを要求
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// キャンセルが要求されたかどうか
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 移行後のテーブル検証結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableVerification {
    /// テーブル名
    pub table_name: String,
    /// 実テーブルの行数
    pub row_count: i64,
}
