// 移行結果の集計サービス
//
// シートごとの結果を状態別に数え、行数を合計するだけの純粋な集計。

use crate::core::migration::{MigrationOutcome, MigrationSummary, SheetStatus, SKIPPED_CANCELLED};
use chrono::{DateTime, Utc};

/// 移行結果の集計
pub fn aggregate(
    outcomes: Vec<MigrationOutcome>,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
) -> MigrationSummary {
    let count = |status: SheetStatus| outcomes.iter().filter(|o| o.status == status).count();

    let succeeded = count(SheetStatus::Loaded);
    let failed = count(SheetStatus::Failed);
    let skipped = count(SheetStatus::Skipped);
    let total_rows = outcomes
        .iter()
        .filter(|o| o.success())
        .map(|o| o.row_count)
        .sum();
    let cancelled = outcomes
        .iter()
        .any(|o| o.detail.as_deref() == Some(SKIPPED_CANCELLED));

    MigrationSummary {
        total: outcomes.len(),
        succeeded,
        failed,
        skipped,
        total_rows,
        started_at,
        finished_at,
        cancelled,
        outcomes,
    }
}
