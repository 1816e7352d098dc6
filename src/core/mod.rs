// Core Domain
// 命名規則、シート・スキーマ・移行結果のモデル、設定とエラー型の純粋なドメイン層

pub mod config;
pub mod error;
pub mod migration;
pub mod naming;
pub mod schema;
pub mod sheet;
