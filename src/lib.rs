// strata-sheetsライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（ユーザー入力の受付とコマンドルーティング）
// - core: コアドメインロジック（命名、シート・スキーマ・移行結果のモデル、設定、エラー）
// - services: 型推論、スキーマ構築、テーブルロード、シート移行
// - adapters: ワークブックとデータベースへのアクセスを抽象化

pub mod adapters;
pub mod cli;
pub mod core;
pub mod services;
