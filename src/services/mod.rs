// Services Layer
// ドメインロジックを実行するサービス層

pub mod config_loader;
pub mod database_config_resolver;
pub mod migration_report;
pub mod schema_builder;
pub mod sheet_migrator;
pub mod table_loader;
pub mod type_inferencer;
