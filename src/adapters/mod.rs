// Adapters
// ワークブックとデータベースへのアクセスを抽象化

pub mod connection_string;
pub mod database;
pub mod database_sink;
pub mod sql_generator;
pub mod workbook;
