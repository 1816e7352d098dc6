/// MySQL統合テスト
///
/// testcontainersでMySQLを起動し、utf8mb4のテーブルへの移行と再実行を確認します。
///
/// 注意: Docker必須のテストは #[ignore] アトリビュートでマークされています。
mod common;

#[cfg(test)]
mod mysql_integration_tests {
    use super::common::{n, s, Cell, WorkbookFixture, STYLE_DATE};
    use sqlx::Row;
    use strata_sheets::adapters::database_sink::{DatabaseSink, SqlxDatabaseSink};
    use strata_sheets::adapters::workbook::XlsxWorkbook;
    use strata_sheets::core::config::{DatabaseConfig, Dialect};
    use strata_sheets::core::schema::ColumnTypeOverrides;
    use strata_sheets::services::sheet_migrator::{MigrationOptions, SheetMigrator};
    use tempfile::TempDir;
    use testcontainers::{runners::AsyncRunner, ContainerAsync};
    use testcontainers_modules::mysql::Mysql;

    /// MySQLコンテナを起動して接続設定を作成
    async fn setup_mysql_container(
    ) -> Result<(ContainerAsync<Mysql>, DatabaseConfig), Box<dyn std::error::Error>> {
        let container = Mysql::default().start().await?;
        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(3306).await?;

        let config = DatabaseConfig {
            host: host.to_string(),
            port: Some(port),
            database: "test".to_string(),
            user: Some("root".to_string()),
            timeout: Some(30),
            ..Default::default()
        };
        Ok((container, config))
    }

    #[tokio::test]
    #[ignore] // Docker必須
    async fn test_mysql_migration_keeps_multibyte_text() {
        sqlx::any::install_default_drivers();
        let (_container, config) = setup_mysql_container().await.unwrap();

        let temp_dir = TempDir::new().unwrap();
        let path = WorkbookFixture::new()
            .sheet(
                "Sections",
                vec![
                    vec![s("Heading"), s("Page"), s("Published")],
                    vec![s("§ 1 — Scope"), n(1), Cell::Date(45292.0, STYLE_DATE)],
                    vec![s("§ 2 — Terms"), n(300), Cell::Date(45293.5, STYLE_DATE)],
                ],
            )
            .write(&temp_dir.path().join("book.xlsx"));

        let sink = SqlxDatabaseSink::connect(Dialect::MySQL, &config)
            .await
            .unwrap();
        let migrator = SheetMigrator::new();
        let options = MigrationOptions::new(ColumnTypeOverrides::new(), 1);

        // 2回実行しても行数が変わらない
        for _ in 0..2 {
            let mut workbook = XlsxWorkbook::open(&path).unwrap();
            let summary = migrator
                .migrate(&mut workbook, &sink, &options)
                .await
                .unwrap();
            assert_eq!(summary.succeeded, 1);
            assert_eq!(sink.count_rows("sections").await.unwrap(), 2);
        }
        sink.close().await;

        let pool = sqlx::any::AnyPoolOptions::new()
            .max_connections(1)
            .connect(&format!(
                "mysql://root@{}:{}/test?charset=utf8mb4",
                config.host,
                config.port.unwrap()
            ))
            .await
            .unwrap();

        let rows = sqlx::query("SELECT heading, page FROM sections ORDER BY page")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(rows[0].get::<String, _>(0), "§ 1 — Scope");
        assert_eq!(rows[1].get::<String, _>(0), "§ 2 — Terms");

        let row = sqlx::query(
            "SELECT CAST(table_collation AS CHAR) FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_name = 'sections'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(row.get::<String, _>(0), "utf8mb4_unicode_ci");
        pool.close().await;
    }
}
