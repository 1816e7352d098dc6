/// 設定ファイル管理機能のテスト
///
/// 設定ファイルの読み込み、既定値の適用、型オーバーライドの検証が
/// 正しく動作することを確認します。

#[cfg(test)]
mod config_tests {
    use std::fs;
    use std::path::Path;
    use strata_sheets::core::config::{Config, Dialect, DEFAULT_BATCH_SIZE};
    use strata_sheets::core::error::ConfigError;
    use strata_sheets::core::schema::StorageType;
    use strata_sheets::services::config_loader::ConfigLoader;
    use tempfile::TempDir;

    /// Config構造体が正しくデシリアライズできることを確認
    #[test]
    fn test_config_deserialization() {
        let yaml = r#"
version: "1.0"
source: exports/survey.xlsm
dialect: postgresql
database:
  host: db.example.com
  port: 5433
  database: survey
  user: loader
  password: secret
  timeout: 10
batch_size: 500
column_types:
  "responses.Respondent ID": BIGINT
  comment: "VARCHAR(2000)"
"#;

        let config = ConfigLoader::from_yaml(yaml).unwrap();

        assert_eq!(config.version, "1.0");
        assert_eq!(config.source, Path::new("exports/survey.xlsm"));
        assert_eq!(config.dialect, Dialect::PostgreSQL);
        assert_eq!(config.database.port, Some(5433));
        assert_eq!(config.database.timeout, Some(10));
        assert_eq!(config.batch_size, 500);
        assert!(config.validate().is_ok());

        let overrides = config.column_type_overrides().unwrap();
        assert_eq!(
            overrides.lookup("responses", "respondent_id"),
            Some(StorageType::BigInt)
        );
        assert_eq!(
            overrides.lookup("anything", "comment"),
            Some(StorageType::VarChar { length: 2000 })
        );
    }

    /// 省略した項目に既定値が入ることを確認
    #[test]
    fn test_defaults() {
        let yaml = r#"
version: "1.0"
source: survey.xlsx
database:
  database: survey
"#;
        let config = ConfigLoader::from_yaml(yaml).unwrap();

        assert_eq!(config.dialect, Dialect::MySQL);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.database.resolved_port(config.dialect), 3306);
        assert_eq!(config.database.charset, "utf8mb4");
        assert_eq!(config.database.collation, "utf8mb4_unicode_ci");
    }

    /// 不正な設定が検証で拒否されることを確認
    #[test]
    fn test_validation_errors() {
        let zero_batch = ConfigLoader::from_yaml(
            "version: \"1.0\"\nsource: a.xlsx\ndatabase:\n  database: d\nbatch_size: 0\n",
        )
        .unwrap();
        assert!(matches!(
            zero_batch.validate(),
            Err(ConfigError::InvalidBatchSize)
        ));

        let bad_type = ConfigLoader::from_yaml(
            "version: \"1.0\"\nsource: a.xlsx\ndatabase:\n  database: d\ncolumn_types:\n  price: MONEY\n",
        )
        .unwrap();
        match bad_type.validate() {
            Err(ConfigError::InvalidColumnType { key, declaration }) => {
                assert_eq!(key, "price");
                assert_eq!(declaration, "MONEY");
            }
            other => panic!("expected InvalidColumnType, got {:?}", other),
        }
    }

    /// 必須項目の欠落はパースエラーになることを確認
    #[test]
    fn test_missing_database_section() {
        let result = ConfigLoader::from_yaml("version: \"1.0\"\nsource: a.xlsx\n");
        assert!(result.is_err());
    }

    /// ファイルからの読み込みとデフォルトパス
    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(Config::DEFAULT_CONFIG_PATH);
        fs::write(
            &path,
            "version: \"1.0\"\nsource: a.xlsx\ndialect: sqlite\ndatabase:\n  database: out.db\n",
        )
        .unwrap();

        let config = ConfigLoader::from_file(&path).unwrap();
        assert_eq!(config.dialect, Dialect::SQLite);
        assert_eq!(Config::DEFAULT_CONFIG_PATH, ".strata-sheets.yaml");
    }
}
