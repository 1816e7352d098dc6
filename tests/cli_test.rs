/// CLIコマンドのテスト
///
/// init・inspect・migrate・verifyの各ハンドラーをSQLiteの移行先で通しで実行します。
mod common;

use clap::Parser;
use common::{n, s, Cell, WorkbookFixture, STYLE_DATE};
use std::fs;
use std::path::{Path, PathBuf};
use strata_sheets::cli::commands::init::{InitCommand, InitCommandHandler};
use strata_sheets::cli::commands::inspect::{InspectCommand, InspectCommandHandler};
use strata_sheets::cli::commands::migrate::{MigrateCommand, MigrateCommandHandler};
use strata_sheets::cli::commands::verify::{VerifyCommand, VerifyCommandHandler};
use strata_sheets::cli::{Cli, Commands, OutputFormat};
use strata_sheets::core::config::{Config, Dialect};
use strata_sheets::core::error::MigrationError;
use strata_sheets::core::migration::CancellationFlag;
use tempfile::TempDir;

/// SQLiteを移行先とするプロジェクトを作成
fn setup_project(temp_dir: &TempDir) -> PathBuf {
    let project_path = temp_dir.path().to_path_buf();
    let database = project_path.join("out.db");

    InitCommandHandler::new()
        .execute(&InitCommand {
            project_path: project_path.clone(),
            config_path: None,
            dialect: Dialect::SQLite,
            source: PathBuf::from("survey.xlsx"),
            database_name: database.to_string_lossy().to_string(),
            force: false,
        })
        .unwrap();

    // 型オーバーライドを追記
    let config_path = project_path.join(Config::DEFAULT_CONFIG_PATH);
    let mut yaml = fs::read_to_string(&config_path).unwrap();
    yaml.push_str("\ncolumn_types:\n  \"responses.Score\": \"DECIMAL(5, 2)\"\n");
    fs::write(&config_path, yaml).unwrap();

    WorkbookFixture::new()
        .sheet(
            "Responses",
            vec![
                vec![s("Respondent"), s("Score"), s("Submitted")],
                vec![s("§ 1 — Scope"), n(4), Cell::Date(45292.0, STYLE_DATE)],
                vec![s("b"), n(5), Cell::Date(45293.0, STYLE_DATE)],
            ],
        )
        .sheet("Empty", vec![vec![s("x")]])
        .write(&project_path.join("survey.xlsx"));

    project_path
}

fn migrate_command(project_path: &Path, format: OutputFormat) -> MigrateCommand {
    MigrateCommand {
        project_path: project_path.to_path_buf(),
        config_path: None,
        file: None,
        batch_size: None,
        timeout: None,
        format,
        cancel: CancellationFlag::new(),
    }
}

#[test]
fn test_cli_can_parse_every_command() {
    for args in [
        vec!["strata-sheets", "init", "--dialect", "sqlite"],
        vec!["strata-sheets", "migrate"],
        vec!["strata-sheets", "inspect", "--file", "a.xlsx"],
        vec!["strata-sheets", "verify", "--timeout", "5"],
    ] {
        assert!(Cli::try_parse_from(args).is_ok());
    }

    let cli = Cli::try_parse_from(["strata-sheets", "--config", "custom.yaml", "verify"]).unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
    assert!(matches!(cli.command, Commands::Verify { .. }));
}

#[test]
fn test_inspect_prints_inferred_schema() {
    let temp_dir = TempDir::new().unwrap();
    let project_path = setup_project(&temp_dir);

    let output = InspectCommandHandler::new()
        .execute(&InspectCommand {
            project_path: project_path.clone(),
            config_path: None,
            file: None,
            format: OutputFormat::Text,
        })
        .unwrap();

    assert!(output.contains("responses"));
    assert!(output.contains("DECIMAL(5,2)"));
    assert!(output.contains("(override)"));
    assert!(output.contains("DATETIME"));
    assert!(output.contains("skipped: no data rows"));
    // ドライランはデータベースを作成しない
    assert!(!project_path.join("out.db").exists());
}

#[tokio::test]
async fn test_migrate_then_verify() {
    sqlx::any::install_default_drivers();
    let temp_dir = TempDir::new().unwrap();
    let project_path = setup_project(&temp_dir);

    let output = MigrateCommandHandler::new()
        .execute(&migrate_command(&project_path, OutputFormat::Json))
        .await
        .unwrap();

    let report: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(report["summary"]["succeeded"], 1);
    assert_eq!(report["summary"]["skipped"], 1);
    assert_eq!(report["summary"]["failed"], 0);
    assert_eq!(report["summary"]["total_rows"], 2);
    assert_eq!(report["verification"][0]["table_name"], "responses");
    assert_eq!(report["verification"][0]["row_count"], 2);

    let verify = VerifyCommandHandler::new()
        .execute(&VerifyCommand {
            project_path: project_path.clone(),
            config_path: None,
            timeout: None,
            format: OutputFormat::Text,
        })
        .await
        .unwrap();
    assert!(verify.contains("responses"));
    assert!(!verify.contains("empty"));
}

#[tokio::test]
async fn test_migrate_missing_workbook_is_fatal() {
    sqlx::any::install_default_drivers();
    let temp_dir = TempDir::new().unwrap();
    let project_path = setup_project(&temp_dir);

    let mut command = migrate_command(&project_path, OutputFormat::Text);
    command.file = Some(project_path.join("missing.xlsx"));

    let error = MigrateCommandHandler::new()
        .execute(&command)
        .await
        .unwrap_err();

    assert!(matches!(
        error.downcast_ref::<MigrationError>(),
        Some(MigrationError::SourceUnavailable { .. })
    ));
}

#[tokio::test]
async fn test_migrate_rejects_zero_batch_size() {
    let temp_dir = TempDir::new().unwrap();
    let project_path = setup_project(&temp_dir);

    let mut command = migrate_command(&project_path, OutputFormat::Text);
    command.batch_size = Some(0);

    let error = MigrateCommandHandler::new()
        .execute(&command)
        .await
        .unwrap_err();
    assert!(error.to_string().contains("batch_size"));
}
