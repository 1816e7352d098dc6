use anyhow::{anyhow, Context, Result};
use clap::Parser;
use colored::control as color_control;
use std::env;
use std::path::PathBuf;
use std::process;
use strata_sheets::cli::commands::init::{InitCommand, InitCommandHandler};
use strata_sheets::cli::commands::inspect::{InspectCommand, InspectCommandHandler};
use strata_sheets::cli::commands::migrate::{MigrateCommand, MigrateCommandHandler};
use strata_sheets::cli::commands::verify::{VerifyCommand, VerifyCommandHandler};
use strata_sheets::cli::{Cli, Commands};
use strata_sheets::core::config::Dialect;
use strata_sheets::core::migration::CancellationFlag;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    sqlx::any::install_default_drivers();

    // CLIをパースして実行
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.no_color);

    // 非同期ランタイムを作成して実行
    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create Tokio runtime")
        .unwrap_or_else(|e| {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        });

    let result = runtime.block_on(run_command(cli));

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// ログ出力を初期化する（stderr、RUST_LOGが優先）
fn init_tracing(verbose: bool, no_color: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!no_color)
                .with_target(false),
        )
        .init();
}

/// コマンドを実行する
async fn run_command(cli: Cli) -> Result<String> {
    // --no-color フラグの処理
    if cli.no_color {
        color_control::set_override(false);
    }

    // プロジェクトのルートパスを取得
    let project_path = env::current_dir()?;

    // --config フラグの処理（絶対パスに変換）
    let config_path: Option<PathBuf> = cli.config.map(|p| {
        if p.is_absolute() {
            p
        } else {
            project_path.join(p)
        }
    });

    match cli.command {
        Commands::Init {
            dialect,
            source,
            database,
            force,
        } => {
            let dialect = parse_dialect(&dialect)?;
            let database_name = database.unwrap_or_else(|| match dialect {
                Dialect::SQLite => "strata_sheets.db".to_string(),
                _ => "strata_sheets".to_string(),
            });
            let command = InitCommand {
                project_path,
                config_path,
                dialect,
                source: source.unwrap_or_else(|| PathBuf::from("workbook.xlsx")),
                database_name,
                force,
            };
            let path = InitCommandHandler::new().execute(&command)?;
            Ok(format!("Config file written: {}", path.display()))
        }

        Commands::Migrate {
            file,
            batch_size,
            timeout,
        } => {
            let cancel = CancellationFlag::new();
            spawn_cancel_handler(cancel.clone());

            let command = MigrateCommand {
                project_path,
                config_path,
                file,
                batch_size,
                timeout,
                format: cli.format,
                cancel,
            };
            MigrateCommandHandler::new().execute(&command).await
        }

        Commands::Inspect { file } => {
            let command = InspectCommand {
                project_path,
                config_path,
                file,
                format: cli.format,
            };
            InspectCommandHandler::new().execute(&command)
        }

        Commands::Verify { timeout } => {
            let command = VerifyCommand {
                project_path,
                config_path,
                timeout,
                format: cli.format,
            };
            VerifyCommandHandler::new().execute(&command).await
        }
    }
}

/// Ctrl-Cでキャンセルフラグを立てる
///
/// 実行中のバッチは完了させ、次のバッチ・シートの前で停止します。
fn spawn_cancel_handler(cancel: CancellationFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current batch");
            cancel.cancel();
        }
    });
}

/// Dialect文字列をパースする
fn parse_dialect(dialect: &str) -> Result<Dialect> {
    match dialect.to_lowercase().as_str() {
        "postgresql" | "postgres" => Ok(Dialect::PostgreSQL),
        "mysql" => Ok(Dialect::MySQL),
        "sqlite" => Ok(Dialect::SQLite),
        other => Err(anyhow!(
            "Unsupported dialect: {}. Use one of postgresql, mysql, sqlite.",
            other
        )),
    }
}
