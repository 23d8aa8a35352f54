//! specgen 命令行入口

use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use specgen::cli::Cli;
use specgen::config::AppConfig;

/// 在 Windows 上设置控制台代码页为 UTF-8
#[cfg(windows)]
fn setup_console_encoding() {
    unsafe {
        extern "system" {
            fn SetConsoleOutputCP(code_page: u32) -> i32;
        }
        SetConsoleOutputCP(65001);
    }
}

#[cfg(not(windows))]
fn setup_console_encoding() {}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;

    let artifacts = specgen::run(&cli, &config)
        .await
        .with_context(|| format!("failed to generate documents from {}", cli.source.display()))?;

    info!(
        "Artifacts: {}, {}",
        artifacts.overview.display(),
        artifacts.specification.display()
    );
    println!("Documents generated successfully in {}", cli.output.display());
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    setup_console_encoding();

    // 日志写到 stderr，stdout 只留给结果
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "specgen=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
