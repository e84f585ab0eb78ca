//! GitHub 备份同步 CLI
//!
//! 非交互式命令行工具，直接调用同步接口并打印 JSON 响应。

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use github_backup_sync::backup::db::create_sqlite_pool_with_migration;
use github_backup_sync::backup::options::{GITHUB_SYNC_REPO, GITHUB_SYNC_TOKEN};
use github_backup_sync::backup::repo::RepositoryRef;
use github_backup_sync::{GitHubSyncHandler, OptionMap, OptionStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// GitHub 备份同步 CLI
#[derive(Parser, Debug)]
#[command(name = "github-sync-cli")]
#[command(about = "把令牌、渠道、模型配置备份到 GitHub 仓库或从仓库恢复", long_about = None)]
struct Args {
    /// SQLite 数据库 URL
    #[arg(long, default_value = "sqlite://one-api.db?mode=rwc")]
    db: String,

    /// GitHub API 地址
    #[arg(long)]
    api_base_url: Option<String>,

    /// 日志级别（默认: info,github_backup_sync=debug）
    #[arg(long, default_value = "info,github_backup_sync=debug")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 查看同步状态
    Status,
    /// 推送备份到 GitHub
    Push,
    /// 从 GitHub 拉取备份并恢复
    Pull,
    /// 保存 GitHub Token 和仓库地址
    Configure {
        #[arg(long)]
        token: String,
        /// owner/repo 或 https://github.com/owner/repo
        #[arg(long)]
        repo: String,
    },
}

/// 初始化日志（RUST_LOG 优先于命令行参数）
fn init_logger(log_level: &str) {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stderr_layer)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("序列化响应失败")?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(&args.log_level);

    let db = create_sqlite_pool_with_migration(&args.db).await?;
    let options = Arc::new(OptionMap::load(db.clone()).await?);

    let mut handler = GitHubSyncHandler::new(options.clone(), db);
    if let Some(url) = args.api_base_url {
        handler = handler.with_api_base_url(url);
    }

    match args.command {
        Command::Status => print_json(&handler.get_status())?,
        Command::Push => print_json(&handler.trigger_sync().await)?,
        Command::Pull => print_json(&handler.trigger_restore().await)?,
        Command::Configure { token, repo } => {
            let parsed = RepositoryRef::parse(&repo)?;
            options.update(GITHUB_SYNC_TOKEN, &token).await?;
            options.update(GITHUB_SYNC_REPO, &repo).await?;
            info!("[CLI] 已保存同步配置，目标仓库: {}", parsed);
            print_json(&handler.get_status())?;
        }
    }

    Ok(())
}
