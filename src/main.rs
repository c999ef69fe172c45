use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fleet::prompt::redrive_decider;
use fleet::render::{render_history, render_report};
use fleet::{Application, BatchOverrides, TargetSelection};
use fleet_core::logging::{LogConfig, LogFormat};
use fleet_core::AppConfig;
use fleet_infrastructure::Inventory;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// CLI应用程序主结构
#[derive(Parser, Debug)]
#[command(name = "fleet")]
#[command(version = "1.0.0")]
#[command(about = "批量远程命令执行工具")]
struct CliApp {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 日志级别，覆盖配置文件
    #[arg(short, long, value_parser = ["trace", "debug", "info", "warn", "error"])]
    log_level: Option<String>,

    /// 日志格式，覆盖配置文件
    #[arg(long, value_parser = ["json", "pretty"])]
    log_format: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 在目标上批量执行命令
    Run {
        /// 要执行的Shell命令
        command: String,
        /// 目标清单文件
        #[arg(short, long, default_value = "config/targets.toml")]
        inventory: PathBuf,
        /// 只在指定的目标上执行 (可重复)
        #[arg(short, long = "target")]
        targets: Vec<String>,
        /// 只在指定位置的目标上执行
        #[arg(long)]
        location: Option<String>,
        /// 最大并发数
        #[arg(long)]
        concurrency: Option<usize>,
        /// 首次执行后的最大重试次数
        #[arg(long)]
        max_retries: Option<u32>,
        /// 命令超时时间（秒）
        #[arg(long)]
        timeout: Option<u64>,
        /// 有失败时自动重新执行一次
        #[arg(long)]
        redrive: bool,
    },
    /// 查看最近的执行历史
    History {
        /// 显示条数
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },
    /// 打印生效的配置
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliApp::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("加载配置失败")?;

    let mut log_config = config.observability.log_config()?.from_env();
    if let Some(level) = &cli.log_level {
        log_config.level = level.parse()?;
    }
    if let Some(format) = &cli.log_format {
        log_config.format = format.parse()?;
    }
    init_logging(&log_config)?;

    match cli.command {
        Commands::Run {
            command,
            inventory,
            targets,
            location,
            concurrency,
            max_retries,
            timeout,
            redrive,
        } => {
            let mut config = config;
            BatchOverrides {
                concurrency,
                max_retries,
                timeout_seconds: timeout,
            }
            .apply(&mut config.batch);

            let inventory = Application::load_inventory(&inventory).await?;
            let app = Application::new(config, inventory)?;
            let selection = TargetSelection {
                ids: targets,
                location,
            };

            let decider = redrive_decider(redrive);
            let report = app.run(&command, &selection, decider.as_ref()).await?;
            println!("{}", render_report(&report));

            if report.summary().has_failures() {
                std::process::exit(1);
            }
        }
        Commands::History { limit } => {
            let app = Application::new(config, Inventory::default())?;
            let entries = app.recent_history(limit).await?;
            println!("{}", render_history(&entries));
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    info!("fleet 已退出");
    Ok(())
}

/// 初始化日志系统
fn init_logging(log_config: &LogConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_config.level.as_filter()));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_config.format {
        LogFormat::Json => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
                .context("初始化JSON日志格式失败")?;
        }
        LogFormat::Pretty => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()
                .context("初始化Pretty日志格式失败")?;
        }
    }

    Ok(())
}
