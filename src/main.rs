use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::error;

use label_generator::utils::logging;
use label_generator::{logger, setup, App, Config};

#[derive(Parser)]
#[command(name = "label_generator")]
#[command(about = "从订单列表批量生成带条码的 PDF 标签", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, env = "LABEL_CONFIG", default_value = "config.json", global = true)]
    config: PathBuf,

    /// 日志文件路径（不指定时只输出到控制台）
    #[arg(long, env = "LABEL_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// 生成标签（默认）
    Run,

    /// 生成初始 config.json、示例模板和示例订单
    Init {
        /// 覆盖已存在的 config.json
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    if let Some(path) = &cli.log_file {
        logging::init_log_file(path)?;
    }
    let _guard = logger::init(cli.log_file.as_deref())?;

    let outcome = match cli.command.unwrap_or(Commands::Run) {
        Commands::Init { force } => setup::init_workspace(&cli.config, force).await.map(|_| ()),
        Commands::Run => run(&cli.config).await,
    };

    if let Err(e) = &outcome {
        error!("❌ 运行失败: {:#}", e);
    }
    outcome
}

async fn run(config_path: &std::path::Path) -> Result<()> {
    // 加载配置
    let config = Config::load(config_path)
        .await
        .with_context(|| format!("无法加载配置文件: {}", config_path.display()))?;

    // 初始化并运行应用；单个订单失败不影响退出码
    App::initialize(config).await?.run().await?;

    Ok(())
}
