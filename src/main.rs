use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use turnover_core::{init_logging, AppConfig};

mod app;
mod shutdown;

use app::Application;
use shutdown::ShutdownManager;

/// 民宿保洁任务协调系统
#[derive(Debug, Parser)]
#[command(name = "turnover", version, about = "民宿保洁任务协调系统")]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, value_name = "FILE", default_value = "config/turnover.toml")]
    config: String,

    /// 日志级别
    #[arg(short = 'l', long, value_name = "LEVEL", default_value = "info",
          value_parser = ["trace", "debug", "info", "warn", "error"])]
    log_level: String,

    /// 日志格式
    #[arg(long, value_name = "FORMAT", default_value = "pretty",
          value_parser = ["json", "pretty"])]
    log_format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, &cli.log_format)?;

    info!("启动保洁任务协调系统，配置文件: {}", cli.config);

    // 配置文件缺省时回退到内置默认值（嵌入式SQLite）
    let config = if std::path::Path::new(&cli.config).exists() {
        AppConfig::load(Some(&cli.config))
            .with_context(|| format!("加载配置文件失败: {}", cli.config))?
    } else {
        warn!("配置文件 {} 不存在，使用默认配置", cli.config);
        AppConfig::load(None).context("加载默认配置失败")?
    };

    let shutdown = ShutdownManager::new();
    let app = Application::new(config).await?;

    let runner = tokio::spawn({
        let signal = shutdown.subscribe();
        async move { app.run(signal).await }
    });

    wait_for_shutdown_signal().await;
    info!("收到关闭信号，开始优雅关闭...");
    shutdown.shutdown();

    match tokio::time::timeout(Duration::from_secs(30), runner).await {
        Ok(Ok(Ok(()))) => info!("应用已优雅关闭"),
        Ok(Ok(Err(e))) => error!("应用运行失败: {e}"),
        Ok(Err(e)) => error!("应用任务异常退出: {e}"),
        Err(_) => warn!("应用关闭超时，强制退出"),
    }

    info!("保洁任务协调系统已退出");
    Ok(())
}

/// 等待 Ctrl+C 或 SIGTERM
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate()).expect("安装SIGTERM信号处理器失败");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("收到Ctrl+C信号"),
            _ = sigterm.recv() => info!("收到SIGTERM信号"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("收到Ctrl+C信号");
    }
}
