//! 마무리 每日市场简报服务
//!
//! 每天早上汇总美股主要指数收盘行情，生成面向韩国投资者的简报并推送到 Telegram
//! 数据来源：Yahoo Finance（或本地模拟数据）

mod config;     // 配置管理
mod handlers;   // HTTP 请求处理器
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::briefing::BriefingPipeline;
use crate::services::notifier;
use crate::services::scheduler::Scheduler;

#[derive(Parser)]
#[command(name = "market-briefing", about = "마무리 경제 브리핑: 每日美股收盘简报")]
struct Cli {
    /// 配置文件路径（JSON）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 使用模拟行情数据
    #[arg(long, global = true, default_value_t = false)]
    synthetic: bool,

    /// 导出行情快照 JSON
    #[arg(long, global = true, default_value_t = false)]
    dump: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq, Debug)]
enum Command {
    /// 每天在配置的时间执行（默认）
    Schedule,
    /// 执行一次后退出
    Once,
    /// 立即执行一次，然后按计划继续
    Test,
    /// 检查推送通道连接
    Check,
}

/// 应用程序入口
#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if cli.synthetic {
        config.market.synthetic = true;
    }
    if cli.dump {
        config.output.dump_snapshot = true;
    }

    // 初始化日志系统，RUST_LOG 优先于配置
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));

    match &config.source {
        Some(path) => log::info!("已加载配置文件: {}", path.display()),
        None => log::info!("未找到配置文件，使用默认配置"),
    }

    let command = cli.command.unwrap_or(Command::Schedule);
    match command {
        Command::Check => check_delivery(&config).await,
        Command::Once => run_once(&config).await,
        Command::Schedule | Command::Test => serve(&config, command == Command::Test).await,
    }
}

/// 推送通道连接检查
async fn check_delivery(config: &AppConfig) -> Result<()> {
    let channel = notifier::from_config(&config.telegram)?;
    let identity = channel
        .check_connection()
        .await
        .with_context(|| format!("{} 连接检查失败", channel.name()))?;
    log::info!(
        "✅ 连接正常: {} (@{})",
        identity.first_name,
        identity.username
    );
    Ok(())
}

/// 执行一次，出错或推送失败时以非零状态退出
async fn run_once(config: &AppConfig) -> Result<()> {
    let pipeline = BriefingPipeline::from_config(config)?;
    let outcome = pipeline.run_cycle().await?;
    if !outcome.delivery.success {
        bail!(
            "简报推送失败: {}",
            outcome.delivery.error.as_deref().unwrap_or("Unknown")
        );
    }
    Ok(())
}

/// 启动健康检查服务与调度器，Ctrl-C 退出
async fn serve(config: &AppConfig, run_now: bool) -> Result<()> {
    let pipeline = Arc::new(BriefingPipeline::from_config(config)?);
    let scheduler = Scheduler::from_config(pipeline, &config.schedule)?;

    let addr = config.bind_addr();
    log::info!("启动健康检查服务: {}", addr);

    // 创建并启动 HTTP 服务器
    let server = HttpServer::new(|| {
        App::new()
            .wrap(Logger::default())  // 添加请求日志中间件
            .configure(handlers::config)  // 配置路由
            .default_service(web::to(handlers::not_found))
    })
    .workers(1)
    .disable_signals()
    .bind(&addr)
    .with_context(|| format!("绑定 {} 失败", addr))?
    .run();
    let server_handle = server.handle();
    actix_web::rt::spawn(server);

    if run_now {
        log::info!("🧪 立即执行一次简报");
        scheduler.trigger();
    }

    log::info!(
        "⏰ 每天 {} ({}) 自动执行，按 Ctrl+C 停止",
        config.schedule.time,
        config.schedule.timezone
    );
    scheduler
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("监听退出信号失败: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    server_handle.stop(true).await;
    Ok(())
}
