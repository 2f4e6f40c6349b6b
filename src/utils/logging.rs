use anyhow::{Context, Result};
/// 日志工具模块
///
/// 初始化 tracing，并提供批次开始/结束时的格式化输出
use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::orchestrator::BatchReport;

/// 初始化日志
///
/// `RUST_LOG` 优先；否则 verbose 时为 debug，默认 info。
/// 给出 `log_file_path` 时日志同时追加写入该文件（不带颜色）。
pub fn init(verbose: bool, log_file_path: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    let file_layer = match log_file_path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("无法打开日志文件: {}", path))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()
        .context("日志系统初始化失败")?;

    Ok(())
}

/// 初始化日志文件（写入标题，覆盖旧内容）
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\nMODS XML 上传日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - MODS XML 批量上传");
    info!("🌐 站点: {}", config.base_url);
    info!("📁 目录: {}", config.xml_folder);
    info!("📊 最大并发数: {}", config.max_concurrent_uploads);
    info!("{}", "=".repeat(60));
}

/// 记录文件加载信息
///
/// # 参数
/// - `total`: 文件总数
/// - `skipped`: 文件名无法解析而被跳过的数量
pub fn log_items_loaded(total: usize, skipped: usize) {
    info!("✓ 找到 {} 个待上传的文件", total);
    if skipped > 0 {
        info!("⚠️ {} 个文件因文件名格式不正确被跳过", skipped);
    }
}

/// 打印最终统计信息
pub fn print_final_stats(report: &BatchReport, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功上传: {}", report.tally());
    info!("❌ 失败: {}", report.failed());
    if report.cancelled() > 0 {
        info!("⏹️ 已取消: {}", report.cancelled());
    }
    info!("⏱️ 用时: {:.1} 秒", report.elapsed.as_secs_f64());
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}
