//! 批量上传处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一个批次从扫描到统计的全过程。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：创建 HTTP 客户端和登录服务
//! 2. **批量加载**：扫描目录，得到所有待上传的文件（`Vec<WorkItem>`）
//! 3. **批次前检查**：没有文件、凭据为空、登录失败时不开始上传
//! 4. **并发上传**：委托 [`Dispatcher`] 和 [`UploadFlow`]
//! 5. **全局统计**：输出 `成功数/总数`，写入失败记录和 JSON 报告

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::infrastructure::{HttpWebClient, WebClient};
use crate::models::{discover, Discovery};
use crate::orchestrator::dispatcher::Dispatcher;
use crate::orchestrator::progress::{BatchReport, LogReporter};
use crate::services::{Authenticator, Credentials, FailureWriter};
use crate::utils::logging;
use crate::workflow::UploadFlow;

/// 应用主结构
pub struct App {
    config: Config,
    authenticator: Authenticator,
    failure_writer: FailureWriter,
    cancel: CancellationToken,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        logging::log_startup(&config);

        let client = HttpWebClient::new(config.request_timeout())?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// 使用指定的 Web 客户端创建应用
    pub fn with_client(config: Config, client: Arc<dyn WebClient>) -> Self {
        let authenticator = Authenticator::new(client, config.base_url.clone());
        let failure_writer = FailureWriter::with_path(config.failure_log_file.clone());
        Self {
            config,
            authenticator,
            failure_writer,
            cancel: CancellationToken::new(),
        }
    }

    /// 取消令牌：取消后尚未开始的文件不再上传
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 运行一个批次
    ///
    /// 没有找到文件时返回 `Ok(None)`；凭据为空或登录失败时返回错误，不会开始上传。
    pub async fn run(&self, credentials: &Credentials) -> Result<Option<BatchReport>> {
        // 扫描所有待上传的文件
        let discovery = self.load_items().await?;

        if discovery.is_empty() {
            warn!("⚠️ 没有找到可上传的 MODS XML 文件，程序结束");
            return Ok(None);
        }
        logging::log_items_loaded(discovery.items.len(), discovery.skipped.len());

        // 登录（只登录一次）
        let session = self
            .authenticator
            .authenticate(&credentials.username, &credentials.password)
            .await
            .context("请确认用户名和密码是否正确")?;

        // 新批次：清空上一次的失败记录
        self.failure_writer.reset().await?;

        let flow = Arc::new(UploadFlow::new(session));
        let mut reporter = LogReporter;
        let report = Dispatcher::new(self.config.max_concurrent_uploads)
            .run(flow, discovery.items, self.cancel.clone(), &mut reporter)
            .await;

        // 汇总结束后统一写入失败记录
        let failed = self.failure_writer.write_all(report.failures()).await?;

        if let Some(path) = &self.config.report_file {
            write_report(&report, path).await?;
        }

        logging::print_final_stats(&report, &self.config.output_log_file);
        if failed > 0 {
            info!("失败的文件已记录至: {}", self.failure_writer.path());
        }

        Ok(Some(report))
    }

    /// 扫描目录（阻塞 IO，放到专用线程）
    async fn load_items(&self) -> Result<Discovery> {
        info!("\n📁 正在扫描待上传的文件...");
        let root = PathBuf::from(&self.config.xml_folder);
        let discovery = tokio::task::spawn_blocking(move || discover(&root))
            .await
            .context("扫描任务异常退出")??;
        Ok(discovery)
    }
}

async fn write_report(report: &BatchReport, path: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(&report.to_json())?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("无法写入报告: {}", path))?;
    info!("📝 批次报告已保存至: {}", path);
    Ok(())
}
