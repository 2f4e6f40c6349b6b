//! 并发调度器 - 编排层
//!
//! ## 职责
//!
//! 把一个批次的所有文件分发给固定宽度的工作池，并汇总结果。
//!
//! ## 设计特点
//!
//! - **固定并发**：每个文件一个 `tokio::spawn` 任务，用 Semaphore 限制同时运行的数量
//! - **单一汇总者**：任务通过 mpsc 通道报告进度，只有调度循环修改计数器
//! - **故障隔离**：单个任务崩溃只影响它自己的结果
//! - **协作式取消**：取消后尚未开始的文件直接记为已取消

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::models::WorkItem;
use crate::orchestrator::progress::{
    BatchReport, ProgressEvent, ProgressReporter, ProgressState, UploadResult,
};
use crate::workflow::{ItemOutcome, UploadCtx};

/// 默认并发数
pub const DEFAULT_CONCURRENCY: usize = 10;

/// 单个文件的处理能力
///
/// 调度器只认识这个 trait，真实流程是 [`crate::workflow::UploadFlow`]。
#[async_trait]
pub trait ItemProcessor: Send + Sync + 'static {
    async fn process(&self, ctx: &UploadCtx, cancel: &CancellationToken) -> ItemOutcome;
}

/// 并发调度器
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    concurrency: usize,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl Dispatcher {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    /// 运行一个批次，等待所有文件都产生结果后返回
    pub async fn run<P: ItemProcessor>(
        &self,
        processor: Arc<P>,
        items: Vec<WorkItem>,
        cancel: CancellationToken,
        reporter: &mut dyn ProgressReporter,
    ) -> BatchReport {
        let started_at = Instant::now();
        let total = items.len();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();

        info!("📦 开始调度 {} 个文件，并发数 {}", total, self.concurrency);

        // 为每个文件创建任务
        let mut handles = Vec::with_capacity(total);
        for (index, item) in items.into_iter().enumerate() {
            let ctx = UploadCtx::new(index, total, item.clone());
            let handle = tokio::spawn(run_worker(
                ctx,
                processor.clone(),
                semaphore.clone(),
                cancel.clone(),
                tx.clone(),
            ));
            handles.push((index, item, handle));
        }
        drop(tx);

        // 汇总：唯一修改计数器的地方
        let mut state = ProgressState::new(total);
        let mut results: Vec<Option<UploadResult>> = vec![None; total];
        while let Some(event) = rx.recv().await {
            match event {
                ProgressEvent::Started(ctx) => reporter.on_started(&ctx, &state),
                ProgressEvent::Finished(result) => {
                    state.record(&result);
                    reporter.on_finished(&result, &state);
                    let index = result.index;
                    results[index] = Some(result);
                }
            }
        }

        // 等待所有任务退出；没有产生结果的任务补记为失败
        for (index, item, handle) in handles {
            let join_error = match handle.await {
                Ok(()) => None,
                Err(e) => Some(e.to_string()),
            };
            if results[index].is_some() {
                continue;
            }
            let reason = join_error.unwrap_or_else(|| "任务未返回结果".to_string());
            error!("[文件 {}/{}] 任务执行失败: {}", index + 1, total, reason);
            let result = UploadResult {
                index,
                item,
                outcome: ItemOutcome::UploadFailed(reason),
                elapsed: started_at.elapsed(),
            };
            state.record(&result);
            reporter.on_finished(&result, &state);
            results[index] = Some(result);
        }

        debug!("批次结束: 完成 {}/{}", state.completed, state.total);

        BatchReport {
            state,
            results: results.into_iter().flatten().collect(),
            elapsed: started_at.elapsed(),
        }
    }
}

/// 单个工作任务：等待许可 → 处理 → 报告
async fn run_worker<P: ItemProcessor>(
    ctx: UploadCtx,
    processor: Arc<P>,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<ProgressEvent>,
) {
    let started_at = Instant::now();

    let permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        permit = semaphore.acquire_owned() => permit.ok(),
    };

    let outcome = match permit {
        Some(_permit) => {
            let _ = tx.send(ProgressEvent::Started(ctx.clone()));
            match AssertUnwindSafe(processor.process(&ctx, &cancel))
                .catch_unwind()
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => {
                    error!("{} ❌ 任务崩溃", ctx);
                    ItemOutcome::UploadFailed("任务崩溃".to_string())
                }
            }
        }
        None => ItemOutcome::Cancelled,
    };

    let _ = tx.send(ProgressEvent::Finished(UploadResult {
        index: ctx.index,
        item: ctx.item,
        outcome,
        elapsed: started_at.elapsed(),
    }));
}
