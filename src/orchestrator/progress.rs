//! 进度与统计
//!
//! 工作任务通过通道发送 [`ProgressEvent`]，由唯一的汇总者更新 [`ProgressState`]。

use std::time::Duration;

use serde_json::{json, Value as JsonValue};
use tracing::{info, warn};

use crate::models::WorkItem;
use crate::workflow::{ItemOutcome, UploadCtx};

/// 单个文件的最终结果，每个文件恰好产生一次
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub index: usize,
    pub item: WorkItem,
    pub outcome: ItemOutcome,
    pub elapsed: Duration,
}

impl UploadResult {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_success()
    }
}

/// 工作任务发给汇总者的消息
#[derive(Debug)]
pub enum ProgressEvent {
    /// 开始处理（已拿到并发许可）
    Started(UploadCtx),
    /// 处理结束
    Finished(UploadResult),
}

/// 批次进度，只由汇总者修改
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressState {
    pub completed: usize,
    pub succeeded: usize,
    pub total: usize,
}

impl ProgressState {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record(&mut self, result: &UploadResult) {
        self.completed += 1;
        if result.succeeded() {
            self.succeeded += 1;
        }
    }

    /// 完成百分比
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.completed as f64 * 100.0 / self.total as f64
    }

    pub fn is_finished(&self) -> bool {
        self.completed >= self.total
    }
}

/// 进度消费者（控制台、界面、测试记录器）
///
/// 只在汇总者中被调用，不需要自己加锁。
pub trait ProgressReporter: Send {
    fn on_started(&mut self, _ctx: &UploadCtx, _state: &ProgressState) {}

    fn on_finished(&mut self, _result: &UploadResult, _state: &ProgressState) {}
}

/// 什么也不做的消费者
#[derive(Debug, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {}

/// 控制台计数器
///
/// 失败记录文件由调用方在批次结束后统一写入（见 [`BatchReport::failures`]），
/// 汇总循环中不做文件 IO。
#[derive(Debug, Default)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn on_started(&mut self, ctx: &UploadCtx, _state: &ProgressState) {
        info!("{} ⏳ 开始处理", ctx);
    }

    fn on_finished(&mut self, result: &UploadResult, state: &ProgressState) {
        info!(
            "📈 进度 {}/{} ({:.0}%)，成功 {}",
            state.completed,
            state.total,
            state.percent(),
            state.succeeded
        );

        if let Some(reason) = result.outcome.reason() {
            warn!("[文件 {}/{}] {}: {}", result.index + 1, state.total, result.item, reason);
        }
    }
}

/// 整个批次的结果
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub state: ProgressState,
    /// 按索引排序
    pub results: Vec<UploadResult>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.state.total
    }

    pub fn completed(&self) -> usize {
        self.state.completed
    }

    pub fn succeeded(&self) -> usize {
        self.state.succeeded
    }

    pub fn cancelled(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome == ItemOutcome::Cancelled)
            .count()
    }

    /// 已执行但未成功的数量（不含取消）
    pub fn failed(&self) -> usize {
        self.completed() - self.succeeded() - self.cancelled()
    }

    /// 所有未成功的条目及原因（按索引排序）
    pub fn failures(&self) -> impl Iterator<Item = (&WorkItem, String)> + '_ {
        self.results
            .iter()
            .filter_map(|r| r.outcome.reason().map(|reason| (&r.item, reason)))
    }

    /// `成功数/总数`
    pub fn tally(&self) -> String {
        format!("{}/{}", self.succeeded(), self.total())
    }

    pub fn to_json(&self) -> JsonValue {
        let items: Vec<JsonValue> = self
            .results
            .iter()
            .map(|r| {
                json!({
                    "index": r.index,
                    "object_id": r.item.object_id(),
                    "item": r.item,
                    "outcome": r.outcome,
                    "elapsed_ms": r.elapsed.as_millis() as u64,
                })
            })
            .collect();

        json!({
            "finished_at": chrono::Local::now().to_rfc3339(),
            "total": self.total(),
            "completed": self.completed(),
            "succeeded": self.succeeded(),
            "failed": self.failed(),
            "cancelled": self.cancelled(),
            "elapsed_ms": self.elapsed.as_millis() as u64,
            "items": items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(index: usize, outcome: ItemOutcome) -> UploadResult {
        UploadResult {
            index,
            item: WorkItem::from_path(format!("/tmp/repoA_{:03}.xml", index)).unwrap(),
            outcome,
            elapsed: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_state_counts_success_and_completion() {
        let mut state = ProgressState::new(3);
        state.record(&result(0, ItemOutcome::Uploaded));
        state.record(&result(1, ItemOutcome::LockUnavailable));
        assert_eq!(state.completed, 2);
        assert_eq!(state.succeeded, 1);
        assert!(!state.is_finished());
        state.record(&result(2, ItemOutcome::Cancelled));
        assert!(state.is_finished());
        assert_eq!(state.percent(), 100.0);
    }

    #[test]
    fn test_report_tally_and_json() {
        let results = vec![
            result(0, ItemOutcome::Uploaded),
            result(1, ItemOutcome::UploadFailed("500".into())),
            result(2, ItemOutcome::Cancelled),
        ];
        let mut state = ProgressState::new(3);
        results.iter().for_each(|r| state.record(r));
        let report = BatchReport {
            state,
            results,
            elapsed: Duration::from_secs(1),
        };
        assert_eq!(report.tally(), "1/3");
        assert_eq!(report.failed(), 1);
        assert_eq!(report.cancelled(), 1);
        let failures: Vec<String> = report
            .failures()
            .map(|(item, reason)| format!("{} {}", item.object_id(), reason))
            .collect();
        assert_eq!(failures, vec!["repoA:001 上传失败: 500", "repoA:002 已取消"]);

        let json = report.to_json();
        assert_eq!(json["succeeded"], 1);
        assert_eq!(json["items"][1]["object_id"], "repoA:001");
        assert_eq!(json["items"][1]["outcome"]["status"], "upload_failed");
    }
}
