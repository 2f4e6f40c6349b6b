//! 文件上传流程 - 流程层
//!
//! 核心职责：定义"一个文件"的完整处理流程
//!
//! 流程顺序：
//! 1. 获取对象锁（失败则直接结束，不上传；确认请求出错时先尝试释放）
//! 2. 提交 MODS 替换表单
//! 3. 释放对象锁（无论上传成功与否）
//!
//! 取消信号在加锁前和上传前检查；已持有锁时先释放再结束。

use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::orchestrator::ItemProcessor;
use crate::services::{manage_url, LockService, Session, UploadService};
use crate::workflow::upload_ctx::UploadCtx;

/// 单个文件的处理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// 上传成功
    Uploaded,
    /// 无法获取锁，未上传
    LockUnavailable,
    /// 上传过程中出错
    UploadFailed(String),
    /// 批次已取消，未上传
    Cancelled,
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Uploaded)
    }

    /// 失败原因（成功时为 None）
    pub fn reason(&self) -> Option<String> {
        match self {
            ItemOutcome::Uploaded => None,
            ItemOutcome::LockUnavailable => Some("无法获取锁".to_string()),
            ItemOutcome::UploadFailed(reason) => Some(format!("上传失败: {}", reason)),
            ItemOutcome::Cancelled => Some("已取消".to_string()),
        }
    }
}

/// 文件上传流程
///
/// - 编排 加锁 → 上传 → 解锁
/// - 共享只读的会话
/// - 只依赖业务能力（services）
pub struct UploadFlow {
    session: Session,
    lock_service: LockService,
    upload_service: UploadService,
}

impl UploadFlow {
    /// 创建新的上传流程
    pub fn new(session: Session) -> Self {
        Self {
            session,
            lock_service: LockService::new(),
            upload_service: UploadService::new(),
        }
    }

    pub async fn run(&self, ctx: &UploadCtx, cancel: &CancellationToken) -> ItemOutcome {
        if cancel.is_cancelled() {
            info!("{} ⏹️ 批次已取消，跳过", ctx);
            return ItemOutcome::Cancelled;
        }

        let manage_url = manage_url(&self.session, &ctx.item);

        // ========== 步骤 1: 加锁 ==========
        let acquired = self
            .lock_service
            .try_acquire_lock(&self.session, &manage_url)
            .await;
        if !acquired.is_acquired() {
            warn!(
                "{} ❌ 无法获取锁，未上传: {}",
                ctx,
                ctx.item.source_path.display()
            );
            // 确认请求出错时站点可能已经加锁
            if acquired.may_hold_lock() {
                self.lock_service
                    .release_lock(&self.session, &manage_url)
                    .await;
            }
            return ItemOutcome::LockUnavailable;
        }

        // ========== 步骤 2: 上传 ==========
        let outcome = if cancel.is_cancelled() {
            info!("{} ⏹️ 批次已取消，释放锁后结束", ctx);
            ItemOutcome::Cancelled
        } else {
            let upload = self
                .upload_service
                .replace_datastream(&self.session, &ctx.item);
            match AssertUnwindSafe(upload).catch_unwind().await {
                Ok(Ok(())) => {
                    info!("{} ✓ 上传成功: {}", ctx, ctx.item.source_path.display());
                    ItemOutcome::Uploaded
                }
                Ok(Err(e)) => {
                    error!(
                        "{} ❌ 上传失败: {}: {}",
                        ctx,
                        ctx.item.source_path.display(),
                        e
                    );
                    ItemOutcome::UploadFailed(e.to_string())
                }
                Err(_) => {
                    error!("{} ❌ 上传过程崩溃", ctx);
                    ItemOutcome::UploadFailed("上传过程崩溃".to_string())
                }
            }
        };

        // ========== 步骤 3: 解锁（无条件） ==========
        self.lock_service
            .release_lock(&self.session, &manage_url)
            .await;

        outcome
    }
}

#[async_trait]
impl ItemProcessor for UploadFlow {
    async fn process(&self, ctx: &UploadCtx, cancel: &CancellationToken) -> ItemOutcome {
        self.run(ctx, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_uploaded_is_success() {
        assert!(ItemOutcome::Uploaded.is_success());
        assert!(!ItemOutcome::LockUnavailable.is_success());
        assert!(!ItemOutcome::UploadFailed("boom".into()).is_success());
        assert!(!ItemOutcome::Cancelled.is_success());
        assert_eq!(ItemOutcome::Uploaded.reason(), None);
        assert_eq!(
            ItemOutcome::UploadFailed("boom".into()).reason().as_deref(),
            Some("上传失败: boom")
        );
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(ItemOutcome::UploadFailed("boom".into())).unwrap();
        assert_eq!(json["status"], "upload_failed");
        assert_eq!(json["reason"], "boom");
        let json = serde_json::to_value(ItemOutcome::Uploaded).unwrap();
        assert_eq!(json["status"], "uploaded");
    }
}
