//! 对象锁服务 - 业务能力层
//!
//! 只负责"给一个仓库对象加锁 / 解锁"，不关心上传流程。
//! 所有错误都在这里吞掉：加锁失败等同于锁不可用，解锁失败依赖站点 30 分钟自动过期。

use tracing::{debug, warn};

use crate::error::AppResult;
use crate::infrastructure::FormSubmission;
use crate::services::auth_service::Session;

const ACQUIRE_LINK_TEXT: &str = "acquire the lock";
const RELEASE_LINK_TEXT: &str = "release";
const CONFIRMATION_FORM_CLASS: &str = "confirmation";

/// 一次加锁尝试的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// 确认表单已成功提交
    Acquired,
    /// 没有加锁链接，或在提交确认表单之前出错
    Unavailable,
    /// 确认表单已发出但响应出错，站点可能已经加锁
    Uncertain,
}

impl AcquireOutcome {
    pub fn is_acquired(self) -> bool {
        self == AcquireOutcome::Acquired
    }

    /// 是否可能持有锁（需要释放）
    pub fn may_hold_lock(self) -> bool {
        !matches!(self, AcquireOutcome::Unavailable)
    }
}

/// 对象锁服务
#[derive(Debug, Clone, Default)]
pub struct LockService;

impl LockService {
    pub fn new() -> Self {
        Self
    }

    /// 获取对象的编辑锁
    ///
    /// 管理页上没有 "acquire the lock" 链接时返回 false：
    /// 此时无法区分"已被他人锁定"和"无需加锁"，一律按不可用处理。
    pub async fn acquire_lock(&self, session: &Session, manage_url: &str) -> bool {
        self.try_acquire_lock(session, manage_url).await.is_acquired()
    }

    /// 获取对象的编辑锁，并区分"确认请求出错"的情况
    pub async fn try_acquire_lock(&self, session: &Session, manage_url: &str) -> AcquireOutcome {
        let submission = match confirmation_for(session, manage_url, ACQUIRE_LINK_TEXT).await {
            Ok(Some(submission)) => submission,
            Ok(None) => {
                debug!("管理页上没有加锁链接: {}", manage_url);
                return AcquireOutcome::Unavailable;
            }
            Err(e) => {
                warn!("获取锁失败 {}: {}", manage_url, e);
                return AcquireOutcome::Unavailable;
            }
        };

        match session.client().submit(submission).await {
            Ok(_) => {
                debug!("🔒 已获取锁: {}", manage_url);
                AcquireOutcome::Acquired
            }
            Err(e) => {
                warn!("加锁确认出错，锁状态未知 {}: {}", manage_url, e);
                AcquireOutcome::Uncertain
            }
        }
    }

    /// 释放对象的编辑锁（尽力而为）
    pub async fn release_lock(&self, session: &Session, manage_url: &str) {
        let submission = match confirmation_for(session, manage_url, RELEASE_LINK_TEXT).await {
            Ok(Some(submission)) => submission,
            Ok(None) => {
                debug!("对象未加锁，无需释放: {}", manage_url);
                return;
            }
            Err(e) => {
                debug!("释放锁失败（忽略）{}: {}", manage_url, e);
                return;
            }
        };
        match session.client().submit(submission).await {
            Ok(_) => debug!("🔓 已释放锁: {}", manage_url),
            Err(e) => debug!("释放锁失败（忽略）{}: {}", manage_url, e),
        }
    }
}

/// 打开管理页，跟随指定文本的链接，准备好确认表单的提交
///
/// 链接不存在时返回 Ok(None)
async fn confirmation_for(
    session: &Session,
    manage_url: &str,
    link_text: &str,
) -> AppResult<Option<FormSubmission>> {
    let client = session.client();
    let page = client.get(manage_url).await?;
    let Some(link) = page.find_link(link_text) else {
        return Ok(None);
    };

    let confirm_url = page.resolve(&link.href)?;
    let confirm_page = client.get(&confirm_url).await?;
    let form = confirm_page.form_by_class(CONFIRMATION_FORM_CLASS)?;
    let submission = form.into_submission(&confirm_page.url, None, None)?;
    Ok(Some(submission))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_needs_no_release() {
        assert!(AcquireOutcome::Acquired.is_acquired());
        assert!(!AcquireOutcome::Uncertain.is_acquired());
        assert!(AcquireOutcome::Uncertain.may_hold_lock());
        assert!(AcquireOutcome::Acquired.may_hold_lock());
        assert!(!AcquireOutcome::Unavailable.may_hold_lock());
    }
}
