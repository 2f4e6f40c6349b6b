//! 中断信号处理
//!
//! 第一次 Ctrl-C 取消批次（已开始的文件会先释放锁再结束），
//! 第二次 Ctrl-C 直接退出进程，不再等待进行中的请求。

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// 强制退出时的进程退出码（128 + SIGINT）
pub const FORCE_EXIT_CODE: i32 = 130;

/// 收到一次中断信号后应采取的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// 取消批次，等待进行中的文件收尾
    Cancel,
    /// 已经取消过，立即退出
    ForceExit,
}

/// 记录一次中断信号
pub fn on_interrupt(cancel: &CancellationToken) -> Interrupt {
    if cancel.is_cancelled() {
        return Interrupt::ForceExit;
    }
    cancel.cancel();
    Interrupt::Cancel
}

/// 在后台监听 Ctrl-C
pub fn watch_ctrl_c(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            match on_interrupt(&cancel) {
                Interrupt::Cancel => {
                    warn!("⏹️ 收到中断信号，正在停止...（再按一次 Ctrl-C 强制退出）");
                }
                Interrupt::ForceExit => {
                    error!("⛔ 再次收到中断信号，立即退出（未释放的锁将由站点自动过期）");
                    std::process::exit(FORCE_EXIT_CODE);
                }
            }
        }
    })
}
