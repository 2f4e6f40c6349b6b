//! 上传上下文
//!
//! 封装"我正在处理本批次的第几个文件"这一信息

use std::fmt::Display;

use crate::models::WorkItem;

/// 单个文件的处理上下文
#[derive(Debug, Clone)]
pub struct UploadCtx {
    /// 在批次中的索引（从 0 开始）
    pub index: usize,

    /// 批次文件总数（仅用于日志显示）
    pub total: usize,

    pub item: WorkItem,
}

impl UploadCtx {
    /// 创建新的上传上下文
    pub fn new(index: usize, total: usize, item: WorkItem) -> Self {
        Self { index, total, item }
    }
}

impl Display for UploadCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[文件 {}/{} 对象 {}]",
            self.index + 1,
            self.total,
            self.item.object_id()
        )
    }
}
