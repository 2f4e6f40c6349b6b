//! 失败记录服务 - 业务能力层
//!
//! 只负责"把上传失败的文件写入记录文件"能力，不关心流程

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::WorkItem;

/// 失败记录服务
///
/// 每行一条：时间 | 对象ID | 原因 | 文件路径，方便之后只重跑失败的文件。
#[derive(Debug, Clone)]
pub struct FailureWriter {
    failure_file_path: String,
}

impl FailureWriter {
    /// 使用指定文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            failure_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.failure_file_path
    }

    /// 清空记录（新批次开始时调用）
    pub async fn reset(&self) -> AppResult<()> {
        fs::write(&self.failure_file_path, "")
            .await
            .map_err(|e| AppError::file_write_failed(&self.failure_file_path, e))
    }

    /// 一次性追加多条失败记录，返回写入的条数
    pub async fn write_all<'a, I>(&self, failures: I) -> AppResult<usize>
    where
        I: IntoIterator<Item = (&'a WorkItem, String)>,
    {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let mut count = 0;
        let mut content = String::new();
        for (item, reason) in failures {
            debug!("写入失败记录: {} | {}", item.object_id(), reason);
            content.push_str(&format!(
                "{} | {} | {} | {}\n",
                now,
                item.object_id(),
                reason,
                item.source_path.display()
            ));
            count += 1;
        }
        if count == 0 {
            return Ok(0);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.failure_file_path)
            .await
            .map_err(|e| AppError::file_write_failed(&self.failure_file_path, e))?;
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| AppError::file_write_failed(&self.failure_file_path, e))?;
        file.flush()
            .await
            .map_err(|e| AppError::file_write_failed(&self.failure_file_path, e))?;

        Ok(count)
    }
}
