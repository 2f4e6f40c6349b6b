use crate::error::{AppResult, DiscoveryWarning, FileError};
use crate::models::work_item::WorkItem;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 一次扫描的结果
#[derive(Debug, Default)]
pub struct Discovery {
    /// 可上传的条目
    pub items: Vec<WorkItem>,
    /// 被跳过的文件及原因
    pub skipped: Vec<(PathBuf, DiscoveryWarning)>,
}

impl Discovery {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// 递归扫描目录下所有 XML 文件并转换为 WorkItem
///
/// 路径先去重；文件名无法解析的文件被记录并跳过，不会中断扫描。
pub fn discover(root: &Path) -> AppResult<Discovery> {
    if !root.is_dir() {
        return Err(FileError::DirectoryNotFound {
            path: root.display().to_string(),
        }
        .into());
    }

    let mut paths = BTreeSet::new();
    for entry in WalkDir::new(root).follow_links(true) {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && is_xml(entry.path()) {
                    paths.insert(entry.into_path());
                }
            }
            Err(e) => {
                tracing::warn!("无法访问目录项: {}", e);
            }
        }
    }

    let mut discovery = Discovery::default();
    for path in paths {
        match WorkItem::from_path(path.clone()) {
            Ok(item) => {
                tracing::debug!("发现条目: {}", item);
                discovery.items.push(item);
            }
            Err(warning) => {
                tracing::warn!("⚠️ 跳过文件 {}: {}", path.display(), warning);
                discovery.skipped.push((path, warning));
            }
        }
    }

    tracing::info!(
        "扫描完成: {} 个有效文件，{} 个被跳过",
        discovery.items.len(),
        discovery.skipped.len()
    );

    Ok(discovery)
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("xml"))
        .unwrap_or(false)
}
