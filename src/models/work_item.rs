use std::fmt::Display;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::DiscoveryWarning;

/// 一个待上传的 MODS XML 文件
///
/// 命名空间和编号由文件名 `<namespace>_<number>.xml` 推导，构造后不可变。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct WorkItem {
    pub namespace: String,
    pub item_number: String,
    pub source_path: PathBuf,
}

impl WorkItem {
    /// 从文件路径构造
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, DiscoveryWarning> {
        let source_path = path.into();
        let file_name = source_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| DiscoveryWarning::NonUtf8Name {
                path: source_path.display().to_string(),
            })?;
        let (namespace, item_number) = parse_file_name(file_name)?;
        Ok(Self {
            namespace,
            item_number,
            source_path,
        })
    }

    /// 仓库对象 ID，例如 `repoA:001`
    pub fn object_id(&self) -> String {
        format!("{}:{}", self.namespace, self.item_number)
    }

    /// 上传时使用的文件名
    pub fn file_name(&self) -> String {
        file_name_of(&self.source_path)
    }
}

impl Display for WorkItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.object_id(), self.source_path.display())
    }
}

/// 解析文件名，返回 (命名空间, 编号)
///
/// 按 `_` 切分取前两段：第一段是命名空间，第二段再按 `.` 切分取第一段作为编号。
/// `repoA_001.xml` → (`repoA`, `001`)，`a_b_c.xml` → (`a`, `b`)。
pub fn parse_file_name(file_name: &str) -> Result<(String, String), DiscoveryWarning> {
    let mut parts = file_name.split('_');
    let namespace = parts.next().unwrap_or_default();
    let remainder = parts
        .next()
        .ok_or_else(|| DiscoveryWarning::MissingSeparator {
            file_name: file_name.to_string(),
        })?;
    let item_number = remainder.split('.').next().unwrap_or_default();

    if namespace.is_empty() || item_number.is_empty() {
        return Err(DiscoveryWarning::EmptyIdentifier {
            file_name: file_name.to_string(),
        });
    }

    Ok((namespace.to_string(), item_number.to_string()))
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}
