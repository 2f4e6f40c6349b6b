//! MODS 替换服务 - 业务能力层
//!
//! 只负责"把一个本地文件提交到对象的 MODS 替换表单"

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::infrastructure::FileUpload;
use crate::models::WorkItem;
use crate::services::auth_service::Session;

const REPLACE_FORM_ID: &str = "islandora-datastream-version-replace-form";
const FILE_FIELD: &str = "files[file]";
const SUBMIT_FIELD: &str = "op";

/// 对象地址，冒号编码为 `%3A`
pub fn object_url(session: &Session, item: &WorkItem) -> String {
    session.url(&format!(
        "/islandora/object/{}%3A{}",
        item.namespace, item.item_number
    ))
}

/// 对象管理页（加锁 / 解锁链接所在页面）
pub fn manage_url(session: &Session, item: &WorkItem) -> String {
    format!("{}/manage", object_url(session, item))
}

/// MODS 数据流替换页
pub fn replace_url(session: &Session, item: &WorkItem) -> String {
    format!("{}/datastream/MODS/replace", object_url(session, item))
}

/// MODS 替换服务
#[derive(Debug, Clone, Default)]
pub struct UploadService;

impl UploadService {
    pub fn new() -> Self {
        Self
    }

    /// 提交替换表单，调用前必须已持有对象锁
    pub async fn replace_datastream(&self, session: &Session, item: &WorkItem) -> AppResult<()> {
        let path = item.source_path.display().to_string();
        let contents = tokio::fs::read(&item.source_path)
            .await
            .map_err(|e| AppError::file_read_failed(&path, e))?;

        let client = session.client();
        let page = client.get(&replace_url(session, item)).await?;
        let form = page.form_by_id(REPLACE_FORM_ID)?;

        let upload = FileUpload::xml(FILE_FIELD, item.file_name(), contents);
        let submission = form.into_submission(&page.url, Some(SUBMIT_FIELD), Some(upload))?;
        client.submit(submission).await?;

        debug!("已提交 {} -> {}", path, item.object_id());
        Ok(())
    }
}
