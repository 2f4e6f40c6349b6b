//! Web 客户端 - 基础设施层
//!
//! 持有唯一的 HTTP 会话（cookie），只暴露"打开页面"和"提交表单"两种能力。
//! 不认识锁、数据流或文件名。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::error::{AppError, AppResult, HttpError};
use crate::infrastructure::page::Page;

/// 表单提交方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormMethod {
    #[default]
    Get,
    Post,
}

/// 随表单上传的文件
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// 表单中的文件字段名
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub contents: Vec<u8>,
}

impl FileUpload {
    /// 创建 XML 文件上传
    pub fn xml(field: impl Into<String>, file_name: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            mime: "text/xml".to_string(),
            contents,
        }
    }
}

/// 一次表单提交
#[derive(Debug, Clone)]
pub struct FormSubmission {
    /// 绝对地址
    pub action: String,
    pub method: FormMethod,
    pub fields: Vec<(String, String)>,
    pub file: Option<FileUpload>,
}

/// 浏览能力
///
/// 所有服务都只依赖这个 trait，测试中用内存实现替换。
#[async_trait]
pub trait WebClient: Send + Sync {
    /// 打开页面
    async fn get(&self, url: &str) -> AppResult<Page>;

    /// 提交表单
    async fn submit(&self, submission: FormSubmission) -> AppResult<Page>;
}

/// 基于 reqwest 的实现（带 cookie 存储）
///
/// `reqwest::Client` 内部使用 Arc，clone 之后共享同一个 cookie 存储。
#[derive(Clone)]
pub struct HttpWebClient {
    client: reqwest::Client,
}

impl HttpWebClient {
    /// 创建新的 HTTP 客户端
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .user_agent(concat!("mods_xml_uploader/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(HttpError::ClientBuildFailed)?;
        Ok(Self { client })
    }

    async fn read_page(url: &str, response: reqwest::Response) -> AppResult<Page> {
        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }
        let final_url = response.url().to_string();
        let html = response
            .text()
            .await
            .map_err(|e| AppError::request_failed(url, e))?;
        debug!("已加载 {} ({} 字节)", final_url, html.len());
        Ok(Page::new(final_url, html))
    }
}

#[async_trait]
impl WebClient for HttpWebClient {
    async fn get(&self, url: &str) -> AppResult<Page> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::request_failed(url, e))?;
        Self::read_page(url, response).await
    }

    async fn submit(&self, submission: FormSubmission) -> AppResult<Page> {
        let FormSubmission {
            action,
            method,
            fields,
            file,
        } = submission;
        debug!("提交表单 {:?} {} ({} 个字段)", method, action, fields.len());

        let request = match (method, file) {
            (_, Some(upload)) => {
                let mut form = Form::new();
                for (name, value) in fields {
                    form = form.text(name, value);
                }
                let part = Part::bytes(upload.contents)
                    .file_name(upload.file_name)
                    .mime_str(&upload.mime)
                    .map_err(|e| AppError::request_failed(&action, e))?;
                self.client.post(&action).multipart(form.part(upload.field, part))
            }
            (FormMethod::Post, None) => self.client.post(&action).form(&fields),
            (FormMethod::Get, None) => self.client.get(&action).query(&fields),
        };

        let response = request
            .send()
            .await
            .map_err(|e| AppError::request_failed(&action, e))?;
        Self::read_page(&action, response).await
    }
}
