//! # MODS XML Uploader
//!
//! 把一个目录下的 MODS XML 文件批量上传到 Islandora 数字仓库的 Rust 应用程序。
//! 站点没有 API，所有操作都通过 HTML 表单完成：登录、加锁、替换数据流、解锁。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（带 cookie 的 HTTP 会话），只暴露能力
//! - `WebClient` - 打开页面、提交表单；`Page` / `HtmlForm` - 页面解析
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个对象
//! - `Authenticator` - 登录一次，得到共享的 `Session`
//! - `LockService` - 获取 / 释放对象锁
//! - `UploadService` - 提交 MODS 替换表单
//! - `FailureWriter` - 写失败记录
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个文件"的完整处理流程
//! - `UploadCtx` - 上下文封装（批次索引 + 文件）
//! - `UploadFlow` - 流程编排（加锁 → 上传 → 解锁）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批次处理器：扫描、登录、统计
//! - `orchestrator/dispatcher` - 固定并发的工作池与结果汇总

pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, AuthError, DiscoveryWarning};
pub use infrastructure::{HttpWebClient, Page, WebClient};
pub use models::{discover, WorkItem};
pub use orchestrator::{App, BatchReport, Dispatcher, ItemProcessor, ProgressReporter};
pub use services::{Authenticator, Credentials, Session};
pub use workflow::{ItemOutcome, UploadCtx, UploadFlow};
