//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和并发调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量上传处理器
//! - 管理应用生命周期（初始化、运行）
//! - 扫描文件、登录、输出统计
//!
//! ### `dispatcher` - 并发调度器
//! - 固定宽度的工作池（Semaphore）
//! - 通过通道汇总每个文件的结果
//!
//! ### `progress` - 进度与统计
//! - `ProgressState` / `BatchReport`
//! - `ProgressReporter`（控制台计数器、失败记录）
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理一个批次)
//!     ↓
//! dispatcher (处理 Vec<WorkItem>)
//!     ↓
//! workflow::UploadFlow (处理单个文件)
//!     ↓
//! services (能力层：auth / lock / upload)
//!     ↓
//! infrastructure (基础设施：WebClient)
//! ```

pub mod batch_processor;
pub mod dispatcher;
pub mod progress;

// 重新导出主要类型
pub use batch_processor::App;
pub use dispatcher::{Dispatcher, ItemProcessor, DEFAULT_CONCURRENCY};
pub use progress::{
    BatchReport, LogReporter, NoopReporter, ProgressEvent, ProgressReporter, ProgressState,
    UploadResult,
};
