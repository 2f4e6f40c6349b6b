//! 基础设施层
//!
//! 持有稀缺资源（HTTP 会话），只暴露能力

pub mod page;
pub mod web_client;

pub use page::{HtmlForm, Link, Page};
pub use web_client::{FileUpload, FormMethod, FormSubmission, HttpWebClient, WebClient};
