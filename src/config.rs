use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, AppResult, ConfigError, FileError};

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 数字仓库站点地址
    pub base_url: String,
    /// MODS XML 文件所在目录（递归扫描）
    pub xml_folder: String,
    /// 同时上传的文件数量
    pub max_concurrent_uploads: usize,
    /// 单个请求超时（秒）
    pub request_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 运行日志文件
    pub output_log_file: String,
    /// 失败条目记录文件
    pub failure_log_file: String,
    /// 批次报告（JSON），为空时不写
    pub report_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://doh.arcabc.ca".to_string(),
            xml_folder: "UpdatedXML".to_string(),
            // 10 个并发，避免给站点造成过大压力
            max_concurrent_uploads: 10,
            request_timeout_secs: 60,
            verbose_logging: false,
            output_log_file: "upload_log.txt".to_string(),
            failure_log_file: "failed_uploads.txt".to_string(),
            report_file: None,
        }
    }
}

impl Config {
    /// 读取配置：TOML 文件（可选）→ 环境变量覆盖
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.with_env(|name| std::env::var(name).ok())
    }

    /// 从 TOML 文件读取，缺失的字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        let config = toml::from_str(&content).map_err(|e| FileError::TomlParseFailed {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(config)
    }

    /// 用 `lookup` 提供的变量覆盖当前配置
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        if let Some(v) = lookup("MODS_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("MODS_XML_FOLDER") {
            self.xml_folder = v;
        }
        if let Some(v) = lookup("MAX_CONCURRENT_UPLOADS") {
            self.max_concurrent_uploads = parse_var("MAX_CONCURRENT_UPLOADS", v, "usize")?;
        }
        if let Some(v) = lookup("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_var("REQUEST_TIMEOUT_SECS", v, "u64")?;
        }
        if let Some(v) = lookup("VERBOSE_LOGGING") {
            self.verbose_logging = parse_var("VERBOSE_LOGGING", v, "bool")?;
        }
        if let Some(v) = lookup("OUTPUT_LOG_FILE") {
            self.output_log_file = v;
        }
        if let Some(v) = lookup("FAILURE_LOG_FILE") {
            self.failure_log_file = v;
        }
        if let Some(v) = lookup("REPORT_FILE") {
            self.report_file = Some(v);
        }
        Ok(self)
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> AppResult<()> {
        if self.max_concurrent_uploads == 0 {
            return Err(ConfigError::ZeroConcurrency.into());
        }
        match reqwest::Url::parse(&self.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
            _ => Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
            }
            .into()),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_var<T: std::str::FromStr>(var_name: &str, value: String, expected_type: &str) -> AppResult<T> {
    value.trim().parse().map_err(|_| {
        ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value,
            expected_type: expected_type.to_string(),
        }
        .into()
    })
}
