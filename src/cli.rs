use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;
use crate::error::AppResult;
use crate::services::Credentials;

/// 命令行参数
///
/// 命令行参数优先于配置文件和环境变量。
#[derive(Parser, Debug)]
#[command(name = "mods_xml_uploader")]
#[command(about = "批量上传 MODS XML 文件到数字仓库", long_about = None)]
pub struct Cli {
    /// MODS XML 文件所在目录（递归扫描）
    pub folder: Option<PathBuf>,

    /// 登录用户名
    #[arg(short, long, env = "MODS_USERNAME", default_value = "")]
    pub username: String,

    /// 登录密码
    #[arg(short, long, env = "MODS_PASSWORD", hide_env_values = true, default_value = "")]
    pub password: String,

    /// TOML 配置文件
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 站点地址
    #[arg(long)]
    pub base_url: Option<String>,

    /// 同时上传的文件数量
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// 批次报告（JSON）输出路径
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// 显示详细日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// 合并配置：配置文件 → 环境变量 → 命令行
    pub fn resolve_config(&self) -> AppResult<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(folder) = &self.folder {
            config.xml_folder = folder.display().to_string();
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.max_concurrent_uploads = concurrency;
        }
        if let Some(report) = &self.report {
            config.report_file = Some(report.display().to_string());
        }
        if self.verbose {
            config.verbose_logging = true;
        }
        Ok(config)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "mods_xml_uploader",
            "batch",
            "-u",
            "alice",
            "-p",
            "secret",
            "-j",
            "4",
            "--base-url",
            "http://localhost:9000",
        ]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.xml_folder, "batch");
        assert_eq!(config.max_concurrent_uploads, 4);
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(cli.credentials().username, "alice");
        assert!(!format!("{:?}", cli.credentials()).contains("secret"));
    }
}
