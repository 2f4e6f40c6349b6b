use anyhow::Result;
use clap::Parser;
use mods_xml_uploader::cli::Cli;
use mods_xml_uploader::utils::{logging, shutdown};
use mods_xml_uploader::App;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = cli.resolve_config()?;

    // 初始化日志
    logging::init_log_file(&config.output_log_file)?;
    logging::init(config.verbose_logging, Some(&config.output_log_file))?;

    // 初始化应用
    let app = App::initialize(config)?;

    // Ctrl-C：第一次停止分发新文件（已持有的锁会先释放），第二次立即退出
    shutdown::watch_ctrl_c(app.cancellation_token());

    if let Some(report) = app.run(&cli.credentials()).await? {
        println!("Finished! Uploaded {} files.", report.tally());
    }

    Ok(())
}
