// ==========================================
// FitLoop - 命令行入口
// ==========================================
// 子命令: upload / process / products / show / export / status / config
// 红线: 命令结果输出到 stdout,日志输出到 stderr
// ==========================================

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fitloop::api::export_file_name;
use fitloop::app::AppState;
use fitloop::config::AppConfig;
use fitloop::logging::{self, LogFormat};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// FitLoop - 评价/退货原因中的版型与护理问题分析
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// 数据库路径 (覆盖 FITLOOP_DB_PATH)
    #[arg(long, global = true)]
    db: Option<String>,

    /// 以 JSON 输出命令结果
    #[arg(long, global = true)]
    json: bool,

    /// 日志格式
    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Text)]
    log_format: LogFormatArg,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 上传评价与退货 CSV (覆盖已有数据)
    Upload {
        /// 评价 CSV: product_id,review_text,rating,date
        #[arg(long)]
        reviews: PathBuf,
        /// 退货 CSV: product_id,return_reason_text,condition_flag,date
        #[arg(long)]
        returns: PathBuf,
    },
    /// 提取问题、计算风险分并生成文案
    Process,
    /// 按风险分降序列出商品
    Products,
    /// 查看商品详情
    Show { product_id: String },
    /// 导出商品 Markdown 报告
    Export {
        product_id: String,
        /// 输出文件 (缺省为 product_<id>_analysis.md;"-" 表示 stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// 数据概况
    Status,
    /// 查看或设置管道参数覆写
    Config {
        /// 配置键,如 pipeline/min_feedback_texts
        key: Option<String>,
        /// 新值 (缺省则仅查看)
        value: Option<String>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_with_format(cli.log_format.into());

    info!(version = fitloop::VERSION, "{} 启动", fitloop::APP_NAME);

    let mut config = AppConfig::from_env();
    if let Some(db) = cli.db.clone() {
        config.db_path = Some(db);
    }

    let state = AppState::new(config).context("无法初始化应用")?;
    let api = state.api.clone();

    match cli.command {
        Command::Upload { reviews, returns } => {
            let summary = api.upload(&reviews, &returns).context("上传失败")?;
            if cli.json {
                print_json(&summary)?;
            } else {
                println!(
                    "Uploaded {} reviews and {} returns ({} rows skipped)",
                    summary.reviews_uploaded, summary.returns_uploaded, summary.rows_skipped
                );
            }
        }
        Command::Process => {
            let summary = api.process().await.context("处理失败")?;
            if cli.json {
                print_json(&summary)?;
            } else {
                println!(
                    "Processed {} products, skipped {}",
                    summary.products_processed, summary.products_skipped
                );
                for skipped in &summary.skipped {
                    println!("  skipped {}: {}", skipped.product_id, skipped.reason);
                }
                for failed in &summary.failed {
                    println!("  failed {}", failed);
                }
            }
        }
        Command::Products => {
            let products = api.list_products()?;
            if cli.json {
                print_json(&products)?;
            } else if products.is_empty() {
                println!("No products. Run `fitloop process` first.");
            } else {
                println!("{:<20} {:>10}  {:<24} {}", "PRODUCT", "RISK", "TOP ISSUE", "UPDATED");
                for p in &products {
                    println!(
                        "{:<20} {:>10.3}  {:<24} {}",
                        p.product_id, p.risk_score, p.top_issue_descriptor, p.updated_at
                    );
                }
            }
        }
        Command::Show { product_id } => {
            let detail = api.get_product_detail(&product_id)?;
            if cli.json {
                print_json(&detail)?;
            } else {
                println!("Product:    {}", detail.product_id);
                println!("Risk score: {}", detail.risk_score);
                println!("Top issue:  {}", detail.top_issue_descriptor);
                println!("Size guidance: {}", detail.generated_copy.size_guidance);
                println!("Care tip:      {}", detail.generated_copy.care_tip);
                for issue in &detail.issues {
                    println!(
                        "  - [{}] {} {} severity={} frequency={}%",
                        issue.issue_category,
                        issue.descriptor,
                        issue.body_area,
                        issue.severity,
                        issue.frequency_pct
                    );
                }
            }
        }
        Command::Export { product_id, output } => {
            let markdown = api.export_markdown(&product_id)?;
            let target = output.unwrap_or_else(|| PathBuf::from(export_file_name(&product_id)));
            if target.as_os_str() == "-" {
                println!("{}", markdown);
            } else {
                std::fs::write(&target, markdown)
                    .with_context(|| format!("无法写入 {}", target.display()))?;
                println!("Exported {}", target.display());
            }
        }
        Command::Status => {
            let status = api.status()?;
            if cli.json {
                print_json(&status)?;
            } else {
                println!("Database:   {}", status.db_path);
                println!("Reviews:    {}", status.reviews);
                println!("Returns:    {}", status.returns);
                println!("Products:   {}", status.products);
                println!("Issues:     {}", status.issues);
                println!("Generative: {}", if status.generative_enabled { "enabled" } else { "disabled" });
            }
        }
        Command::Config { key, value } => {
            let manager = api.config_manager();
            match (key, value) {
                (Some(key), Some(value)) => {
                    manager.set_config_value(&key, &value)?;
                    println!("{} = {}", key, value);
                }
                (Some(key), None) => match manager.get_config_value(&key)? {
                    Some(value) => println!("{} = {}", key, value),
                    None => println!("{} (unset)", key),
                },
                (None, _) => {
                    let configs = manager.list_configs()?;
                    if cli.json {
                        print_json(&configs)?;
                    } else {
                        for (key, value) in &configs {
                            println!("{} = {}", key, value);
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
