// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、CSV 文件、生成式后端测试桩
// ==========================================

#![allow(dead_code)]

use async_trait::async_trait;
use fitloop::api::FitLoopApi;
use fitloop::config::PipelineConfig;
use fitloop::db::{init_schema, open_sqlite_connection};
use fitloop::llm::{LlmError, LlmResult, SamplingParams, TextGenerator};
use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::{NamedTempFile, TempDir};

pub const REVIEWS_HEADER: &str = "product_id,review_text,rating,date";
pub const RETURNS_HEADER: &str = "product_id,return_reason_text,condition_flag,date";

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 基于临时数据库构造 API
pub fn create_test_api(
    db_path: &str,
    backend: Option<Arc<dyn TextGenerator>>,
) -> Result<FitLoopApi, Box<dyn Error>> {
    let conn = open_sqlite_connection(db_path)?;
    init_schema(&conn)?;
    Ok(FitLoopApi::new(
        db_path,
        Arc::new(Mutex::new(conn)),
        backend,
        PipelineConfig::default(),
    ))
}

/// 在临时目录写入 CSV 文件
pub fn write_csv(dir: &TempDir, name: &str, header: &str, rows: &[&str]) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "{}", header).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    path
}

/// 标准测试数据: P1 有版型+护理问题, P2 只有好评, P3 数据不足
pub fn write_sample_feedback(dir: &TempDir) -> (PathBuf, PathBuf) {
    let reviews = write_csv(
        dir,
        "reviews.csv",
        REVIEWS_HEADER,
        &[
            "P1,Way too tight in the waist,2,2026-01-01",
            "P1,Runs small but pretty,3,2026-01-02",
            "P1,Love the fabric,5,2026-01-03",
            "P2,Great quality,5,2026-01-01",
            "P2,Perfect for summer,5,2026-01-02",
            "P2,Would buy again,4,2026-01-03",
            "P3,Too tight,2,2026-01-04",
        ],
    );
    let returns = write_csv(
        dir,
        "returns.csv",
        RETURNS_HEADER,
        &["P1,It shrunk after one wash,used,2026-01-10"],
    );
    (reviews, returns)
}

// ==========================================
// 生成式后端测试桩
// ==========================================

/// 按调用顺序返回预设回复;回复用尽后返回错误
pub struct ScriptedGenerator {
    replies: Mutex<Vec<Result<String, LlmError>>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        let mut replies = replies;
        replies.reverse();
        Self {
            replies: Mutex::new(replies),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str, _params: SamplingParams) -> LlmResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(LlmError::Transport("no scripted reply".to_string())))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// 总是失败的后端
pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str, _params: SamplingParams) -> LlmResult<String> {
        Err(LlmError::Timeout { timeout_secs: 30 })
    }
}
