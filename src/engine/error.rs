// ==========================================
// FitLoop - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::llm::LlmError;
use thiserror::Error;

/// 生成式提取/文案错误
///
/// 任一变体都触发同一兜底策略 (规则提取 / 模板文案)
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error(transparent)]
    Backend(#[from] LlmError),

    #[error("响应中未找到 JSON {0}")]
    NoJsonFound(&'static str),

    #[error("JSON 解析失败: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ExtractError {
    fn from(err: serde_json::Error) -> Self {
        ExtractError::Parse(err.to_string())
    }
}

/// 批处理错误
///
/// 单个商品的问题不会上升为批处理错误
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("没有可处理的反馈数据")]
    NoFeedback,
}
