// ==========================================
// FitLoop - 生成式后端错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 生成式后端错误
///
/// 所有变体在提取器/文案生成器边界被捕获并降级为确定性兜底
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("生成式后端未配置")]
    NotConfigured,

    #[error("生成式后端请求超时 ({timeout_secs}s)")]
    Timeout { timeout_secs: u64 },

    #[error("生成式后端认证失败: HTTP {status}")]
    Auth { status: u16 },

    #[error("生成式后端返回错误: HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("生成式后端请求失败: {0}")]
    Transport(String),

    #[error("生成式后端响应格式错误: {0}")]
    MalformedResponse(String),
}

/// Result 类型别名
pub type LlmResult<T> = Result<T, LlmError>;
