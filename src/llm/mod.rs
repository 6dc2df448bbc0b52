// ==========================================
// FitLoop - 生成式后端层
// ==========================================
// 职责: 窄接口 TextGenerator (prompt + 采样参数 -> 文本)
// 红线: 未配置时不存在实例,调用方在调用前即可判定并走兜底路径
// ==========================================

pub mod client;
pub mod error;
pub mod json_extract;

pub use client::OpenAiClient;
pub use error::{LlmError, LlmResult};
pub use json_extract::{decode_first_array, decode_first_object};

use async_trait::async_trait;

// ==========================================
// SamplingParams - 采样参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl SamplingParams {
    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }
}

// ==========================================
// TextGenerator Trait
// ==========================================
// 用途: 生成式文本后端接口
// 实现者: OpenAiClient / 测试桩
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// 单次补全调用
    ///
    /// # 返回
    /// - Ok(String): 模型输出文本
    /// - Err(LlmError): 超时 / 传输 / 认证 / 响应格式错误
    async fn generate(&self, prompt: &str, params: SamplingParams) -> LlmResult<String>;

    /// 后端名称 (日志用)
    fn name(&self) -> &str {
        "text-generator"
    }
}
