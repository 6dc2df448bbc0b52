// ==========================================
// FitLoop - OpenAI 兼容 Chat Completions 客户端
// ==========================================
// 职责: 单次请求/响应调用,带超时
// 红线: 不重试;失败一律返回 LlmError,由调用方降级
// ==========================================

use crate::config::LlmConfig;
use crate::llm::error::{LlmError, LlmResult};
use crate::llm::{SamplingParams, TextGenerator};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

// ==========================================
// 请求/响应载荷
// ==========================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// ==========================================
// OpenAiClient - Chat Completions 客户端
// ==========================================
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl OpenAiClient {
    /// 根据配置创建客户端
    ///
    /// # 返回
    /// - Ok(Self)
    /// - Err(LlmError::NotConfigured): api_key 为空
    /// - Err(LlmError::Transport): HTTP 客户端构建失败
    pub fn new(config: &LlmConfig) -> LlmResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::NotConfigured);
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        info!(
            base_url = %config.base_url,
            model = %config.model,
            timeout_secs = config.timeout_secs,
            "生成式后端已配置"
        );

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    fn map_send_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            LlmError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, prompt: &str, params: SamplingParams) -> LlmResult<String> {
        let start = std::time::Instant::now();
        let url = format!("{}/chat/completions", self.base_url);

        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        debug!(prompt_length = prompt.len(), "生成式请求开始");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(LlmError::Auth {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::MalformedResponse("响应缺少 choices[0].message.content".to_string()))?;

        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            response_length = content.len(),
            "生成式请求完成"
        );

        Ok(content.trim().to_string())
    }

    fn name(&self) -> &str {
        &self.model
    }
}
