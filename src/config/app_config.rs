// ==========================================
// FitLoop - 应用配置
// ==========================================
// 职责: 环境变量 -> AppConfig;管道参数默认值
// 红线: 未设置 OPENAI_API_KEY 即视为未配置生成式后端 (不是错误)
// ==========================================

use crate::llm::SamplingParams;

/// 环境变量名
pub mod env_keys {
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const LLM_BASE_URL: &str = "FITLOOP_LLM_BASE_URL";
    pub const LLM_MODEL: &str = "FITLOOP_LLM_MODEL";
    pub const LLM_TIMEOUT_SECS: &str = "FITLOOP_LLM_TIMEOUT_SECS";
    pub const DB_PATH: &str = "FITLOOP_DB_PATH";
}

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;

// ==========================================
// LlmConfig - 生成式后端配置
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
        }
    }
}

// ==========================================
// PipelineConfig - 处理管道参数
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// 商品最少反馈条数,不足则跳过
    pub min_feedback_texts: usize,
    /// 生成式提取最多送入的文本条数
    pub max_generative_texts: usize,
    /// 商品级并发度
    pub max_concurrency: usize,
    /// 问题提取采样参数
    pub extract_sampling: SamplingParams,
    /// 文案生成采样参数
    pub copy_sampling: SamplingParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_feedback_texts: 3,
            max_generative_texts: 50,
            max_concurrency: 4,
            extract_sampling: SamplingParams::new(0.1, 1000),
            copy_sampling: SamplingParams::new(0.1, 500),
        }
    }
}

// ==========================================
// AppConfig - 应用配置
// ==========================================
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: Option<String>,
    pub llm: Option<LlmConfig>,
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    /// 从进程环境变量加载
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意 key -> value 查找函数加载 (便于测试)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let llm = non_empty(env_keys::OPENAI_API_KEY).map(|api_key| {
            let defaults = LlmConfig::default();
            LlmConfig {
                api_key,
                base_url: non_empty(env_keys::LLM_BASE_URL).unwrap_or(defaults.base_url),
                model: non_empty(env_keys::LLM_MODEL).unwrap_or(defaults.model),
                timeout_secs: non_empty(env_keys::LLM_TIMEOUT_SECS)
                    .and_then(|v| v.parse::<u64>().ok())
                    .filter(|v| *v > 0)
                    .unwrap_or(defaults.timeout_secs),
            }
        });

        Self {
            db_path: non_empty(env_keys::DB_PATH),
            llm,
            pipeline: PipelineConfig::default(),
        }
    }

    /// 是否启用生成式后端
    pub fn generative_enabled(&self) -> bool {
        self.llm.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_no_api_key_disables_llm() {
        let config = AppConfig::from_lookup(lookup_from(&[(env_keys::LLM_MODEL, "x")]));
        assert!(config.llm.is_none());
        assert!(!config.generative_enabled());
    }

    #[test]
    fn test_blank_api_key_disables_llm() {
        let config = AppConfig::from_lookup(lookup_from(&[(env_keys::OPENAI_API_KEY, "  ")]));
        assert!(config.llm.is_none());
    }

    #[test]
    fn test_llm_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (env_keys::OPENAI_API_KEY, "sk-1"),
            (env_keys::LLM_MODEL, "local-model"),
            (env_keys::LLM_TIMEOUT_SECS, "abc"),
            (env_keys::DB_PATH, "/tmp/fitloop.db"),
        ]));

        let llm = config.llm.unwrap();
        assert_eq!(llm.api_key, "sk-1");
        assert_eq!(llm.model, "local-model");
        assert_eq!(llm.base_url, DEFAULT_LLM_BASE_URL);
        assert_eq!(llm.timeout_secs, DEFAULT_LLM_TIMEOUT_SECS);
        assert_eq!(config.db_path.as_deref(), Some("/tmp/fitloop.db"));
    }

    #[test]
    fn test_pipeline_defaults() {
        let pipeline = PipelineConfig::default();
        assert_eq!(pipeline.min_feedback_texts, 3);
        assert_eq!(pipeline.max_generative_texts, 50);
        assert_eq!(pipeline.extract_sampling.max_tokens, 1000);
        assert_eq!(pipeline.copy_sampling.max_tokens, 500);
    }
}
