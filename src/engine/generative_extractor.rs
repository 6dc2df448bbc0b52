// ==========================================
// FitLoop - 生成式问题提取器
// ==========================================
// 职责: 调用生成式后端提取结构化问题,校验并收敛输出
// 红线: 任一失败 (无 JSON / 解析失败 / 后端错误) 静默降级为规则提取
// 红线: 降级只在 extract() 一处发生
// ==========================================

use crate::config::PipelineConfig;
use crate::domain::issue::RawIssue;
use crate::engine::error::ExtractError;
use crate::engine::prompts::issue_extraction_prompt;
use crate::engine::rule_extractor::RuleBasedExtractor;
use crate::llm::{decode_first_array, SamplingParams, TextGenerator};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

// ==========================================
// ExtractionSource - 提取结果来源
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// 未配置生成式后端,直接规则提取
    RuleBased,
    /// 生成式提取成功
    Generative,
    /// 生成式提取失败后降级为规则提取
    GenerativeFallback,
}

/// 提取结果
#[derive(Debug, Clone)]
pub struct Extraction {
    pub issues: Vec<RawIssue>,
    pub source: ExtractionSource,
}

// ==========================================
// GenerativeExtractor - 生成式提取器
// ==========================================
pub struct GenerativeExtractor {
    backend: Arc<dyn TextGenerator>,
    fallback: RuleBasedExtractor,
    max_texts: usize,
    sampling: SamplingParams,
}

impl GenerativeExtractor {
    /// 创建生成式提取器
    ///
    /// # 参数
    /// - backend: 已配置的生成式后端
    /// - config: 管道参数 (文本条数上限 / 采样参数)
    pub fn new(backend: Arc<dyn TextGenerator>, config: &PipelineConfig) -> Self {
        Self {
            backend,
            fallback: RuleBasedExtractor::new(),
            max_texts: config.max_generative_texts.max(1),
            sampling: config.extract_sampling,
        }
    }

    /// 提取问题 (带兜底)
    ///
    /// try_extract 成功则返回其结果,否则记录日志并返回规则提取结果
    pub async fn extract(&self, product_id: &str, texts: &[String]) -> Extraction {
        match self.try_extract(product_id, texts).await {
            Ok(issues) => Extraction {
                issues,
                source: ExtractionSource::Generative,
            },
            Err(e) => {
                warn!(
                    product_id = %product_id,
                    backend = %self.backend.name(),
                    error = %e,
                    "生成式提取失败,降级为规则提取"
                );
                Extraction {
                    issues: self.fallback.extract(product_id, texts),
                    source: ExtractionSource::GenerativeFallback,
                }
            }
        }
    }

    /// 生成式提取 (不带兜底)
    ///
    /// # 返回
    /// - Ok(Vec<RawIssue>): 已校验、已收敛的问题列表 (可为空)
    /// - Err(ExtractError): 后端错误 / 无 JSON 数组 / 解析失败
    pub async fn try_extract(
        &self,
        product_id: &str,
        texts: &[String],
    ) -> Result<Vec<RawIssue>, ExtractError> {
        let batch = &texts[..texts.len().min(self.max_texts)];
        let prompt = issue_extraction_prompt(product_id, batch);

        let response = self.backend.generate(&prompt, self.sampling).await?;
        let issues = parse_issue_array(product_id, &response)?;

        debug!(
            product_id = %product_id,
            texts_sent = batch.len(),
            issues = issues.len(),
            "生成式提取完成"
        );

        Ok(issues)
    }
}

/// 解析模型输出中的问题数组
///
/// - 取第一个能解码为 JSON 数组的配平片段,正文里的方括号不影响定位
/// - 非对象元素、无法解码为 RawIssue 的元素静默丢弃
/// - product_id 统一为请求的商品,严重度/频率收敛到合法区间
pub fn parse_issue_array(product_id: &str, response: &str) -> Result<Vec<RawIssue>, ExtractError> {
    let elements: Vec<Value> =
        decode_first_array(response).ok_or(ExtractError::NoJsonFound("array"))??;

    let total = elements.len();
    let issues: Vec<RawIssue> = elements
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|v| serde_json::from_value::<RawIssue>(v).ok())
        .map(|mut issue| {
            issue.product_id = product_id.to_string();
            issue.clamped()
        })
        .collect();

    if issues.len() < total {
        debug!(
            product_id = %product_id,
            dropped = total - issues.len(),
            "丢弃无法解码的生成式输出元素"
        );
    }

    Ok(issues)
}
