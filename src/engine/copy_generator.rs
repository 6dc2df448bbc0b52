// ==========================================
// FitLoop - 导购文案生成器
// ==========================================
// 职责: 聚合问题 -> 尺码建议 + 护理提示
// 红线: 无问题时不调用后端,返回空文案
// 红线: 后端未配置或任一失败,降级为确定性模板
// ==========================================

use crate::config::PipelineConfig;
use crate::domain::copy::AdvisoryCopy;
use crate::domain::issue::AggregatedIssue;
use crate::domain::types::IssueCategory;
use crate::engine::error::ExtractError;
use crate::engine::prompts::advisory_copy_prompt;
use crate::engine::risk::top_issue;
use crate::llm::{decode_first_object, SamplingParams, TextGenerator};
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

// 模板文案
const SIZE_UP: &str = "Consider ordering one size up for a more comfortable fit.";
const SIZE_DOWN: &str = "Consider ordering one size down for a better fit.";
const SLEEVE_SHORT: &str = "Note that sleeves may run shorter than expected.";
const LENGTH_SHORT: &str = "This item may run shorter in length than expected.";
const SIZE_DEFAULT: &str = "Check size chart carefully before ordering.";

const CARE_COLOR_FADE: &str = "Wash inside out in cold water to preserve color.";
const CARE_SHRINK: &str = "Air dry or use low heat to prevent shrinkage.";
const CARE_STRETCH: &str = "Lay flat to dry to maintain shape.";
const CARE_DEFAULT: &str = "Follow care label instructions for best results.";

/// 后端返回的文案对象,缺失字段视为空串
#[derive(Debug, Default, Deserialize)]
struct CopyPayload {
    #[serde(default)]
    size_guidance: String,
    #[serde(default)]
    care_tip: String,
}

// ==========================================
// CopyGenerator - 文案生成器
// ==========================================
pub struct CopyGenerator {
    backend: Option<Arc<dyn TextGenerator>>,
    sampling: SamplingParams,
}

impl CopyGenerator {
    pub fn new(backend: Option<Arc<dyn TextGenerator>>, config: &PipelineConfig) -> Self {
        Self {
            backend,
            sampling: config.copy_sampling,
        }
    }

    /// 生成文案 (带兜底)
    ///
    /// # 参数
    /// - `product_id`: 商品ID
    /// - `issues`: 该商品的聚合问题
    /// - `generated_at`: 生成时间 (由调用方注入)
    pub async fn generate(
        &self,
        product_id: &str,
        issues: &[AggregatedIssue],
        generated_at: NaiveDateTime,
    ) -> AdvisoryCopy {
        if issues.is_empty() {
            return AdvisoryCopy::empty(product_id, generated_at);
        }

        if let Some(backend) = &self.backend {
            match self.try_generate(backend.as_ref(), product_id, issues).await {
                Ok(payload) => {
                    return AdvisoryCopy::new(
                        product_id,
                        &payload.size_guidance,
                        &payload.care_tip,
                        generated_at,
                    );
                }
                Err(e) => {
                    warn!(
                        product_id = %product_id,
                        backend = %backend.name(),
                        error = %e,
                        "生成式文案失败,降级为模板文案"
                    );
                }
            }
        }

        let (size_guidance, care_tip) = template_copy(issues);
        AdvisoryCopy::new(product_id, &size_guidance, &care_tip, generated_at)
    }

    async fn try_generate(
        &self,
        backend: &dyn TextGenerator,
        product_id: &str,
        issues: &[AggregatedIssue],
    ) -> Result<CopyPayload, ExtractError> {
        let prompt = advisory_copy_prompt(product_id, issues)?;
        let response = backend.generate(&prompt, self.sampling).await?;
        let payload = parse_copy_payload(&response)?;

        debug!(product_id = %product_id, "生成式文案完成");
        Ok(payload)
    }
}

/// 取第一个能解码为文案对象的配平 `{}` 片段
fn parse_copy_payload(response: &str) -> Result<CopyPayload, ExtractError> {
    let payload = decode_first_object(response).ok_or(ExtractError::NoJsonFound("object"))??;
    Ok(payload)
}

/// 确定性模板文案
///
/// 各类别内取影响度 (severity × frequency_pct) 最大的问题,并列取先出现者;
/// 类别内无问题时该字段为空
pub fn template_copy(issues: &[AggregatedIssue]) -> (String, String) {
    let top_fit = top_issue(issues.iter().filter(|i| i.issue_category == IssueCategory::Fit));
    let top_care = top_issue(issues.iter().filter(|i| i.issue_category == IssueCategory::Care));

    let size_guidance = top_fit
        .map(|issue| size_sentence(&issue.descriptor))
        .unwrap_or_default();
    let care_tip = top_care
        .map(|issue| care_sentence(&issue.descriptor))
        .unwrap_or_default();

    (size_guidance.to_string(), care_tip.to_string())
}

fn size_sentence(descriptor: &str) -> &'static str {
    match descriptor {
        "runs_small" => SIZE_UP,
        "runs_large" => SIZE_DOWN,
        d if d.contains("sleeve_short") => SLEEVE_SHORT,
        d if d.contains("length_short") => LENGTH_SHORT,
        _ => SIZE_DEFAULT,
    }
}

fn care_sentence(descriptor: &str) -> &'static str {
    if descriptor.contains("color_fade") {
        CARE_COLOR_FADE
    } else if descriptor.contains("shrink") {
        CARE_SHRINK
    } else if descriptor.contains("stretch") {
        CARE_STRETCH
    } else {
        CARE_DEFAULT
    }
}
