// ==========================================
// FitLoop - 生成式提示词
// ==========================================

use crate::domain::issue::AggregatedIssue;
use crate::domain::copy::{CARE_TIP_MAX_CHARS, SIZE_GUIDANCE_MAX_CHARS};

/// 问题提取提示词: 要求返回 RawIssue 字段的 JSON 数组
pub fn issue_extraction_prompt(product_id: &str, texts: &[String]) -> String {
    let batch_text = texts
        .iter()
        .map(|t| format!("- {}", t.trim()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze the following product feedback texts and extract recurring fit or care issues.
Return ONLY a JSON array where each item has these exact fields:
- product_id: "{product_id}"
- issue_category: "fit" or "care"
- body_area: specific area like "waist", "sleeve", "length", "color", etc (or "" if general)
- descriptor: short snake_case like "runs_small", "color_fade", "shrink", etc
- severity: integer 1-5 (1=minor, 5=severe)
- frequency_hint: integer 0-100 (rough percentage of texts mentioning this issue)

Focus on recurring problems, ignore compliments. Merge similar phrases.

Texts:
{batch_text}"#
    )
}

/// 文案生成提示词: 要求返回 size_guidance / care_tip 的 JSON 对象
pub fn advisory_copy_prompt(product_id: &str, issues: &[AggregatedIssue]) -> serde_json::Result<String> {
    let issues_text = serde_json::to_string_pretty(issues)?;

    Ok(format!(
        r#"Given these structured fit and care issues for product {product_id}:
{issues_text}

Generate concise, helpful copy. Return ONLY JSON with exactly these fields:
- size_guidance: clear sizing advice (<= {SIZE_GUIDANCE_MAX_CHARS} characters, customer-friendly, neutral tone)
- care_tip: actionable care instructions (<= {CARE_TIP_MAX_CHARS} characters, practical, materials-agnostic)

Be specific and helpful. Don't repeat the product ID."#
    ))
}
