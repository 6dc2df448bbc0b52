// ==========================================
// FitLoop - 规则提取器 (关键词)
// ==========================================
// 职责: 确定性关键词匹配,生成原始问题列表
// 红线: 无 I/O,永不失败;生成式后端不可用时的兜底路径
// ==========================================

use crate::domain::issue::{clamp_frequency, RawIssue, SEVERITY_MAX, SEVERITY_MIN};
use crate::domain::types::IssueCategory;
use crate::engine::text_normalizer::TextNormalizer;
use tracing::debug;

// ==========================================
// 关键词表 (静态只读)
// ==========================================

/// 尺码类问题: descriptor -> 触发词
pub const FIT_KEYWORDS: &[(&str, &[&str])] = &[
    ("runs_small", &["tight", "small", "snug", "narrow"]),
    ("runs_large", &["loose", "baggy", "large", "big", "oversized"]),
    ("sleeve_short", &["sleeve short", "short sleeve", "sleeves short"]),
    ("sleeve_long", &["sleeve long", "long sleeve", "sleeves long"]),
    ("length_short", &["short length", "too short", "length short"]),
    ("length_long", &["long length", "too long", "length long"]),
];

/// 洗护类问题: descriptor -> 触发词
pub const CARE_KEYWORDS: &[(&str, &[&str])] = &[
    ("color_fade", &["color faded", "color fade", "fading", "color bleed"]),
    ("shrink", &["shrink", "shrunk", "shrinkage"]),
    ("stretch", &["stretch", "stretched", "stretchy"]),
    ("wrinkle", &["wrinkle", "wrinkled", "creased"]),
];

/// 部位表 (顺序即优先级)
pub const BODY_AREA_KEYWORDS: &[(&str, &[&str])] = &[
    ("waist", &["waist", "torso", "middle"]),
    ("sleeve", &["sleeve", "arm", "shoulder"]),
    ("length", &["length", "hem", "long", "short"]),
    ("color", &["color", "fade", "bleed"]),
    ("overall", &["overall", "general", "fit"]),
];

/// 加重词
const INTENSIFIERS: &[&str] = &["very", "extremely"];

/// 弱化词
const HEDGES: &[&str] = &["slightly"];

/// 基础严重度
const BASE_SEVERITY: i32 = 3;

// ==========================================
// RuleBasedExtractor - 规则提取器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RuleBasedExtractor {
    normalizer: TextNormalizer,
}

impl RuleBasedExtractor {
    pub fn new() -> Self {
        Self {
            normalizer: TextNormalizer::new(),
        }
    }

    /// 从一批反馈文本中提取问题
    ///
    /// # 参数
    /// - `product_id`: 商品ID
    /// - `texts`: 该商品的全部反馈文本
    ///
    /// # 返回
    /// 原始问题列表 (先尺码类后洗护类,按关键词表顺序);无命中返回空列表
    pub fn extract(&self, product_id: &str, texts: &[String]) -> Vec<RawIssue> {
        if texts.is_empty() {
            return Vec::new();
        }

        let corpus = self.build_corpus(texts);
        let text_count = texts.len();
        let mut issues = Vec::new();

        // 1. 尺码类: 加重 +1,否则弱化 -1
        for (descriptor, triggers) in FIT_KEYWORDS {
            let matches = count_matches(&corpus, triggers);
            if matches == 0 {
                continue;
            }

            issues.push(RawIssue {
                product_id: product_id.to_string(),
                issue_category: IssueCategory::Fit,
                body_area: detect_body_area(&corpus).unwrap_or_default().to_string(),
                descriptor: descriptor.to_string(),
                severity: adjust_severity(BASE_SEVERITY, &corpus, true),
                frequency_hint: frequency_hint(matches, text_count),
            });
        }

        // 2. 洗护类: 只加重,不弱化
        for (descriptor, triggers) in CARE_KEYWORDS {
            let matches = count_matches(&corpus, triggers);
            if matches == 0 {
                continue;
            }

            let body_area = if descriptor.contains("color") { "color" } else { "" };

            issues.push(RawIssue {
                product_id: product_id.to_string(),
                issue_category: IssueCategory::Care,
                body_area: body_area.to_string(),
                descriptor: descriptor.to_string(),
                severity: adjust_severity(BASE_SEVERITY, &corpus, false),
                frequency_hint: frequency_hint(matches, text_count),
            });
        }

        debug!(
            product_id = %product_id,
            texts = text_count,
            issues = issues.len(),
            "规则提取完成"
        );

        issues
    }

    /// 拼接规范化后的全部文本,作为检索语料
    fn build_corpus(&self, texts: &[String]) -> String {
        texts
            .iter()
            .map(|t| self.normalizer.normalize(t))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// 统计语料中出现的不同触发词个数
fn count_matches(corpus: &str, triggers: &[&str]) -> usize {
    triggers.iter().filter(|kw| corpus.contains(*kw)).count()
}

/// 按固定顺序返回第一个命中的部位
fn detect_body_area(corpus: &str) -> Option<&'static str> {
    BODY_AREA_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| corpus.contains(kw)))
        .map(|(area, _)| *area)
}

/// 严重度调整
///
/// - 含加重词 (very / extremely): +1
/// - 否则若 `apply_hedge` 且含弱化词 (slightly): -1
/// - 结果收敛到 [1, 5]
pub fn adjust_severity(base: i32, corpus: &str, apply_hedge: bool) -> i32 {
    let mut severity = base;
    if INTENSIFIERS.iter().any(|w| corpus.contains(w)) {
        severity += 1;
    } else if apply_hedge && HEDGES.iter().any(|w| corpus.contains(w)) {
        severity -= 1;
    }
    severity.clamp(SEVERITY_MIN, SEVERITY_MAX)
}

/// frequency_hint = trunc(min(100, matches / text_count * 100))
fn frequency_hint(matches: usize, text_count: usize) -> f64 {
    let pct = matches as f64 / text_count as f64 * 100.0;
    clamp_frequency(pct).trunc()
}
