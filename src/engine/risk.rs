// ==========================================
// FitLoop - 风险评分引擎
// ==========================================
// 职责: 聚合问题 -> 综合风险分 + top issue
// 输入: 单个商品的聚合问题 (非空)
// 输出: ProductRiskSummary
// ==========================================
// 红线: n>1 按区间归一化, n=1 按固定刻度归一化 (两分支刻度原点不同,保持现状)
// ==========================================

use crate::domain::issue::{AggregatedIssue, FREQUENCY_MAX, SEVERITY_MAX};
use crate::domain::risk::ProductRiskSummary;
use chrono::NaiveDateTime;

/// 严重度权重
pub const SEVERITY_WEIGHT: f64 = 0.6;

/// 频率权重
pub const FREQUENCY_WEIGHT: f64 = 0.4;

/// 区间为 0 时的归一化取值
const FLAT_RANGE_VALUE: f64 = 0.5;

// ==========================================
// RiskScore - 评分结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct RiskScore {
    pub risk_score: f64,
    pub top_issue_descriptor: String,
}

// ==========================================
// RiskScorer - 风险评分引擎
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskScorer;

impl RiskScorer {
    pub fn new() -> Self {
        Self
    }

    /// 计算商品风险分
    ///
    /// # 参数
    /// - `issues`: 单个商品的聚合问题
    ///
    /// # 返回
    /// - Some(RiskScore): 风险分 (0-1) 与 top issue
    /// - None: 问题列表为空 (上游应跳过摘要生成)
    pub fn score(&self, issues: &[AggregatedIssue]) -> Option<RiskScore> {
        if issues.is_empty() {
            return None;
        }

        // 1. 收集原始值
        let severities: Vec<f64> = issues.iter().map(|i| i.severity).collect();
        let frequencies: Vec<f64> = issues.iter().map(|i| i.frequency_pct).collect();

        // 2. 归一化
        let (severity_norm, frequency_norm) = if issues.len() > 1 {
            (normalize_by_range(&severities), normalize_by_range(&frequencies))
        } else {
            (
                vec![severities[0] / SEVERITY_MAX as f64],
                vec![frequencies[0] / FREQUENCY_MAX],
            )
        };

        // 3. 加权求均值
        let composites: Vec<f64> = severity_norm
            .iter()
            .zip(frequency_norm.iter())
            .map(|(s, f)| SEVERITY_WEIGHT * s + FREQUENCY_WEIGHT * f)
            .collect();
        let risk_score = composites.iter().sum::<f64>() / composites.len() as f64;

        // 4. top issue (原始 severity * frequency 最大,并列取先出现者)
        let top_issue_descriptor = top_issue(issues)?.descriptor.clone();

        Some(RiskScore {
            risk_score,
            top_issue_descriptor,
        })
    }

    /// 生成商品风险摘要
    ///
    /// # 参数
    /// - `product_id`: 商品ID
    /// - `issues`: 聚合问题
    /// - `computed_at`: 计算时间 (由调用方注入,保证重复运行结果一致)
    pub fn summarize(
        &self,
        product_id: &str,
        issues: &[AggregatedIssue],
        computed_at: NaiveDateTime,
    ) -> Option<ProductRiskSummary> {
        let score = self.score(issues)?;
        Some(ProductRiskSummary {
            product_id: product_id.to_string(),
            risk_score: score.risk_score,
            top_issue_descriptor: score.top_issue_descriptor,
            computed_at,
        })
    }
}

/// 最小-最大归一化;区间为 0 时全部取 0.5
fn normalize_by_range(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range > 0.0 {
        values.iter().map(|v| (v - min) / range).collect()
    } else {
        vec![FLAT_RANGE_VALUE; values.len()]
    }
}

/// 影响度最大的问题;并列时保留第一个
pub fn top_issue<'a, I>(issues: I) -> Option<&'a AggregatedIssue>
where
    I: IntoIterator<Item = &'a AggregatedIssue>,
{
    let mut best: Option<&AggregatedIssue> = None;
    for issue in issues {
        match best {
            Some(current) if issue.impact() <= current.impact() => {}
            _ => best = Some(issue),
        }
    }
    best
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::IssueCategory;
    use chrono::NaiveDate;

    fn issue(descriptor: &str, severity: f64, frequency_pct: f64) -> AggregatedIssue {
        AggregatedIssue {
            product_id: "P1".to_string(),
            issue_category: IssueCategory::Fit,
            body_area: String::new(),
            descriptor: descriptor.to_string(),
            severity,
            frequency_pct,
        }
    }

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_single_issue_fixed_scale() {
        let scorer = RiskScorer::new();
        let score = scorer.score(&[issue("runs_small", 5.0, 100.0)]).unwrap();
        assert!(approx_eq(score.risk_score, 1.0));
        assert_eq!(score.top_issue_descriptor, "runs_small");

        let score = scorer.score(&[issue("runs_small", 3.0, 25.0)]).unwrap();
        // 0.6 * 0.6 + 0.4 * 0.25
        assert!(approx_eq(score.risk_score, 0.46));
    }

    #[test]
    fn test_equal_issues_use_half() {
        let scorer = RiskScorer::new();
        let score = scorer
            .score(&[issue("a", 3.0, 40.0), issue("b", 3.0, 40.0)])
            .unwrap();
        assert!(approx_eq(score.risk_score, 0.5));
        // 并列取第一个
        assert_eq!(score.top_issue_descriptor, "a");
    }

    #[test]
    fn test_range_normalization() {
        let scorer = RiskScorer::new();
        // severity: [2,4] -> [0,1]; frequency: [10,10] -> [0.5,0.5]
        let score = scorer
            .score(&[issue("low", 2.0, 10.0), issue("high", 4.0, 10.0)])
            .unwrap();
        // (0.6*0 + 0.4*0.5 + 0.6*1 + 0.4*0.5) / 2 = 0.5
        assert!(approx_eq(score.risk_score, 0.5));
        assert_eq!(score.top_issue_descriptor, "high");
    }

    #[test]
    fn test_top_issue_uses_raw_product() {
        let scorer = RiskScorer::new();
        let score = scorer
            .score(&[issue("frequent", 2.0, 90.0), issue("severe", 5.0, 30.0)])
            .unwrap();
        // 2*90=180 > 5*30=150
        assert_eq!(score.top_issue_descriptor, "frequent");
    }

    #[test]
    fn test_score_in_unit_interval() {
        let scorer = RiskScorer::new();
        let score = scorer
            .score(&[
                issue("a", 1.0, 0.0),
                issue("b", 5.0, 100.0),
                issue("c", 3.0, 50.0),
            ])
            .unwrap();
        assert!(score.risk_score >= 0.0 && score.risk_score <= 1.0);
    }

    #[test]
    fn test_empty_returns_none() {
        let scorer = RiskScorer::new();
        assert!(scorer.score(&[]).is_none());
    }

    #[test]
    fn test_summarize_stamps_time() {
        let scorer = RiskScorer::new();
        let at = NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let summary = scorer
            .summarize("P7", &[issue("shrink", 4.0, 50.0)], at)
            .unwrap();
        assert_eq!(summary.product_id, "P7");
        assert_eq!(summary.computed_at, at);
        assert!(approx_eq(summary.risk_score, 0.6 * 0.8 + 0.4 * 0.5));
    }
}
