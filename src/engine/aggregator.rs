// ==========================================
// FitLoop - 问题聚合器
// ==========================================
// 职责: 将原始问题按 (descriptor, category, body_area) 合并
// 红线: 输出在分组键上唯一;空 descriptor 直接丢弃
// 红线: 输出顺序 = 分组首次出现顺序 (保证 top issue 选择确定)
// ==========================================

use crate::domain::issue::{clamp_frequency, AggregatedIssue, RawIssue};
use crate::domain::types::IssueCategory;
use std::collections::HashMap;
use tracing::debug;

/// 分组键
type GroupKey = (String, IssueCategory, String);

/// 分组累加器
#[derive(Debug, Default)]
struct GroupAccumulator {
    severity_sum: f64,
    frequency_sum: f64,
    count: usize,
}

// ==========================================
// IssueAggregator - 问题聚合器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct IssueAggregator;

impl IssueAggregator {
    pub fn new() -> Self {
        Self
    }

    /// 聚合单个商品的原始问题
    ///
    /// # 参数
    /// - `product_id`: 商品ID (输出统一使用该ID)
    /// - `raw_issues`: 原始问题列表 (可来自多次提取)
    ///
    /// # 返回
    /// 聚合问题列表; severity 取均值, frequency_pct 取均值后封顶 100
    pub fn aggregate(&self, product_id: &str, raw_issues: &[RawIssue]) -> Vec<AggregatedIssue> {
        let mut order: Vec<GroupKey> = Vec::new();
        let mut groups: HashMap<GroupKey, GroupAccumulator> = HashMap::new();
        let mut dropped = 0usize;

        for issue in raw_issues {
            if issue.descriptor.trim().is_empty() {
                dropped += 1;
                continue;
            }

            let key: GroupKey = (
                issue.descriptor.clone(),
                issue.issue_category,
                issue.body_area.clone(),
            );

            let acc = groups.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                GroupAccumulator::default()
            });

            acc.severity_sum += issue.severity as f64;
            // 单条输入先收敛,避免越界值拉偏均值
            acc.frequency_sum += clamp_frequency(issue.frequency_hint);
            acc.count += 1;
        }

        let aggregated: Vec<AggregatedIssue> = order
            .into_iter()
            .filter_map(|key| {
                let acc = groups.remove(&key)?;
                let (descriptor, issue_category, body_area) = key;
                let n = acc.count as f64;
                Some(AggregatedIssue {
                    product_id: product_id.to_string(),
                    issue_category,
                    body_area,
                    descriptor,
                    severity: acc.severity_sum / n,
                    frequency_pct: clamp_frequency(acc.frequency_sum / n),
                })
            })
            .collect();

        debug!(
            product_id = %product_id,
            raw = raw_issues.len(),
            aggregated = aggregated.len(),
            dropped,
            "问题聚合完成"
        );

        aggregated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(descriptor: &str, category: IssueCategory, area: &str, severity: i32, freq: f64) -> RawIssue {
        RawIssue {
            product_id: "P1".to_string(),
            issue_category: category,
            body_area: area.to_string(),
            descriptor: descriptor.to_string(),
            severity,
            frequency_hint: freq,
        }
    }

    #[test]
    fn test_aggregate_averages_group() {
        let aggregator = IssueAggregator::new();
        let issues = vec![
            raw("runs_small", IssueCategory::Fit, "waist", 2, 20.0),
            raw("runs_small", IssueCategory::Fit, "waist", 4, 40.0),
        ];

        let result = aggregator.aggregate("P1", &issues);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].severity, 3.0);
        assert_eq!(result[0].frequency_pct, 30.0);
    }

    #[test]
    fn test_aggregate_drops_empty_descriptor() {
        let aggregator = IssueAggregator::new();
        let issues = vec![
            raw("", IssueCategory::Fit, "", 5, 90.0),
            raw("shrink", IssueCategory::Care, "", 3, 25.0),
        ];

        let result = aggregator.aggregate("P1", &issues);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].descriptor, "shrink");
    }

    #[test]
    fn test_aggregate_distinct_keys_keep_first_occurrence_order() {
        let aggregator = IssueAggregator::new();
        let issues = vec![
            raw("shrink", IssueCategory::Care, "", 3, 25.0),
            raw("runs_small", IssueCategory::Fit, "waist", 3, 25.0),
            raw("runs_small", IssueCategory::Fit, "", 3, 25.0),
            raw("shrink", IssueCategory::Care, "", 5, 75.0),
        ];

        let result = aggregator.aggregate("P1", &issues);

        let keys: Vec<_> = result
            .iter()
            .map(|i| (i.descriptor.as_str(), i.body_area.as_str()))
            .collect();
        assert_eq!(keys, vec![("shrink", ""), ("runs_small", "waist"), ("runs_small", "")]);
        assert_eq!(result[0].severity, 4.0);
        assert_eq!(result[0].frequency_pct, 50.0);
    }

    #[test]
    fn test_aggregate_clamps_frequency() {
        let aggregator = IssueAggregator::new();
        let issues = vec![
            raw("stretch", IssueCategory::Care, "", 3, 250.0),
            raw("stretch", IssueCategory::Care, "", 3, 100.0),
        ];

        let result = aggregator.aggregate("P1", &issues);
        assert_eq!(result[0].frequency_pct, 100.0);
    }

    #[test]
    fn test_aggregate_empty_input() {
        let aggregator = IssueAggregator::new();
        assert!(aggregator.aggregate("P1", &[]).is_empty());
    }

    #[test]
    fn test_aggregate_uses_requested_product_id() {
        let aggregator = IssueAggregator::new();
        let mut issue = raw("wrinkle", IssueCategory::Care, "", 3, 10.0);
        issue.product_id = "OTHER".to_string();

        let result = aggregator.aggregate("P9", &[issue]);
        assert_eq!(result[0].product_id, "P9");
    }
}
