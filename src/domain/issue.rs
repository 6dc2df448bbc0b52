// ==========================================
// FitLoop - 问题记录领域模型
// ==========================================
// 职责: 原始问题 (RawIssue) 与聚合问题 (AggregatedIssue)
// 红线: AggregatedIssue 在 (product_id, descriptor, category, body_area) 上唯一
// ==========================================

use crate::domain::types::IssueCategory;
use serde::{Deserialize, Deserializer, Serialize};

/// 严重度取值范围
pub const SEVERITY_MIN: i32 = 1;
pub const SEVERITY_MAX: i32 = 5;

/// 频率百分比上限
pub const FREQUENCY_MAX: f64 = 100.0;

// ==========================================
// RawIssue - 原始问题
// ==========================================
// 用途: 单次提取器调用的输出,跨调用可能重复
// 来源: 规则提取器 / 生成式提取器
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawIssue {
    #[serde(default)]
    pub product_id: String,           // 商品ID
    pub issue_category: IssueCategory, // 问题类别 fit / care
    #[serde(default)]
    pub body_area: String,            // 部位 (可为空)
    pub descriptor: String,           // 问题标识,如 runs_small
    #[serde(deserialize_with = "deserialize_severity")]
    pub severity: i32,                // 严重度 1-5
    pub frequency_hint: f64,          // 频率提示 0-100
}

impl RawIssue {
    /// 将严重度/频率收敛到合法区间
    ///
    /// 生成式输出不可信,落地前统一约束
    pub fn clamped(mut self) -> Self {
        self.severity = self.severity.clamp(SEVERITY_MIN, SEVERITY_MAX);
        self.frequency_hint = clamp_frequency(self.frequency_hint);
        self
    }
}

// ==========================================
// AggregatedIssue - 聚合问题
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedIssue {
    pub product_id: String,
    pub issue_category: IssueCategory,
    pub body_area: String,
    pub descriptor: String,
    pub severity: f64,      // 平均严重度 (1-5)
    pub frequency_pct: f64, // 平均频率 (0-100, 封顶)
}

impl AggregatedIssue {
    /// 影响度 = 严重度 × 频率 (原始值,不归一化)
    ///
    /// 用于 top issue 选择与文案模板选择
    pub fn impact(&self) -> f64 {
        self.severity * self.frequency_pct
    }
}

/// 严重度接受整数或整数值浮点 (如 4.0),其余拒绝
fn deserialize_severity<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.fract() != 0.0 || value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        return Err(serde::de::Error::custom(format!("severity 不是整数: {}", value)));
    }
    Ok(value as i32)
}

/// 频率收敛到 [0, 100]; NaN 视为 0
pub fn clamp_frequency(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, FREQUENCY_MAX)
}
