// ==========================================
// FitLoop - 商品风险摘要领域模型
// ==========================================
// 用途: 商品列表只读数据源,每次处理整体覆盖(不保留历史)
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ProductRiskSummary - 商品风险摘要
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRiskSummary {
    pub product_id: String,           // 商品ID
    pub risk_score: f64,              // 综合风险分 (0-1)
    pub top_issue_descriptor: String, // 影响度最高的问题
    pub computed_at: NaiveDateTime,   // 计算时间
}

impl ProductRiskSummary {
    /// 展示用风险分 (保留 3 位小数)
    pub fn display_score(&self) -> f64 {
        (self.risk_score * 1000.0).round() / 1000.0
    }
}
