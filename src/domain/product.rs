// ==========================================
// FitLoop - 商品详情读模型
// ==========================================
// 用途: CLI 展示 / Markdown 导出
// ==========================================

use crate::domain::copy::AdvisoryCopy;
use crate::domain::issue::AggregatedIssue;
use crate::domain::risk::ProductRiskSummary;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDetail {
    pub summary: ProductRiskSummary,
    pub issues: Vec<AggregatedIssue>,
    pub copy: Option<AdvisoryCopy>,
}

impl ProductDetail {
    pub fn size_guidance(&self) -> &str {
        self.copy.as_ref().map(|c| c.size_guidance.as_str()).unwrap_or("")
    }

    pub fn care_tip(&self) -> &str {
        self.copy.as_ref().map(|c| c.care_tip.as_str()).unwrap_or("")
    }
}
