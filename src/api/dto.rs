// ==========================================
// FitLoop - API 输出视图
// ==========================================
// 红线: 风险分保留 3 位小数,严重度 2 位,频率 1 位
// ==========================================

use crate::domain::issue::AggregatedIssue;
use crate::domain::product::ProductDetail;
use crate::domain::risk::ProductRiskSummary;
use crate::importer::ImportSummary;
use serde::Serialize;

/// 展示时间格式 (ISO-8601,无时区)
pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadSummary {
    pub batch_id: String,
    pub reviews_uploaded: usize,
    pub returns_uploaded: usize,
    pub rows_skipped: usize,
}

impl From<ImportSummary> for UploadSummary {
    fn from(summary: ImportSummary) -> Self {
        Self {
            batch_id: summary.batch_id,
            reviews_uploaded: summary.reviews_imported,
            returns_uploaded: summary.returns_imported,
            rows_skipped: summary.rows_skipped,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedProduct {
    pub product_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessSummary {
    pub run_id: String,
    pub run_at: String,
    pub generative_enabled: bool,
    pub products_processed: usize,
    pub products_skipped: usize,
    pub skipped: Vec<SkippedProduct>,
    /// 落库失败的商品 (其余商品不受影响)
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductSummaryView {
    pub product_id: String,
    pub risk_score: f64,
    pub top_issue_descriptor: String,
    pub updated_at: String,
}

impl From<&ProductRiskSummary> for ProductSummaryView {
    fn from(summary: &ProductRiskSummary) -> Self {
        Self {
            product_id: summary.product_id.clone(),
            risk_score: summary.display_score(),
            top_issue_descriptor: summary.top_issue_descriptor.clone(),
            updated_at: summary.computed_at.format(DISPLAY_TIME_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueView {
    pub issue_category: String,
    pub body_area: String,
    pub descriptor: String,
    pub severity: f64,
    pub frequency_pct: f64,
}

impl From<&AggregatedIssue> for IssueView {
    fn from(issue: &AggregatedIssue) -> Self {
        Self {
            issue_category: issue.issue_category.to_string(),
            body_area: issue.body_area.clone(),
            descriptor: issue.descriptor.clone(),
            severity: round_to(issue.severity, 2),
            frequency_pct: round_to(issue.frequency_pct, 1),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CopyView {
    pub size_guidance: String,
    pub care_tip: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductDetailView {
    pub product_id: String,
    pub risk_score: f64,
    pub top_issue_descriptor: String,
    pub updated_at: String,
    pub issues: Vec<IssueView>,
    pub generated_copy: CopyView,
}

impl From<&ProductDetail> for ProductDetailView {
    fn from(detail: &ProductDetail) -> Self {
        let summary = ProductSummaryView::from(&detail.summary);
        Self {
            product_id: summary.product_id,
            risk_score: summary.risk_score,
            top_issue_descriptor: summary.top_issue_descriptor,
            updated_at: summary.updated_at,
            issues: detail.issues.iter().map(IssueView::from).collect(),
            generated_copy: CopyView {
                size_guidance: detail.size_guidance().to_string(),
                care_tip: detail.care_tip().to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub db_path: String,
    pub reviews: usize,
    pub returns: usize,
    pub products: usize,
    pub issues: usize,
    pub generative_enabled: bool,
}
