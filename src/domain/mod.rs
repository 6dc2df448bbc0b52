// ==========================================
// FitLoop - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod copy;
pub mod feedback;
pub mod issue;
pub mod product;
pub mod risk;
pub mod types;

// 重导出核心类型
pub use copy::AdvisoryCopy;
pub use feedback::{group_feedback, FeedbackByProduct, ReturnRecord, ReviewRecord};
pub use issue::{AggregatedIssue, RawIssue};
pub use product::ProductDetail;
pub use risk::ProductRiskSummary;
pub use types::IssueCategory;
