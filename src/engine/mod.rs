// ==========================================
// FitLoop - 引擎层
// ==========================================
// 职责: 反馈文本 -> 问题 -> 聚合 -> 风险分 -> 文案
// 红线: Engine 不拼 SQL, 不做持久化
// 红线: 生成式路径的任何失败都落到确定性兜底
// ==========================================

pub mod aggregator;
pub mod copy_generator;
pub mod error;
pub mod generative_extractor;
pub mod orchestrator;
pub mod prompts;
pub mod risk;
pub mod rule_extractor;
pub mod text_normalizer;

// 重导出核心引擎
pub use aggregator::IssueAggregator;
pub use copy_generator::{template_copy, CopyGenerator};
pub use error::{ExtractError, PipelineError};
pub use generative_extractor::{parse_issue_array, Extraction, ExtractionSource, GenerativeExtractor};
pub use orchestrator::{
    FeedbackPipeline, ProcessResult, ProductOutcome, ProductOutput, SkipReason,
};
pub use risk::{RiskScore, RiskScorer};
pub use rule_extractor::RuleBasedExtractor;
pub use text_normalizer::TextNormalizer;
