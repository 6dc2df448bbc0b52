// ==========================================
// FitLoop - 处理管道编排器
// ==========================================
// 用途: 按商品串联 提取 -> 聚合 -> 评分 -> 文案
// 红线: 商品内各阶段严格顺序执行;商品之间并发,互不影响
// 红线: 单个商品失败只影响该商品,不中断批处理
// 红线: 时间戳由调用方注入,重复运行结果一致
// ==========================================

use crate::config::PipelineConfig;
use crate::domain::copy::AdvisoryCopy;
use crate::domain::feedback::FeedbackByProduct;
use crate::domain::issue::AggregatedIssue;
use crate::domain::risk::ProductRiskSummary;
use crate::engine::aggregator::IssueAggregator;
use crate::engine::copy_generator::CopyGenerator;
use crate::engine::error::PipelineError;
use crate::engine::generative_extractor::{Extraction, ExtractionSource, GenerativeExtractor};
use crate::engine::risk::RiskScorer;
use crate::engine::rule_extractor::RuleBasedExtractor;
use crate::llm::TextGenerator;
use chrono::NaiveDateTime;
use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

// ==========================================
// ProductOutput - 单个商品的派生结果
// ==========================================
#[derive(Debug, Clone)]
pub struct ProductOutput {
    pub summary: ProductRiskSummary,
    pub issues: Vec<AggregatedIssue>,
    pub copy: AdvisoryCopy,
    pub extraction_source: ExtractionSource,
}

impl ProductOutput {
    pub fn product_id(&self) -> &str {
        &self.summary.product_id
    }
}

/// 跳过原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 反馈条数不足
    InsufficientFeedback { count: usize, required: usize },
    /// 提取结果为空
    NoIssuesExtracted,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InsufficientFeedback { count, required } => {
                write!(f, "反馈条数不足 ({} < {})", count, required)
            }
            SkipReason::NoIssuesExtracted => write!(f, "未提取到问题"),
        }
    }
}

/// 单个商品的处理结果
#[derive(Debug, Clone)]
pub enum ProductOutcome {
    Processed(ProductOutput),
    Skipped { product_id: String, reason: SkipReason },
}

impl ProductOutcome {
    pub fn product_id(&self) -> &str {
        match self {
            ProductOutcome::Processed(output) => output.product_id(),
            ProductOutcome::Skipped { product_id, .. } => product_id,
        }
    }

    pub fn is_processed(&self) -> bool {
        matches!(self, ProductOutcome::Processed(_))
    }
}

// ==========================================
// ProcessResult - 批处理结果
// ==========================================
#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub run_id: String,
    pub run_at: NaiveDateTime,
    /// 按商品ID升序
    pub outcomes: Vec<ProductOutcome>,
}

impl ProcessResult {
    pub fn products_processed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_processed()).count()
    }

    pub fn products_skipped(&self) -> usize {
        self.outcomes.len() - self.products_processed()
    }

    pub fn outputs(&self) -> impl Iterator<Item = &ProductOutput> {
        self.outcomes.iter().filter_map(|o| match o {
            ProductOutcome::Processed(output) => Some(output),
            ProductOutcome::Skipped { .. } => None,
        })
    }
}

/// 问题提取路由: 生成式后端在构造时即已确定有无
enum IssueExtractor {
    RuleBased(RuleBasedExtractor),
    Generative(GenerativeExtractor),
}

impl IssueExtractor {
    async fn extract(&self, product_id: &str, texts: &[String]) -> Extraction {
        match self {
            IssueExtractor::RuleBased(extractor) => Extraction {
                issues: extractor.extract(product_id, texts),
                source: ExtractionSource::RuleBased,
            },
            IssueExtractor::Generative(extractor) => extractor.extract(product_id, texts).await,
        }
    }
}

// ==========================================
// FeedbackPipeline - 处理管道
// ==========================================
pub struct FeedbackPipeline {
    config: PipelineConfig,
    extractor: IssueExtractor,
    aggregator: IssueAggregator,
    scorer: RiskScorer,
    copy_generator: CopyGenerator,
}

impl FeedbackPipeline {
    /// 创建处理管道
    ///
    /// # 参数
    /// - config: 管道参数
    /// - backend: 生成式后端 (None 表示规则提取 + 模板文案)
    pub fn new(config: PipelineConfig, backend: Option<Arc<dyn TextGenerator>>) -> Self {
        let extractor = match &backend {
            Some(b) => IssueExtractor::Generative(GenerativeExtractor::new(b.clone(), &config)),
            None => IssueExtractor::RuleBased(RuleBasedExtractor::new()),
        };

        Self {
            copy_generator: CopyGenerator::new(backend, &config),
            extractor,
            aggregator: IssueAggregator::new(),
            scorer: RiskScorer::new(),
            config,
        }
    }

    /// 无生成式后端的管道
    pub fn rule_based(config: PipelineConfig) -> Self {
        Self::new(config, None)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn generative_enabled(&self) -> bool {
        matches!(self.extractor, IssueExtractor::Generative(_))
    }

    /// 批处理 (以当前时间为运行时间)
    pub async fn process_batch(
        &self,
        feedback: &FeedbackByProduct,
    ) -> Result<ProcessResult, PipelineError> {
        self.process_batch_at(feedback, chrono::Local::now().naive_local())
            .await
    }

    /// 批处理
    ///
    /// # 参数
    /// - feedback: 商品ID -> 反馈文本 (评价在前,退货原因在后)
    /// - run_at: 运行时间,写入摘要与文案
    ///
    /// # 返回
    /// - Ok(ProcessResult): 每个商品一个结果,按商品ID升序
    /// - Err(PipelineError::NoFeedback): 没有任何反馈
    pub async fn process_batch_at(
        &self,
        feedback: &FeedbackByProduct,
        run_at: NaiveDateTime,
    ) -> Result<ProcessResult, PipelineError> {
        let total_texts: usize = feedback.values().map(Vec::len).sum();
        if total_texts == 0 {
            error!("没有可处理的反馈数据");
            return Err(PipelineError::NoFeedback);
        }

        let run_id = Uuid::new_v4().to_string();
        info!(
            run_id = %run_id,
            products = feedback.len(),
            texts = total_texts,
            generative = self.generative_enabled(),
            "开始批处理"
        );

        let outcomes: Vec<ProductOutcome> = stream::iter(feedback.iter())
            .map(|(product_id, texts)| self.process_product(product_id, texts, run_at))
            .buffered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        let result = ProcessResult {
            run_id,
            run_at,
            outcomes,
        };

        info!(
            run_id = %result.run_id,
            processed = result.products_processed(),
            skipped = result.products_skipped(),
            "批处理完成"
        );

        Ok(result)
    }

    /// 处理单个商品
    ///
    /// 各阶段顺序执行: 提取 -> 聚合 -> 评分 -> 文案
    #[instrument(skip(self, texts), fields(texts = texts.len()))]
    pub async fn process_product(
        &self,
        product_id: &str,
        texts: &[String],
        run_at: NaiveDateTime,
    ) -> ProductOutcome {
        let required = self.config.min_feedback_texts;
        if texts.len() < required {
            info!(count = texts.len(), required, "反馈条数不足,跳过");
            return ProductOutcome::Skipped {
                product_id: product_id.to_string(),
                reason: SkipReason::InsufficientFeedback {
                    count: texts.len(),
                    required,
                },
            };
        }

        // 1. 提取
        let extraction = self.extractor.extract(product_id, texts).await;
        debug!(
            raw_issues = extraction.issues.len(),
            source = ?extraction.source,
            "提取完成"
        );

        // 2. 聚合
        let issues = self.aggregator.aggregate(product_id, &extraction.issues);

        // 3. 评分 (无问题则跳过)
        let summary = match self.scorer.summarize(product_id, &issues, run_at) {
            Some(summary) => summary,
            None => {
                info!("未提取到问题,跳过");
                return ProductOutcome::Skipped {
                    product_id: product_id.to_string(),
                    reason: SkipReason::NoIssuesExtracted,
                };
            }
        };

        // 4. 文案
        let copy = self.copy_generator.generate(product_id, &issues, run_at).await;

        info!(
            issues = issues.len(),
            risk_score = summary.risk_score,
            top_issue = %summary.top_issue_descriptor,
            "商品处理完成"
        );

        ProductOutcome::Processed(ProductOutput {
            summary,
            issues,
            copy,
            extraction_source: extraction.source,
        })
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::IssueCategory;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    fn feedback(entries: &[(&str, &[&str])]) -> FeedbackByProduct {
        entries
            .iter()
            .map(|(pid, texts)| {
                (
                    pid.to_string(),
                    texts.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_process_product_end_to_end() {
        let pipeline = FeedbackPipeline::rule_based(PipelineConfig::default());
        let texts: Vec<String> = [
            "Way too tight around the chest",
            "A bit tight but nice",
            "It shrunk after one wash",
            "Love the color",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let outcome = pipeline.process_product("P1", &texts, ts()).await;

        let output = match outcome {
            ProductOutcome::Processed(output) => output,
            other => panic!("unexpected outcome: {:?}", other),
        };
        let descriptors: Vec<(&str, IssueCategory)> = output
            .issues
            .iter()
            .map(|i| (i.descriptor.as_str(), i.issue_category))
            .collect();
        assert!(descriptors.contains(&("runs_small", IssueCategory::Fit)));
        assert!(descriptors.contains(&("shrink", IssueCategory::Care)));
        assert!((0.0..=1.0).contains(&output.summary.risk_score));
        assert!(!output.copy.size_guidance.is_empty());
        assert!(!output.copy.care_tip.is_empty());
        assert_eq!(output.extraction_source, ExtractionSource::RuleBased);
        assert_eq!(output.summary.computed_at, ts());
    }

    #[tokio::test]
    async fn test_process_product_insufficient_feedback() {
        let pipeline = FeedbackPipeline::rule_based(PipelineConfig::default());
        let texts = vec!["tight".to_string(), "tight".to_string()];

        let outcome = pipeline.process_product("P1", &texts, ts()).await;

        assert!(matches!(
            outcome,
            ProductOutcome::Skipped {
                reason: SkipReason::InsufficientFeedback { count: 2, required: 3 },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_process_product_no_issues() {
        let pipeline = FeedbackPipeline::rule_based(PipelineConfig::default());
        let texts = vec![
            "Great shirt".to_string(),
            "Perfect".to_string(),
            "Would buy again".to_string(),
        ];

        let outcome = pipeline.process_product("P1", &texts, ts()).await;

        assert!(matches!(
            outcome,
            ProductOutcome::Skipped {
                reason: SkipReason::NoIssuesExtracted,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_process_batch_keeps_product_order() {
        let pipeline = FeedbackPipeline::rule_based(PipelineConfig {
            max_concurrency: 2,
            ..PipelineConfig::default()
        });
        let input = feedback(&[
            ("C", &["tight", "tight", "tight"]),
            ("A", &["loose", "baggy", "fine"]),
            ("B", &["tight"]),
        ]);

        let result = pipeline.process_batch_at(&input, ts()).await.unwrap();

        let ids: Vec<&str> = result.outcomes.iter().map(|o| o.product_id()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(result.products_processed(), 2);
        assert_eq!(result.products_skipped(), 1);
    }

    #[tokio::test]
    async fn test_process_batch_no_feedback() {
        let pipeline = FeedbackPipeline::rule_based(PipelineConfig::default());

        let err = pipeline
            .process_batch_at(&FeedbackByProduct::new(), ts())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoFeedback));
    }

    #[tokio::test]
    async fn test_process_batch_is_idempotent() {
        let pipeline = FeedbackPipeline::rule_based(PipelineConfig::default());
        let input = feedback(&[("P1", &["too tight", "faded fast", "runs small", "ok"])]);

        let first = pipeline.process_batch_at(&input, ts()).await.unwrap();
        let second = pipeline.process_batch_at(&input, ts()).await.unwrap();

        let a: Vec<&ProductOutput> = first.outputs().collect();
        let b: Vec<&ProductOutput> = second.outputs().collect();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].issues, b[0].issues);
        assert_eq!(a[0].summary, b[0].summary);
        assert_eq!(a[0].copy, b[0].copy);
    }
}
