// ==========================================
// FitLoop - 应用 API
// ==========================================
// 职责: 上传 / 处理 / 查询 / 导出
// 红线: 单个商品落库失败只记录,不影响其他商品
// 红线: 每个商品的派生数据整体替换 (被跳过的商品清空旧结果)
// ==========================================

use crate::api::dto::{
    ProcessSummary, ProductDetailView, ProductSummaryView, SkippedProduct, StatusView,
    UploadSummary, DISPLAY_TIME_FORMAT,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::export::render_markdown;
use crate::config::{ConfigManager, PipelineConfig};
use crate::engine::{FeedbackPipeline, ProductOutcome};
use crate::importer::FeedbackImporter;
use crate::llm::TextGenerator;
use crate::repository::{FeedbackRepository, IssueRepository, ProductRepository};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{error, info, instrument};

// ==========================================
// FitLoopApi - 应用 API
// ==========================================
pub struct FitLoopApi {
    db_path: String,
    feedback_repo: Arc<FeedbackRepository>,
    issue_repo: Arc<IssueRepository>,
    product_repo: Arc<ProductRepository>,
    config_manager: Arc<ConfigManager>,
    importer: FeedbackImporter,
    backend: Option<Arc<dyn TextGenerator>>,
    base_config: PipelineConfig,
}

impl FitLoopApi {
    /// 创建 API 实例
    ///
    /// # 参数
    /// - db_path: 数据库路径 (仅用于状态展示)
    /// - conn: 已初始化 schema 的共享连接
    /// - backend: 生成式后端 (None 表示规则提取 + 模板文案)
    /// - base_config: 管道基础参数 (config_kv 覆写叠加其上)
    pub fn new(
        db_path: &str,
        conn: Arc<Mutex<Connection>>,
        backend: Option<Arc<dyn TextGenerator>>,
        base_config: PipelineConfig,
    ) -> Self {
        let feedback_repo = Arc::new(FeedbackRepository::from_connection(conn.clone()));
        Self {
            db_path: db_path.to_string(),
            importer: FeedbackImporter::new(feedback_repo.clone()),
            feedback_repo,
            issue_repo: Arc::new(IssueRepository::from_connection(conn.clone())),
            product_repo: Arc::new(ProductRepository::from_connection(conn.clone())),
            config_manager: Arc::new(ConfigManager::from_connection(conn)),
            backend,
            base_config,
        }
    }

    pub fn config_manager(&self) -> &ConfigManager {
        &self.config_manager
    }

    pub fn generative_enabled(&self) -> bool {
        self.backend.is_some()
    }

    // ==========================================
    // 上传
    // ==========================================

    /// 上传评价与退货 CSV (整体替换已有数据)
    pub fn upload(&self, reviews_path: &Path, returns_path: &Path) -> ApiResult<UploadSummary> {
        let summary = self.importer.import_files(reviews_path, returns_path)?;
        Ok(summary.into())
    }

    // ==========================================
    // 处理
    // ==========================================

    /// 处理全部反馈 (以当前时间为运行时间)
    pub async fn process(&self) -> ApiResult<ProcessSummary> {
        self.process_at(chrono::Local::now().naive_local()).await
    }

    /// 处理全部反馈并落库
    ///
    /// # 参数
    /// - run_at: 运行时间 (写入摘要与文案)
    #[instrument(skip(self))]
    pub async fn process_at(&self, run_at: NaiveDateTime) -> ApiResult<ProcessSummary> {
        let config = self.config_manager.load_pipeline_config(self.base_config.clone())?;
        let pipeline = FeedbackPipeline::new(config, self.backend.clone());

        let feedback = self.feedback_repo.load_grouped()?;
        let result = pipeline.process_batch_at(&feedback, run_at).await?;

        let mut skipped = Vec::new();
        let mut failed = Vec::new();
        let mut processed = 0;

        for outcome in &result.outcomes {
            let persisted = match outcome {
                ProductOutcome::Processed(output) => self
                    .product_repo
                    .replace_product_outputs(&output.summary, &output.issues, &output.copy)
                    .map(|_| processed += 1),
                ProductOutcome::Skipped { product_id, reason } => {
                    skipped.push(SkippedProduct {
                        product_id: product_id.clone(),
                        reason: reason.to_string(),
                    });
                    self.product_repo.clear_product_outputs(product_id)
                }
            };

            if let Err(e) = persisted {
                error!(product_id = %outcome.product_id(), error = %e, "商品结果落库失败");
                failed.push(outcome.product_id().to_string());
            }
        }

        info!(
            run_id = %result.run_id,
            processed,
            skipped = skipped.len(),
            failed = failed.len(),
            "处理结果已落库"
        );

        Ok(ProcessSummary {
            run_id: result.run_id,
            run_at: run_at.format(DISPLAY_TIME_FORMAT).to_string(),
            generative_enabled: pipeline.generative_enabled(),
            products_processed: processed,
            products_skipped: skipped.len(),
            skipped,
            failed,
        })
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 商品列表 (风险分降序)
    pub fn list_products(&self) -> ApiResult<Vec<ProductSummaryView>> {
        let summaries = self.product_repo.list_summaries()?;
        Ok(summaries.iter().map(ProductSummaryView::from).collect())
    }

    /// 商品详情
    pub fn get_product_detail(&self, product_id: &str) -> ApiResult<ProductDetailView> {
        let product_id = product_id.trim();
        if product_id.is_empty() {
            return Err(ApiError::InvalidInput("product_id 不能为空".to_string()));
        }

        let detail = self
            .product_repo
            .find_detail(product_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Product(id={})不存在", product_id)))?;

        Ok(ProductDetailView::from(&detail))
    }

    /// 导出 Markdown (以当前时间为生成时间)
    pub fn export_markdown(&self, product_id: &str) -> ApiResult<String> {
        self.export_markdown_at(product_id, chrono::Local::now().naive_local())
    }

    pub fn export_markdown_at(&self, product_id: &str, generated_at: NaiveDateTime) -> ApiResult<String> {
        let detail = self.get_product_detail(product_id)?;
        Ok(render_markdown(&detail, generated_at))
    }

    /// 数据概况
    pub fn status(&self) -> ApiResult<StatusView> {
        let counts = self.feedback_repo.counts()?;
        Ok(StatusView {
            db_path: self.db_path.clone(),
            reviews: counts.reviews,
            returns: counts.returns,
            products: self.product_repo.count()?,
            issues: self.issue_repo.count_all()?,
            generative_enabled: self.generative_enabled(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::domain::feedback::{ReturnRecord, ReviewRecord};
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 6, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn api() -> FitLoopApi {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        FitLoopApi::new(":memory:", Arc::new(Mutex::new(conn)), None, PipelineConfig::default())
    }

    fn review(pid: &str, text: &str) -> ReviewRecord {
        ReviewRecord {
            product_id: pid.to_string(),
            review_text: text.to_string(),
            rating: 3,
            date: "2026-05-01".to_string(),
        }
    }

    fn ret(pid: &str, text: &str) -> ReturnRecord {
        ReturnRecord {
            product_id: pid.to_string(),
            return_reason_text: text.to_string(),
            condition_flag: "unworn".to_string(),
            date: "2026-05-02".to_string(),
        }
    }

    #[tokio::test]
    async fn test_process_without_feedback_is_invalid() {
        let err = api().process_at(ts()).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_process_and_query() {
        let api = api();
        api.feedback_repo
            .replace_all(
                &[
                    review("P1", "Too tight"),
                    review("P1", "tight in the waist"),
                    review("P2", "tight"),
                ],
                &[ret("P1", "shrunk after washing")],
            )
            .unwrap();

        let summary = api.process_at(ts()).await.unwrap();

        assert_eq!(summary.products_processed, 1);
        assert_eq!(summary.products_skipped, 1);
        assert_eq!(summary.skipped[0].product_id, "P2");
        assert!(summary.failed.is_empty());

        let products = api.list_products().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].product_id, "P1");

        let detail = api.get_product_detail("P1").unwrap();
        assert!(!detail.generated_copy.size_guidance.is_empty());
        assert!(matches!(
            api.get_product_detail("P2").unwrap_err(),
            ApiError::NotFound(_)
        ));

        let status = api.status().unwrap();
        assert_eq!(status.reviews, 3);
        assert_eq!(status.products, 1);
        assert!(!status.generative_enabled);
    }

    #[test]
    fn test_get_product_detail_rejects_blank_id() {
        assert!(matches!(
            api().get_product_detail("  ").unwrap_err(),
            ApiError::InvalidInput(_)
        ));
    }
}
