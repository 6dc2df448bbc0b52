// ==========================================
// FitLoop - 核心库
// ==========================================
// 职责: 商品评价/退货原因 -> 版型与护理问题 -> 风险分 -> 导购文案
// 技术栈: Rust + SQLite + 可选生成式后端
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 提取 / 聚合 / 评分 / 文案
pub mod engine;

// 生成式后端
pub mod llm;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::IssueCategory;

// 领域实体
pub use domain::{
    AdvisoryCopy, AggregatedIssue, FeedbackByProduct, ProductDetail, ProductRiskSummary,
    RawIssue, ReturnRecord, ReviewRecord,
};

// 引擎
pub use engine::{
    CopyGenerator, FeedbackPipeline, GenerativeExtractor, IssueAggregator, ProcessResult,
    RiskScorer, RuleBasedExtractor, TextNormalizer,
};

// API
pub use api::FitLoopApi;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "FitLoop";
