// ==========================================
// FitLoop - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行调用
// ==========================================

pub mod dto;
pub mod error;
pub mod export;
pub mod fitloop_api;

// 重导出核心类型
pub use dto::{
    CopyView, IssueView, ProcessSummary, ProductDetailView, ProductSummaryView, SkippedProduct,
    StatusView, UploadSummary,
};
pub use error::{ApiError, ApiResult};
pub use export::{export_file_name, render_markdown};
pub use fitloop_api::FitLoopApi;
