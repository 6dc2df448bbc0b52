// ==========================================
// FitLoop - 导入层
// ==========================================
// 职责: 外部反馈文件导入
// 支持: CSV
// ==========================================

pub mod data_cleaner;
pub mod error;
pub mod feedback_importer;
pub mod file_parser;

// 重导出核心类型
pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult};
pub use feedback_importer::{FeedbackImporter, ImportSummary, RETURN_COLUMNS, REVIEW_COLUMNS};
pub use file_parser::{CsvParser, FileParser, RawRecord};
