// ==========================================
// FitLoop - 反馈数据导入器
// ==========================================
// 职责: 评价 CSV + 退货 CSV -> reviews / returns 表
// 流程: 解析 → 列校验 → 清洗 → 整体替换落库
// 红线: 两个文件都校验通过后才写库;写库为整体覆盖
// ==========================================

use crate::domain::feedback::{ReturnRecord, ReviewRecord, DEFAULT_RATING};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{CsvParser, FileParser, RawRecord};
use crate::repository::FeedbackRepository;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// 评价文件必需列
pub const REVIEW_COLUMNS: &[&str] = &["product_id", "review_text", "rating", "date"];

/// 退货文件必需列
pub const RETURN_COLUMNS: &[&str] = &["product_id", "return_reason_text", "condition_flag", "date"];

/// 导入结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub batch_id: String,
    pub reviews_imported: usize,
    pub returns_imported: usize,
    /// product_id 为空被跳过的行数
    pub rows_skipped: usize,
    pub elapsed_ms: u64,
}

// ==========================================
// FeedbackImporter - 反馈数据导入器
// ==========================================
pub struct FeedbackImporter {
    repo: Arc<FeedbackRepository>,
    file_parser: Box<dyn FileParser>,
    cleaner: DataCleaner,
}

impl FeedbackImporter {
    /// 创建导入器 (CSV 解析)
    pub fn new(repo: Arc<FeedbackRepository>) -> Self {
        Self::with_parser(repo, Box::new(CsvParser))
    }

    pub fn with_parser(repo: Arc<FeedbackRepository>, file_parser: Box<dyn FileParser>) -> Self {
        Self {
            repo,
            file_parser,
            cleaner: DataCleaner,
        }
    }

    /// 导入评价与退货文件
    ///
    /// # 返回
    /// - Ok(ImportSummary): 导入条数
    /// - Err(ImportError): 文件缺失 / 空文件 / 缺列 / 写库失败
    #[instrument(skip(self, reviews_path, returns_path), fields(batch_id))]
    pub fn import_files(
        &self,
        reviews_path: &Path,
        returns_path: &Path,
    ) -> ImportResult<ImportSummary> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());

        info!(
            reviews = %reviews_path.display(),
            returns = %returns_path.display(),
            "开始导入反馈数据"
        );

        // 1. 解析 + 校验
        let (reviews, skipped_reviews) = self.parse_reviews(reviews_path)?;
        let (returns, skipped_returns) = self.parse_returns(returns_path)?;

        // 2. 落库
        let counts = self.repo.replace_all(&reviews, &returns)?;

        let summary = ImportSummary {
            batch_id,
            reviews_imported: counts.reviews,
            returns_imported: counts.returns,
            rows_skipped: skipped_reviews + skipped_returns,
            elapsed_ms: start_time.elapsed().as_millis() as u64,
        };

        info!(
            reviews = summary.reviews_imported,
            returns = summary.returns_imported,
            skipped = summary.rows_skipped,
            elapsed_ms = summary.elapsed_ms,
            "反馈数据导入完成"
        );

        Ok(summary)
    }

    /// 解析评价文件
    ///
    /// # 返回
    /// - (记录, 跳过行数)
    pub fn parse_reviews(&self, path: &Path) -> ImportResult<(Vec<ReviewRecord>, usize)> {
        let records = self.load_validated(path, "Reviews", REVIEW_COLUMNS)?;

        let mut skipped = 0;
        let mut reviews = Vec::with_capacity(records.len());
        for record in &records {
            let Some(product_id) = self.product_id(record) else {
                skipped += 1;
                continue;
            };
            reviews.push(ReviewRecord {
                product_id,
                review_text: self.cleaner.text_field(record, "review_text"),
                rating: self
                    .cleaner
                    .safe_int(record.get("rating").map(String::as_str), DEFAULT_RATING),
                date: self.cleaner.text_field(record, "date"),
            });
        }

        Ok((reviews, skipped))
    }

    /// 解析退货文件
    pub fn parse_returns(&self, path: &Path) -> ImportResult<(Vec<ReturnRecord>, usize)> {
        let records = self.load_validated(path, "Returns", RETURN_COLUMNS)?;

        let mut skipped = 0;
        let mut returns = Vec::with_capacity(records.len());
        for record in &records {
            let Some(product_id) = self.product_id(record) else {
                skipped += 1;
                continue;
            };
            returns.push(ReturnRecord {
                product_id,
                return_reason_text: self.cleaner.text_field(record, "return_reason_text"),
                condition_flag: self.cleaner.text_field(record, "condition_flag"),
                date: self.cleaner.text_field(record, "date"),
            });
        }

        Ok((returns, skipped))
    }

    fn load_validated(
        &self,
        path: &Path,
        label: &str,
        required: &[&str],
    ) -> ImportResult<Vec<RawRecord>> {
        let records = self.file_parser.parse_to_raw_records(path)?;
        validate_columns(label, &records, required)?;
        Ok(records)
    }

    fn product_id(&self, record: &RawRecord) -> Option<String> {
        let product_id = self
            .cleaner
            .normalize_null(record.get("product_id").map(String::as_str));
        if product_id.is_none() {
            warn!("跳过 product_id 为空的行");
        }
        product_id
    }
}

/// 校验非空与必需列 (以首行的列集合为准)
pub fn validate_columns(label: &str, records: &[RawRecord], required: &[&str]) -> ImportResult<()> {
    let first = records
        .first()
        .ok_or_else(|| ImportError::EmptyFile(label.to_string()))?;

    let missing: Vec<String> = required
        .iter()
        .filter(|col| !first.contains_key(**col))
        .map(|col| col.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(ImportError::MissingColumns {
            file: label.to_string(),
            columns: missing,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use rusqlite::Connection;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    fn repo() -> Arc<FeedbackRepository> {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        Arc::new(FeedbackRepository::from_connection(Arc::new(Mutex::new(conn))))
    }

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_import_files_success() {
        let repo = repo();
        let importer = FeedbackImporter::new(repo.clone());
        let reviews = csv_file(
            "product_id,review_text,rating,date\nP1,Too tight,abc,2026-01-01\nP1,Nice,5,2026-01-02\n,orphan,4,2026-01-03\n",
        );
        let returns = csv_file(
            "product_id,return_reason_text,condition_flag,date\nP1,Shrunk after wash,used,2026-01-05\n",
        );

        let summary = importer.import_files(reviews.path(), returns.path()).unwrap();

        assert_eq!(summary.reviews_imported, 2);
        assert_eq!(summary.returns_imported, 1);
        assert_eq!(summary.rows_skipped, 1);

        let stored = repo.list_reviews().unwrap();
        assert_eq!(stored[0].rating, DEFAULT_RATING);
        assert_eq!(stored[1].rating, 5);
    }

    #[test]
    fn test_import_missing_columns() {
        let importer = FeedbackImporter::new(repo());
        let reviews = csv_file("product_id,text\nP1,Too tight\n");
        let returns = csv_file("product_id,return_reason_text,condition_flag,date\nP1,x,y,z\n");

        let err = importer
            .import_files(reviews.path(), returns.path())
            .unwrap_err();

        match err {
            ImportError::MissingColumns { file, columns } => {
                assert_eq!(file, "Reviews");
                assert_eq!(columns, vec!["review_text", "rating", "date"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_import_empty_file_leaves_data_untouched() {
        let repo = repo();
        let importer = FeedbackImporter::new(repo.clone());
        let reviews = csv_file("product_id,review_text,rating,date\nP1,Too tight,2,2026-01-01\n");
        let returns = csv_file("product_id,return_reason_text,condition_flag,date\nP1,x,y,z\n");
        importer.import_files(reviews.path(), returns.path()).unwrap();

        let empty_returns = csv_file("product_id,return_reason_text,condition_flag,date\n");
        let err = importer
            .import_files(reviews.path(), empty_returns.path())
            .unwrap_err();

        assert!(matches!(err, ImportError::EmptyFile(ref label) if label == "Returns"));
        assert_eq!(repo.counts().unwrap().returns, 1);
    }
}
