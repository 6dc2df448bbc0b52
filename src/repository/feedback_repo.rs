// ==========================================
// FitLoop - 反馈数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 上传为整体覆盖,同时清空所有派生数据
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::feedback::{group_feedback, FeedbackByProduct, ReturnRecord, ReviewRecord};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

/// 反馈数据条数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackCounts {
    pub reviews: usize,
    pub returns: usize,
}

// ==========================================
// FeedbackRepository - 反馈数据仓储
// ==========================================
/// 职责: 管理 reviews / returns 表
pub struct FeedbackRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FeedbackRepository {
    /// 创建新的 FeedbackRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 整体替换反馈数据
    ///
    /// # 说明
    /// - 清空 reviews / returns 以及 issues / products / generated_copy
    /// - 在同一事务内完成,失败则全部回滚
    ///
    /// # 返回
    /// - Ok(FeedbackCounts): 写入的评价/退货条数
    pub fn replace_all(
        &self,
        reviews: &[ReviewRecord],
        returns: &[ReturnRecord],
    ) -> RepositoryResult<FeedbackCounts> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute_batch(
            r#"
            DELETE FROM reviews;
            DELETE FROM returns;
            DELETE FROM issues;
            DELETE FROM products;
            DELETE FROM generated_copy;
            "#,
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO reviews (product_id, review_text, rating, date) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for review in reviews {
                stmt.execute(params![
                    review.product_id,
                    review.review_text,
                    review.rating,
                    review.date,
                ])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO returns (product_id, return_reason_text, condition_flag, date) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for ret in returns {
                stmt.execute(params![
                    ret.product_id,
                    ret.return_reason_text,
                    ret.condition_flag,
                    ret.date,
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(FeedbackCounts {
            reviews: reviews.len(),
            returns: returns.len(),
        })
    }

    /// 查询全部评价 (按插入顺序)
    pub fn list_reviews(&self) -> RepositoryResult<Vec<ReviewRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT product_id, review_text, rating, date FROM reviews ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ReviewRecord {
                    product_id: row.get(0)?,
                    review_text: row.get(1)?,
                    rating: row.get(2)?,
                    date: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 查询全部退货记录 (按插入顺序)
    pub fn list_returns(&self) -> RepositoryResult<Vec<ReturnRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT product_id, return_reason_text, condition_flag, date FROM returns ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ReturnRecord {
                    product_id: row.get(0)?,
                    return_reason_text: row.get(1)?,
                    condition_flag: row.get(2)?,
                    date: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 按商品分组加载反馈文本 (评价在前,退货在后)
    pub fn load_grouped(&self) -> RepositoryResult<FeedbackByProduct> {
        let reviews = self.list_reviews()?;
        let returns = self.list_returns()?;
        Ok(group_feedback(&reviews, &returns))
    }

    pub fn counts(&self) -> RepositoryResult<FeedbackCounts> {
        let conn = self.get_conn()?;
        let reviews: i64 = conn.query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))?;
        let returns: i64 = conn.query_row("SELECT COUNT(*) FROM returns", [], |row| row.get(0))?;
        Ok(FeedbackCounts {
            reviews: reviews as usize,
            returns: returns as usize,
        })
    }
}
