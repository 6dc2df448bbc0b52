// ==========================================
// FitLoop - 聚合问题仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: (product_id, descriptor, issue_category, body_area) 唯一
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::issue::AggregatedIssue;
use crate::domain::types::IssueCategory;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// IssueRepository - 聚合问题仓储
// ==========================================
/// 职责: issues 表只读查询
/// 写入经由 ProductRepository::replace_product_outputs,与摘要/文案同事务
pub struct IssueRepository {
    conn: Arc<Mutex<Connection>>,
}

impl IssueRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询商品的聚合问题 (按写入顺序,即聚合顺序)
    pub fn find_by_product(&self, product_id: &str) -> RepositoryResult<Vec<AggregatedIssue>> {
        let conn = self.get_conn()?;
        query_issues(&conn, product_id)
    }

    /// 问题总数
    pub fn count_all(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

// ==========================================
// 连接级操作 (供同事务复用)
// ==========================================

pub(crate) fn query_issues(
    conn: &Connection,
    product_id: &str,
) -> RepositoryResult<Vec<AggregatedIssue>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT product_id, issue_category, body_area, descriptor, severity, frequency_pct
        FROM issues
        WHERE product_id = ?1
        ORDER BY id
        "#,
    )?;

    let rows = stmt
        .query_map(params![product_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(
            |(product_id, category, body_area, descriptor, severity, frequency_pct)| {
                let issue_category = IssueCategory::from_str(&category).ok_or_else(|| {
                    RepositoryError::FieldValueError {
                        field: "issue_category".to_string(),
                        message: format!("未知问题类别: {}", category),
                    }
                })?;
                Ok(AggregatedIssue {
                    product_id,
                    issue_category,
                    body_area,
                    descriptor,
                    severity,
                    frequency_pct,
                })
            },
        )
        .collect()
}

pub(crate) fn insert_issues(conn: &Connection, issues: &[AggregatedIssue]) -> RepositoryResult<usize> {
    let mut stmt = conn.prepare(
        r#"
        INSERT INTO issues (
            product_id, issue_category, body_area, descriptor, severity, frequency_pct
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )?;

    for issue in issues {
        stmt.execute(params![
            issue.product_id,
            issue.issue_category.to_db_str(),
            issue.body_area,
            issue.descriptor,
            issue.severity,
            issue.frequency_pct,
        ])?;
    }

    Ok(issues.len())
}

pub(crate) fn delete_issues(conn: &Connection, product_id: &str) -> RepositoryResult<usize> {
    Ok(conn.execute("DELETE FROM issues WHERE product_id = ?1", params![product_id])?)
}
