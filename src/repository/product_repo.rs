// ==========================================
// FitLoop - 商品派生数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 单个商品的 issues / products / generated_copy 同事务整体替换
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::copy::AdvisoryCopy;
use crate::domain::issue::AggregatedIssue;
use crate::domain::product::ProductDetail;
use crate::domain::risk::ProductRiskSummary;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::issue_repo::{delete_issues, insert_issues, query_issues};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// 时间戳存储格式
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// ProductRepository - 商品派生数据仓储
// ==========================================
/// 职责: products / generated_copy 表,以及商品级派生数据的原子替换
pub struct ProductRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductRepository {
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

    /// 替换单个商品的派生数据
    ///
    /// # 参数
    /// - summary: 风险摘要
    /// - issues: 聚合问题
    /// - copy: 导购文案
    ///
    /// # 说明
    /// - 先删除该商品已有的 issues / products / generated_copy,再写入
    /// - 同一事务内完成,失败则该商品保持原状
    pub fn replace_product_outputs(
        &self,
        summary: &ProductRiskSummary,
        issues: &[AggregatedIssue],
        copy: &AdvisoryCopy,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        delete_outputs(&tx, &summary.product_id)?;
        insert_issues(&tx, issues)?;

        tx.execute(
            r#"
            INSERT INTO products (product_id, risk_score, top_issue_descriptor, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                summary.product_id,
                summary.risk_score,
                summary.top_issue_descriptor,
                summary.computed_at.format(TIMESTAMP_FORMAT).to_string(),
            ],
        )?;

        tx.execute(
            r#"
            INSERT INTO generated_copy (product_id, size_guidance, care_tip, generated_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                copy.product_id,
                copy.size_guidance,
                copy.care_tip,
                copy.generated_at.format(TIMESTAMP_FORMAT).to_string(),
            ],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 清空单个商品的派生数据 (本次处理被跳过的商品)
    pub fn clear_product_outputs(&self, product_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        delete_outputs(&tx, product_id)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 查询全部商品摘要 (风险分降序,同分按商品ID升序)
    pub fn list_summaries(&self) -> RepositoryResult<Vec<ProductRiskSummary>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT product_id, risk_score, top_issue_descriptor, updated_at
            FROM products
            ORDER BY risk_score DESC, product_id ASC
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(product_id, risk_score, top_issue_descriptor, updated_at)| {
                Ok(ProductRiskSummary {
                    product_id,
                    risk_score,
                    top_issue_descriptor,
                    computed_at: parse_timestamp("updated_at", &updated_at)?,
                })
            })
            .collect()
    }

    /// 按商品ID查询文案
    pub fn find_copy(&self, product_id: &str) -> RepositoryResult<Option<AdvisoryCopy>> {
        let conn = self.get_conn()?;
        query_copy(&conn, product_id)
    }

    /// 查询商品详情 (摘要 + 问题 + 文案)
    ///
    /// # 返回
    /// - Ok(None): 商品没有摘要 (未处理或被跳过)
    pub fn find_detail(&self, product_id: &str) -> RepositoryResult<Option<ProductDetail>> {
        let conn = self.get_conn()?;

        let summary = match query_summary(&conn, product_id)? {
            Some(summary) => summary,
            None => return Ok(None),
        };
        let issues = query_issues(&conn, product_id)?;
        let copy = query_copy(&conn, product_id)?;

        Ok(Some(ProductDetail {
            summary,
            issues,
            copy,
        }))
    }

    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn delete_outputs(conn: &Connection, product_id: &str) -> RepositoryResult<()> {
    delete_issues(conn, product_id)?;
    conn.execute("DELETE FROM products WHERE product_id = ?1", params![product_id])?;
    conn.execute(
        "DELETE FROM generated_copy WHERE product_id = ?1",
        params![product_id],
    )?;
    Ok(())
}

fn query_summary(conn: &Connection, product_id: &str) -> RepositoryResult<Option<ProductRiskSummary>> {
    let row = conn
        .query_row(
            r#"
            SELECT product_id, risk_score, top_issue_descriptor, updated_at
            FROM products
            WHERE product_id = ?1
            "#,
            params![product_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    row.map(|(product_id, risk_score, top_issue_descriptor, updated_at)| {
        Ok(ProductRiskSummary {
            product_id,
            risk_score,
            top_issue_descriptor,
            computed_at: parse_timestamp("updated_at", &updated_at)?,
        })
    })
    .transpose()
}

fn query_copy(conn: &Connection, product_id: &str) -> RepositoryResult<Option<AdvisoryCopy>> {
    let row = conn
        .query_row(
            r#"
            SELECT product_id, size_guidance, care_tip, generated_at
            FROM generated_copy
            WHERE product_id = ?1
            "#,
            params![product_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    row.map(|(product_id, size_guidance, care_tip, generated_at)| {
        Ok(AdvisoryCopy {
            product_id,
            size_guidance,
            care_tip,
            generated_at: parse_timestamp("generated_at", &generated_at)?,
        })
    })
    .transpose()
}

fn parse_timestamp(field: &str, value: &str) -> RepositoryResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|e| {
        RepositoryError::FieldValueError {
            field: field.to_string(),
            message: format!("{} ({})", e, value),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::domain::types::IssueCategory;
    use chrono::NaiveDate;

    fn setup() -> ProductRepository {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        ProductRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn ts(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 14)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn summary(pid: &str, score: f64, at: NaiveDateTime) -> ProductRiskSummary {
        ProductRiskSummary {
            product_id: pid.to_string(),
            risk_score: score,
            top_issue_descriptor: "runs_small".to_string(),
            computed_at: at,
        }
    }

    fn issue(pid: &str, descriptor: &str) -> AggregatedIssue {
        AggregatedIssue {
            product_id: pid.to_string(),
            issue_category: IssueCategory::Fit,
            body_area: "waist".to_string(),
            descriptor: descriptor.to_string(),
            severity: 4.0,
            frequency_pct: 50.0,
        }
    }

    #[test]
    fn test_replace_product_outputs_round_trip() {
        let repo = setup();
        let copy = AdvisoryCopy::new("P1", "Size up.", "Cold wash.", ts(9));

        repo.replace_product_outputs(&summary("P1", 0.72, ts(9)), &[issue("P1", "runs_small")], &copy)
            .unwrap();

        let detail = repo.find_detail("P1").unwrap().unwrap();
        assert_eq!(detail.summary, summary("P1", 0.72, ts(9)));
        assert_eq!(detail.issues, vec![issue("P1", "runs_small")]);
        assert_eq!(detail.copy, Some(copy));
    }

    #[test]
    fn test_replace_product_outputs_replaces_prior_rows() {
        let repo = setup();
        let copy = AdvisoryCopy::new("P1", "a", "b", ts(9));

        repo.replace_product_outputs(
            &summary("P1", 0.5, ts(9)),
            &[issue("P1", "runs_small"), issue("P1", "runs_large")],
            &copy,
        )
        .unwrap();
        repo.replace_product_outputs(&summary("P1", 0.6, ts(10)), &[issue("P1", "runs_small")], &copy)
            .unwrap();

        let detail = repo.find_detail("P1").unwrap().unwrap();
        assert_eq!(detail.issues.len(), 1);
        assert_eq!(detail.summary.computed_at, ts(10));
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_list_summaries_ordered_by_risk() {
        let repo = setup();
        for (pid, score) in [("A", 0.2), ("B", 0.9), ("C", 0.5)] {
            repo.replace_product_outputs(
                &summary(pid, score, ts(9)),
                &[issue(pid, "runs_small")],
                &AdvisoryCopy::empty(pid, ts(9)),
            )
            .unwrap();
        }

        let ids: Vec<String> = repo
            .list_summaries()
            .unwrap()
            .into_iter()
            .map(|s| s.product_id)
            .collect();
        assert_eq!(ids, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_clear_product_outputs() {
        let repo = setup();
        repo.replace_product_outputs(
            &summary("P1", 0.5, ts(9)),
            &[issue("P1", "runs_small")],
            &AdvisoryCopy::empty("P1", ts(9)),
        )
        .unwrap();

        repo.clear_product_outputs("P1").unwrap();

        assert!(repo.find_detail("P1").unwrap().is_none());
        assert!(repo.find_copy("P1").unwrap().is_none());
    }
}
