// ==========================================
// FitLoop - 配置管理器
// ==========================================
// 职责: config_kv 表读写,覆写管道参数
// 存储: config_kv 表 (key-value, scope_id='global')
// ==========================================

use crate::config::app_config::PipelineConfig;
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值 (upsert)
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 列出全部 global 配置 (按 key 排序)
    pub fn list_configs(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut map = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            map.insert(key, value);
        }
        Ok(map)
    }

    /// 在基础参数上叠加 config_kv 覆写
    ///
    /// 值缺失或格式错误时保留基础值 (格式错误记 warn)
    pub fn load_pipeline_config(&self, base: PipelineConfig) -> RepositoryResult<PipelineConfig> {
        let mut config = base;

        if let Some(v) = self.read_usize(config_keys::MIN_FEEDBACK_TEXTS)? {
            config.min_feedback_texts = v;
        }
        if let Some(v) = self.read_usize(config_keys::MAX_GENERATIVE_TEXTS)? {
            config.max_generative_texts = v.max(1);
        }
        if let Some(v) = self.read_usize(config_keys::MAX_CONCURRENCY)? {
            config.max_concurrency = v.max(1);
        }

        Ok(config)
    }

    fn read_usize(&self, key: &str) -> RepositoryResult<Option<usize>> {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(None);
        };
        match raw.trim().parse::<usize>() {
            Ok(v) => Ok(Some(v)),
            Err(_) => {
                warn!(key = %key, value = %raw, "配置值格式错误,使用默认值");
                Ok(None)
            }
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 处理管道
    pub const MIN_FEEDBACK_TEXTS: &str = "pipeline/min_feedback_texts";
    pub const MAX_GENERATIVE_TEXTS: &str = "pipeline/max_generative_texts";
    pub const MAX_CONCURRENCY: &str = "pipeline/max_concurrency";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn create_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_get_missing_config() {
        let manager = create_manager();
        assert_eq!(manager.get_config_value("nope").unwrap(), None);
    }

    #[test]
    fn test_set_and_overwrite_config() {
        let manager = create_manager();
        manager.set_config_value(config_keys::MIN_FEEDBACK_TEXTS, "5").unwrap();
        manager.set_config_value(config_keys::MIN_FEEDBACK_TEXTS, "6").unwrap();

        assert_eq!(
            manager.get_config_value(config_keys::MIN_FEEDBACK_TEXTS).unwrap(),
            Some("6".to_string())
        );
        assert_eq!(manager.list_configs().unwrap().len(), 1);
    }

    #[test]
    fn test_load_pipeline_config_overrides() {
        let manager = create_manager();
        manager.set_config_value(config_keys::MIN_FEEDBACK_TEXTS, "2").unwrap();
        manager.set_config_value(config_keys::MAX_GENERATIVE_TEXTS, "oops").unwrap();

        let config = manager.load_pipeline_config(PipelineConfig::default()).unwrap();

        assert_eq!(config.min_feedback_texts, 2);
        assert_eq!(config.max_generative_texts, 50);
    }
}
