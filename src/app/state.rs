// ==========================================
// FitLoop - 应用状态
// ==========================================
// 职责: 打开数据库、构造生成式后端、组装 API 实例
// ==========================================

use crate::api::{ApiError, ApiResult, FitLoopApi};
use crate::config::{env_keys, AppConfig};
use crate::db::{init_schema, open_sqlite_connection};
use crate::llm::{OpenAiClient, TextGenerator};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::info;

/// 应用状态
///
/// 包含API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 应用 API
    pub api: Arc<FitLoopApi>,
}

impl AppState {
    /// 创建应用状态
    ///
    /// # 参数
    /// - config: 应用配置 (db_path 为空时使用默认路径)
    pub fn new(config: AppConfig) -> ApiResult<Self> {
        let db_path = config.db_path.clone().unwrap_or_else(get_default_db_path);
        info!(db_path = %db_path, "初始化AppState");

        // 创建数据库连接（共享连接）
        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(format!("无法打开数据库: {}", e)))?;
        init_schema(&conn).map_err(|e| ApiError::DatabaseError(format!("schema 初始化失败: {}", e)))?;
        let conn = Arc::new(Mutex::new(conn));

        // 生成式后端 (未配置 API key 时为 None)
        let backend: Option<Arc<dyn TextGenerator>> = match &config.llm {
            Some(llm_config) => Some(Arc::new(OpenAiClient::new(llm_config)?)),
            None => {
                info!("未配置生成式后端,使用规则提取与模板文案");
                None
            }
        };

        let api = Arc::new(FitLoopApi::new(&db_path, conn, backend, config.pipeline));

        Ok(Self { db_path, api })
    }
}

/// 获取默认数据库路径
///
/// 优先级: FITLOOP_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var(env_keys::DB_PATH) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./fitloop.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("fitloop");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("fitloop.db");
        }
    }

    path.to_string_lossy().to_string()
}
