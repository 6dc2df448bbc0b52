// ==========================================
// FitLoop - 配置层
// ==========================================
// 职责: 环境变量配置 + config_kv 覆写
// ==========================================

pub mod app_config;
pub mod config_manager;

// 重导出核心配置
pub use app_config::{env_keys, AppConfig, LlmConfig, PipelineConfig};
pub use config_manager::{config_keys, ConfigManager};
