// ==========================================
// 市集摊位分配引擎 - 配置层
// ==========================================
// 职责: 引擎配置管理,支持文件加载与覆写
// 存储: 键值对 (config_keys)
// ==========================================

pub mod config_manager;
pub mod engine_config;
pub mod engine_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use engine_config::EngineConfig;
pub use engine_config_trait::EngineConfigReader;
