// ==========================================
// 市集摊位分配引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: 键值对 (key-value),可从 JSON 文件加载
// ==========================================

use crate::config::engine_config_trait::EngineConfigReader;
use crate::domain::types::ContainsMode;
use crate::engine::error::ConfigError;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// 配置键
pub mod config_keys {
    pub const CONTAINS_MODE: &str = "contains_mode";
    pub const CASE_INSENSITIVE_MATCH: &str = "case_insensitive_match";
    pub const TABLE_CODE_WIDTH: &str = "table_code_width";
}

// 默认值
const DEFAULT_CONTAINS_MODE: &str = "FILTERING";
const DEFAULT_CASE_INSENSITIVE_MATCH: &str = "true";
const DEFAULT_TABLE_CODE_WIDTH: &str = "2";
const MAX_TABLE_CODE_WIDTH: usize = 6;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    values: BTreeMap<String, String>,
}

impl ConfigManager {
    /// 创建空配置 (全部使用默认值)
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 文件加载配置
    ///
    /// 文件内容为扁平 JSON 对象,值可为字符串/布尔/数字
    ///
    /// # 参数
    /// - path: 配置文件路径
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ConfigFile(format!("{}: {}", path.display(), e)))?;
        let manager = Self::from_json_str(&raw)?;
        debug!(path = %path.display(), keys = manager.values.len(), "配置文件已加载");
        Ok(manager)
    }

    /// 从 JSON 字符串加载配置
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| ConfigError::ConfigFile(e.to_string()))?;

        let object = value
            .as_object()
            .ok_or_else(|| ConfigError::ConfigFile("配置文件顶层必须为 JSON 对象".to_string()))?;

        let mut values = BTreeMap::new();
        for (key, v) in object {
            let text = match v {
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Null => continue,
                other => {
                    return Err(ConfigError::InvalidConfigValue {
                        key: key.clone(),
                        value: other.to_string(),
                        reason: "仅支持字符串/布尔/数字".to_string(),
                    })
                }
            };
            values.insert(key.clone(), text);
        }

        Ok(Self { values })
    }

    /// 覆写单个配置值
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// 读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// 读取配置值，带默认值
    fn get_config_or_default<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_config_value(key).unwrap_or(default)
    }

    /// 获取生效配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 在分配运行开始时记录配置,便于复现
    pub fn snapshot(&self) -> Result<String, ConfigError> {
        let snapshot = json!({
            (config_keys::CONTAINS_MODE): self.get_contains_mode()?.to_string(),
            (config_keys::CASE_INSENSITIVE_MATCH): self.get_case_insensitive_match()?,
            (config_keys::TABLE_CODE_WIDTH): self.get_table_code_width()?,
        });
        Ok(snapshot.to_string())
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidConfigValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

// ==========================================
// EngineConfigReader 实现
// ==========================================
impl EngineConfigReader for ConfigManager {
    fn get_contains_mode(&self) -> Result<ContainsMode, ConfigError> {
        let raw = self.get_config_or_default(config_keys::CONTAINS_MODE, DEFAULT_CONTAINS_MODE);
        ContainsMode::parse(raw).ok_or_else(|| {
            invalid(
                config_keys::CONTAINS_MODE,
                raw,
                "必须为 FILTERING 或 RANKING_ONLY",
            )
        })
    }

    fn get_case_insensitive_match(&self) -> Result<bool, ConfigError> {
        let raw = self.get_config_or_default(
            config_keys::CASE_INSENSITIVE_MATCH,
            DEFAULT_CASE_INSENSITIVE_MATCH,
        );
        match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(invalid(
                config_keys::CASE_INSENSITIVE_MATCH,
                raw,
                "必须为布尔值",
            )),
        }
    }

    fn get_table_code_width(&self) -> Result<usize, ConfigError> {
        let raw = self.get_config_or_default(config_keys::TABLE_CODE_WIDTH, DEFAULT_TABLE_CODE_WIDTH);
        match raw.trim().parse::<usize>() {
            Ok(width) if (1..=MAX_TABLE_CODE_WIDTH).contains(&width) => Ok(width),
            _ => Err(invalid(
                config_keys::TABLE_CODE_WIDTH,
                raw,
                "必须为 1~6 的整数",
            )),
        }
    }
}
