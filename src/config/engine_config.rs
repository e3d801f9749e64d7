use crate::config::engine_config_trait::EngineConfigReader;
use crate::domain::types::ContainsMode;
use crate::engine::error::ConfigError;
use serde::{Deserialize, Serialize};

/// 引擎配置（已解析快照）
///
/// 一次分配运行开始前从 `EngineConfigReader` 解析一次,运行期间只读
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Contains/NotContains 规则是否同时作为准入过滤
    pub contains_mode: ContainsMode,

    /// 文本匹配忽略大小写
    pub case_insensitive_match: bool,

    /// 桌号序号补零宽度
    pub table_code_width: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            contains_mode: ContainsMode::Filtering,
            case_insensitive_match: true,
            table_code_width: 2,
        }
    }
}

impl EngineConfig {
    /// 从配置读取器解析
    pub fn from_reader<R: EngineConfigReader + ?Sized>(reader: &R) -> Result<Self, ConfigError> {
        Ok(Self {
            contains_mode: reader.get_contains_mode()?,
            case_insensitive_match: reader.get_case_insensitive_match()?,
            table_code_width: reader.get_table_code_width()?,
        })
    }

    /// 按当前大小写规则归一化文本
    pub fn normalize(&self, text: &str) -> String {
        if self.case_insensitive_match {
            text.trim().to_lowercase()
        } else {
            text.trim().to_string()
        }
    }
}

impl EngineConfigReader for EngineConfig {
    fn get_contains_mode(&self) -> Result<ContainsMode, ConfigError> {
        Ok(self.contains_mode)
    }

    fn get_case_insensitive_match(&self) -> Result<bool, ConfigError> {
        Ok(self.case_insensitive_match)
    }

    fn get_table_code_width(&self) -> Result<usize, ConfigError> {
        Ok(self.table_code_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{config_keys, ConfigManager};

    #[test]
    fn test_from_reader_resolves_manager_values() {
        let mut manager = ConfigManager::new();
        manager.set(config_keys::CONTAINS_MODE, "RANKING_ONLY");
        manager.set(config_keys::CASE_INSENSITIVE_MATCH, "false");

        let config = EngineConfig::from_reader(&manager).unwrap();
        assert_eq!(config.contains_mode, ContainsMode::RankingOnly);
        assert!(!config.case_insensitive_match);
        assert_eq!(config.table_code_width, 2);
        assert_eq!(config.normalize(" Gold "), "Gold");
    }

    #[test]
    fn test_default_round_trips_through_reader() {
        let config = EngineConfig::default();
        assert_eq!(EngineConfig::from_reader(&config).unwrap(), config);
        assert_eq!(config.normalize(" Gold "), "gold");
    }
}
