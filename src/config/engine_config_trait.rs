// ==========================================
// 市集摊位分配引擎 - 引擎配置读取 Trait
// ==========================================
// 职责: 定义分配引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::ContainsMode;
use crate::engine::error::ConfigError;

// ==========================================
// EngineConfigReader Trait
// ==========================================
// 实现者: ConfigManager（键值存储）、EngineConfig（已解析快照）
pub trait EngineConfigReader: Send + Sync {
    /// 获取 Contains/NotContains 规则模式
    ///
    /// # 默认值
    /// - FILTERING
    fn get_contains_mode(&self) -> Result<ContainsMode, ConfigError>;

    /// 文本匹配是否忽略大小写（子串规则、等级、位置）
    ///
    /// # 默认值
    /// - true
    fn get_case_insensitive_match(&self) -> Result<bool, ConfigError>;

    /// 桌号序号补零宽度
    ///
    /// # 返回
    /// - 1..=6
    ///
    /// # 默认值
    /// - 2 (A01, A02, ...)
    fn get_table_code_width(&self) -> Result<usize, ConfigError>;
}
