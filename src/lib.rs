// ==========================================
// 市集摊位分配引擎 - 核心库
// ==========================================
// 职责: 根据市集配置 (供应商/分区/日期/分配选项) 计算桌位分配
// 系统定位: 纯计算引擎 (持久化与界面由宿主负责)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 配置对象与分配结果
pub mod domain;

// 引擎层 - 分配规则
pub mod engine;

// 配置层 - 引擎配置
pub mod config;

// 导出层 - 透视表
pub mod exporter;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ContainsMode, DataType, SortDirection, TableChoice, TablePreference};

// 领域对象
pub use domain::{
    AssignmentObject, AssignmentOptionObject, AssignmentStatistics, LocationObject,
    MarketDateObject, PriorityObject, SectionObject, SetupObject, TierObject,
    VendorAssignmentResult, VendorRecord,
};

// 引擎
pub use engine::{
    assign_setup, AssignmentError, AssignmentScheduler, AssignmentValidator, CancellationToken,
    CapacityTracker, ConfigError, EligibilityFilter, PriorityClassifier, SetupSchema,
    StatisticsAggregator, ValidationReport, Violation,
};

// 导出
pub use exporter::{export_pivot_csv, ExportError};

// 配置
pub use config::{ConfigManager, EngineConfig, EngineConfigReader};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "市集摊位分配引擎";
