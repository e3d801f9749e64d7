// ==========================================
// 市集摊位分配引擎 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 配置错误致命 (不产出部分结果); 单行数据异常只降级不报错
// ==========================================

use thiserror::Error;

/// 配置错误 (结构性错误,运行直接终止)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    // ===== 表格结构 =====
    #[error("列数不一致: colNames={names}, colValues={values}")]
    ColumnCountMismatch { names: usize, values: usize },

    #[error("列行数不一致: column={column}, expected={expected}, actual={actual}")]
    RaggedColumns {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("colInclude 长度不一致: expected={expected}, actual={actual}")]
    ColumnIncludeMismatch { expected: usize, actual: usize },

    #[error("列索引越界 ({context}): index={index}, columns={len}")]
    ColumnIndexOutOfRange {
        context: String,
        index: usize,
        len: usize,
    },

    #[error("缺少邮箱列: 未绑定 emailColIdx 且列名中无 email")]
    MissingEmailColumn,

    // ===== 优先级规则 =====
    #[error("优先级规则引用了未纳入的列: priority_id={priority_id}, column={column}")]
    ExcludedPriorityColumn { priority_id: i64, column: String },

    #[error("优先级规则未选择数据类型: priority_id={priority_id}")]
    PlaceholderDataType { priority_id: i64 },

    #[error("无效的排序方向: priority_id={priority_id}, sortingOrder={sorting_order}")]
    InvalidSortingOrder {
        priority_id: i64,
        sorting_order: String,
    },

    #[error("子串规则缺少匹配文本: priority_id={priority_id}")]
    EmptySubstring { priority_id: i64 },

    #[error("枚举规则缺少枚举顺序: priority_id={priority_id}, column={column}")]
    MissingEnumOrder { priority_id: i64, column: String },

    // ===== 日期与分区 =====
    #[error("市集日期为空")]
    EmptyMarketDate,

    #[error("市集日期重复: {0}")]
    DuplicateMarketDate(String),

    #[error("分区名称为空")]
    EmptySectionName,

    #[error("分区名称重复: {0}")]
    DuplicateSection(String),

    #[error("分区名称不能以数字结尾 (桌号会与其他分区混淆): {0}")]
    SectionNameEndsWithDigit(String),

    // ===== 引擎配置 =====
    #[error("配置值无效 (key={key}, value={value}): {reason}")]
    InvalidConfigValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("配置文件读取失败: {0}")]
    ConfigFile(String),
}

/// 分配运行错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssignmentError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("分配已取消: 已完成日期数={completed_dates}")]
    Cancelled { completed_dates: usize },
}
