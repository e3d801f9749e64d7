// ==========================================
// 市集摊位分配引擎 - 领域类型定义
// ==========================================
// 序列化格式与前端/文档存储保持一致
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 优先级数据类型 (Priority Data Type)
// ==========================================
// 序列化值即前端下拉框显示文本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "Select a datatype")]
    Default, // 未选择 (前端占位)
    #[serde(rename = "String")]
    String, // 字符串比较
    #[serde(rename = "Number")]
    Number, // 数值比较
    #[serde(rename = "Enum")]
    Enum, // 枚举顺序
    #[serde(rename = "Contains")]
    Contains, // 包含子串
    #[serde(rename = "Does not contain")]
    NotContains, // 不包含子串
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Default => write!(f, "Select a datatype"),
            DataType::String => write!(f, "String"),
            DataType::Number => write!(f, "Number"),
            DataType::Enum => write!(f, "Enum"),
            DataType::Contains => write!(f, "Contains"),
            DataType::NotContains => write!(f, "Does not contain"),
        }
    }
}

// ==========================================
// 排序方向 (Sort Direction)
// ==========================================
// 仅用于 String / Number 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,  // 升序
    Descending, // 降序
}

impl SortDirection {
    /// 从 sortingOrder 字段解析
    ///
    /// # 返回
    /// - Some: 空串/asc/ascending → 升序, desc/descending → 降序
    /// - None: 无法识别
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "" | "asc" | "ascending" => Some(SortDirection::Ascending),
            "desc" | "descending" => Some(SortDirection::Descending),
            _ => None,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => write!(f, "ascending"),
            SortDirection::Descending => write!(f, "descending"),
        }
    }
}

// ==========================================
// 桌位类型 (Table Choice)
// ==========================================
// 分配结果中的桌位类型,序列化值为兼容契约
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TableChoice {
    #[serde(rename = "Full table")]
    Full, // 整桌
    #[serde(rename = "Half table - Left")]
    HalfLeft, // 半桌(左)
    #[serde(rename = "Half table - Right")]
    HalfRight, // 半桌(右)
}

impl fmt::Display for TableChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableChoice::Full => write!(f, "Full table"),
            TableChoice::HalfLeft => write!(f, "Half table - Left"),
            TableChoice::HalfRight => write!(f, "Half table - Right"),
        }
    }
}

impl TableChoice {
    /// 是否为半桌
    pub fn is_half(&self) -> bool {
        !matches!(self, TableChoice::Full)
    }
}

// ==========================================
// 供应商桌位偏好 (Table Preference)
// ==========================================
// 来源: 报名表 "Table Choice" 列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TablePreference {
    FullOnly, // 只要整桌
    HalfOnly, // 只要半桌
    Either,   // 均可 (整桌优先)
}

impl TablePreference {
    /// 从单元格文本解析,无法识别时按 Either 处理
    pub fn from_cell(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "full table only" | "full table" | "full" => TablePreference::FullOnly,
            "half table" | "half table only" | "half" => TablePreference::HalfOnly,
            _ => TablePreference::Either,
        }
    }

    /// 是否允许整桌
    pub fn allows_full(&self) -> bool {
        !matches!(self, TablePreference::HalfOnly)
    }

    /// 是否允许半桌
    pub fn allows_half(&self) -> bool {
        !matches!(self, TablePreference::FullOnly)
    }

    /// 检查分配的桌位类型是否符合偏好
    pub fn accepts(&self, choice: TableChoice) -> bool {
        if choice.is_half() {
            self.allows_half()
        } else {
            self.allows_full()
        }
    }
}

impl fmt::Display for TablePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TablePreference::FullOnly => write!(f, "Full table only"),
            TablePreference::HalfOnly => write!(f, "Half table"),
            TablePreference::Either => write!(f, "Either"),
        }
    }
}

// ==========================================
// 子串规则模式 (Contains Mode)
// ==========================================
// Contains / NotContains 优先级对象的双重角色:
// - FILTERING: 既参与排序,也作为硬性准入条件
// - RANKING_ONLY: 仅参与排序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainsMode {
    Filtering,
    RankingOnly,
}

impl fmt::Display for ContainsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainsMode::Filtering => write!(f, "FILTERING"),
            ContainsMode::RankingOnly => write!(f, "RANKING_ONLY"),
        }
    }
}

impl ContainsMode {
    /// 从字符串解析模式
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "FILTERING" => Some(ContainsMode::Filtering),
            "RANKING_ONLY" => Some(ContainsMode::RankingOnly),
            _ => None,
        }
    }
}
