// ==========================================
// 市集摊位分配引擎 - 配置结构解析
// ==========================================
// 职责: 运行开始时一次性校验 SetupObject,把列索引解析为强类型访问器
// 输入: SetupObject
// 输出: SetupSchema (只读,贯穿整个运行)
// 红线: 运行过程中不再重新解析列索引
// ==========================================

use crate::domain::setup::{SectionObject, SetupObject};
use crate::domain::types::{DataType, SortDirection, TablePreference};
use crate::domain::vendor::VendorRecord;
use crate::engine::error::ConfigError;
use std::collections::HashSet;
use tracing::debug;

/// 枚举顺序中代表"其余所有值"的占位项
pub const ALL_OTHERS_TOKEN: &str = "<All others>";

// ==========================================
// 解析后的优先级规则
// ==========================================

#[derive(Debug, Clone, PartialEq)]
pub enum CriterionKind {
    String(SortDirection),
    Number(SortDirection),
    Enum {
        order: Vec<String>,
        /// "<All others>" 所在位置; 未列出的值取该名次
        all_others_rank: Option<usize>,
    },
    Contains(String),
    NotContains(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub priority_id: i64,
    pub col: usize,
    pub kind: CriterionKind,
}

impl Criterion {
    /// 是否为子串规则
    pub fn substring(&self) -> Option<(&str, bool)> {
        match &self.kind {
            CriterionKind::Contains(needle) => Some((needle.as_str(), true)),
            CriterionKind::NotContains(needle) => Some((needle.as_str(), false)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDate {
    pub date: String,
    pub col: usize,
}

// ==========================================
// SetupSchema - 已校验的配置结构
// ==========================================
#[derive(Debug, Clone)]
pub struct SetupSchema {
    pub col_names: Vec<String>,
    pub email_col: usize,
    pub tier_col: Option<usize>,
    pub location_col: Option<usize>,
    pub table_choice_col: Option<usize>,
    pub table_share_col: Option<usize>,
    pub dates: Vec<ResolvedDate>,
    pub criteria: Vec<Criterion>,
    pub sections: Vec<SectionObject>,
    /// 已知等级名 (tiers 列表 + 分区等级)
    pub tier_names: Vec<String>,
    pub max_assignments_per_vendor: Option<u32>,
    pub half_table_cap: Option<f64>,
}

/// 同桌伙伴邮箱列的默认列名 (归一化后)
const TABLE_SHARE_COL_NAME: &str = "table_share_email";

/// 列名归一化: 小写 + 空格转下划线
fn normalize_col_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

fn check_col(context: impl FnOnce() -> String, index: usize, len: usize) -> Result<usize, ConfigError> {
    if index < len {
        Ok(index)
    } else {
        Err(ConfigError::ColumnIndexOutOfRange {
            context: context(),
            index,
            len,
        })
    }
}

impl SetupSchema {
    /// 校验并解析 SetupObject
    ///
    /// # 返回
    /// - Ok(SetupSchema): 所有列索引已校验
    /// - Err(ConfigError): 结构性配置错误 (致命)
    pub fn resolve(setup: &SetupObject) -> Result<Self, ConfigError> {
        let col_count = setup.col_names.len();

        // 1. 表格结构
        if setup.col_values.len() != col_count {
            return Err(ConfigError::ColumnCountMismatch {
                names: col_count,
                values: setup.col_values.len(),
            });
        }
        let row_count = setup.row_count();
        for (idx, column) in setup.col_values.iter().enumerate() {
            if column.len() != row_count {
                return Err(ConfigError::RaggedColumns {
                    column: setup.col_names[idx].clone(),
                    expected: row_count,
                    actual: column.len(),
                });
            }
        }
        if !setup.col_include.is_empty() && setup.col_include.len() != col_count {
            return Err(ConfigError::ColumnIncludeMismatch {
                expected: col_count,
                actual: setup.col_include.len(),
            });
        }

        // 2. 列绑定
        let email_col = match setup.email_col_idx {
            Some(idx) => check_col(|| "emailColIdx".to_string(), idx, col_count)?,
            None => Self::find_col(setup, |n| n.contains("email") && n != TABLE_SHARE_COL_NAME)
                .ok_or(ConfigError::MissingEmailColumn)?,
        };
        let tier_col = Self::bind_optional(setup, setup.tier_col_idx, "tierColIdx", "tier")?;
        let location_col =
            Self::bind_optional(setup, setup.location_col_idx, "locationColIdx", "location")?;
        let table_choice_col = Self::bind_optional(
            setup,
            setup.table_choice_col_idx,
            "tableChoiceColIdx",
            "table_choice",
        )?;
        let table_share_col = Self::bind_optional(
            setup,
            setup.table_share_col_idx,
            "tableShareColIdx",
            TABLE_SHARE_COL_NAME,
        )?;

        // 3. 优先级规则链
        let criteria = Self::resolve_criteria(setup)?;

        // 4. 市集日期
        let mut seen_dates = HashSet::new();
        let mut dates = Vec::with_capacity(setup.market_dates.len());
        for market_date in &setup.market_dates {
            let date = market_date.date.trim();
            if date.is_empty() {
                return Err(ConfigError::EmptyMarketDate);
            }
            if !seen_dates.insert(date.to_string()) {
                return Err(ConfigError::DuplicateMarketDate(date.to_string()));
            }
            let col = check_col(
                || format!("marketDate {}", date),
                market_date.col_name_idx,
                col_count,
            )?;
            dates.push(ResolvedDate {
                date: date.to_string(),
                col,
            });
        }

        // 5. 分区
        let mut seen_sections = HashSet::new();
        for section in &setup.sections {
            if section.name.trim().is_empty() {
                return Err(ConfigError::EmptySectionName);
            }
            if !seen_sections.insert(section.name.clone()) {
                return Err(ConfigError::DuplicateSection(section.name.clone()));
            }
            // 桌号 = 分区名 + 序号,分区名以数字结尾时 "A1"+"01" 与 "A"+"101" 相同
            if section.name.ends_with(|c: char| c.is_ascii_digit()) {
                return Err(ConfigError::SectionNameEndsWithDigit(section.name.clone()));
            }
        }

        let mut tier_names: Vec<String> = setup.tiers.iter().map(|t| t.name.clone()).collect();
        for name in setup.sections.iter().filter_map(|s| s.tier_name()) {
            if !tier_names.iter().any(|t| t == name) {
                tier_names.push(name.to_string());
            }
        }

        debug!(
            columns = col_count,
            rows = row_count,
            criteria = criteria.len(),
            dates = dates.len(),
            sections = setup.sections.len(),
            "配置结构解析完成"
        );

        Ok(Self {
            col_names: setup.col_names.clone(),
            email_col,
            tier_col,
            location_col,
            table_choice_col,
            table_share_col,
            dates,
            criteria,
            sections: setup.sections.clone(),
            tier_names,
            max_assignments_per_vendor: setup.assignment_options.max_assignments_per_vendor,
            half_table_cap: setup.assignment_options.half_table_cap(),
        })
    }

    fn find_col(setup: &SetupObject, pred: impl Fn(&str) -> bool) -> Option<usize> {
        setup
            .col_names
            .iter()
            .position(|name| pred(&normalize_col_name(name)))
    }

    fn bind_optional(
        setup: &SetupObject,
        explicit: Option<usize>,
        field: &str,
        default_name: &str,
    ) -> Result<Option<usize>, ConfigError> {
        match explicit {
            Some(idx) => Ok(Some(check_col(
                || field.to_string(),
                idx,
                setup.col_names.len(),
            )?)),
            None => Ok(Self::find_col(setup, |n| n == default_name)),
        }
    }

    fn resolve_criteria(setup: &SetupObject) -> Result<Vec<Criterion>, ConfigError> {
        let col_count = setup.col_names.len();
        // 枚举顺序: 每列一项 (前端形态) 时按列索引取,否则按枚举规则出现次序取
        let enum_by_column = setup.enum_priority_order.len() == col_count;

        let mut ordered: Vec<_> = setup.priority.iter().collect();
        ordered.sort_by_key(|p| p.id);

        let mut criteria = Vec::with_capacity(ordered.len());
        let mut enum_ordinal = 0usize;

        for priority in ordered {
            let col = check_col(
                || format!("priority id={}", priority.id),
                priority.col_name_idx,
                col_count,
            )?;
            if !setup.is_included(col) {
                return Err(ConfigError::ExcludedPriorityColumn {
                    priority_id: priority.id,
                    column: setup.col_names[col].clone(),
                });
            }

            let direction = || {
                SortDirection::parse(&priority.sorting_order).ok_or_else(|| {
                    ConfigError::InvalidSortingOrder {
                        priority_id: priority.id,
                        sorting_order: priority.sorting_order.clone(),
                    }
                })
            };
            let needle = || {
                let needle = priority.sorting_order.trim();
                if needle.is_empty() {
                    Err(ConfigError::EmptySubstring {
                        priority_id: priority.id,
                    })
                } else {
                    Ok(needle.to_string())
                }
            };

            let kind = match priority.data_type {
                DataType::Default => {
                    return Err(ConfigError::PlaceholderDataType {
                        priority_id: priority.id,
                    })
                }
                DataType::String => CriterionKind::String(direction()?),
                DataType::Number => CriterionKind::Number(direction()?),
                DataType::Contains => CriterionKind::Contains(needle()?),
                DataType::NotContains => CriterionKind::NotContains(needle()?),
                DataType::Enum => {
                    let list_idx = if enum_by_column { col } else { enum_ordinal };
                    enum_ordinal += 1;

                    let order: Vec<String> = setup
                        .enum_priority_order
                        .get(list_idx)
                        .map(|list| list.iter().map(|v| v.trim().to_string()).collect())
                        .unwrap_or_default();
                    if order.is_empty() {
                        return Err(ConfigError::MissingEnumOrder {
                            priority_id: priority.id,
                            column: setup.col_names[col].clone(),
                        });
                    }
                    let all_others_rank = order.iter().position(|v| v == ALL_OTHERS_TOKEN);
                    CriterionKind::Enum {
                        order,
                        all_others_rank,
                    }
                }
            };

            criteria.push(Criterion {
                priority_id: priority.id,
                col,
                kind,
            });
        }

        Ok(criteria)
    }

    // ==========================================
    // 强类型访问器
    // ==========================================

    pub fn email<'a>(&self, vendor: &'a VendorRecord) -> &'a str {
        vendor.cell(self.email_col).trim()
    }

    pub fn date_cell<'a>(&self, date_idx: usize, vendor: &'a VendorRecord) -> &'a str {
        self.dates
            .get(date_idx)
            .map(|d| vendor.cell(d.col))
            .unwrap_or("")
    }

    pub fn tier_cell<'a>(&self, vendor: &'a VendorRecord) -> Option<&'a str> {
        self.tier_col.map(|col| vendor.cell(col))
    }

    pub fn location_cell<'a>(&self, vendor: &'a VendorRecord) -> Option<&'a str> {
        self.location_col.map(|col| vendor.cell(col))
    }

    pub fn table_preference(&self, vendor: &VendorRecord) -> TablePreference {
        self.table_choice_col
            .map(|col| TablePreference::from_cell(vendor.cell(col)))
            .unwrap_or(TablePreference::Either)
    }

    /// 同桌伙伴邮箱 (未绑定列或单元格为空时为 None)
    pub fn table_share_email<'a>(&self, vendor: &'a VendorRecord) -> Option<&'a str> {
        self.table_share_col
            .map(|col| vendor.cell(col).trim())
            .filter(|email| !email.is_empty())
    }

    /// 按日期字符串查找日期序号
    pub fn date_index(&self, date: &str) -> Option<usize> {
        self.dates.iter().position(|d| d.date == date)
    }

    /// 按名称查找分区
    pub fn section(&self, name: &str) -> Option<&SectionObject> {
        self.sections.iter().find(|s| s.name == name)
    }
}
