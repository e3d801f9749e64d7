// ==========================================
// 市集摊位分配引擎 - 市集配置领域模型
// ==========================================
// 来源: 前端配置页面 (SetupObject),字段名为兼容契约 (camelCase)
// 红线: 配置对象在一次分配运行中只读
// ==========================================

use crate::domain::types::DataType;
use crate::domain::vendor::VendorRecord;
use serde::{Deserialize, Serialize};

// ==========================================
// PriorityObject - 优先级规则
// ==========================================
// 多条规则按 id 升序构成字典序比较链
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityObject {
    pub id: i64,              // 规则序号 (越小越优先)
    pub col_name_idx: usize,  // 列索引
    pub data_type: DataType,  // 数据类型
    #[serde(default)]
    pub sorting_order: String, // 升降序 / 子串
}

// ==========================================
// MarketDateObject - 市集日期
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDateObject {
    pub date: String,        // 日期 (如 2025-03-17)
    pub col_name_idx: usize, // 报名该日期的列索引
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierObject {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationObject {
    pub name: String,
}

// ==========================================
// SectionObject - 分区
// ==========================================
// tier/location 为空表示不限制
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionObject {
    pub name: String,
    #[serde(default)]
    pub location: Option<LocationObject>,
    #[serde(default)]
    pub tier: Option<TierObject>,
    pub count: u32, // 整桌数量
}

impl SectionObject {
    /// 分区等级名称
    pub fn tier_name(&self) -> Option<&str> {
        self.tier.as_ref().map(|t| t.name.as_str())
    }

    /// 分区位置名称
    pub fn location_name(&self) -> Option<&str> {
        self.location.as_ref().map(|l| l.name.as_str())
    }
}

// ==========================================
// AssignmentOptionObject - 分配选项
// ==========================================
// 空值表示不限制
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentOptionObject {
    #[serde(default)]
    pub max_assignments_per_vendor: Option<u32>,
    #[serde(default)]
    pub max_half_table_proportion_per_section: Option<f64>,
}

impl AssignmentOptionObject {
    /// 半桌占比上限 (归一化为 0~1)
    ///
    /// 前端以整数百分比保存 (如 50),也接受小于 1 的小数 (如 0.5);
    /// 大于等于 1 的值一律按百分比处理,1 表示 1%
    ///
    /// # 返回
    /// - None: 不限制
    /// - Some(ratio): 0.0 ~ 1.0
    pub fn half_table_cap(&self) -> Option<f64> {
        self.max_half_table_proportion_per_section.map(|raw| {
            let ratio = if raw >= 1.0 { raw / 100.0 } else { raw };
            ratio.clamp(0.0, 1.0)
        })
    }
}

// ==========================================
// SetupObject - 市集配置
// ==========================================
// colValues 按列存储: colValues[列][行]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupObject {
    pub col_names: Vec<String>,
    pub col_values: Vec<Vec<String>>,
    #[serde(default)]
    pub col_include: Vec<bool>,
    #[serde(default)]
    pub enum_priority_order: Vec<Vec<String>>,
    #[serde(default)]
    pub priority: Vec<PriorityObject>,
    #[serde(default)]
    pub market_dates: Vec<MarketDateObject>,
    #[serde(default)]
    pub tiers: Vec<TierObject>,
    #[serde(default)]
    pub locations: Vec<LocationObject>,
    #[serde(default)]
    pub sections: Vec<SectionObject>,
    #[serde(default)]
    pub assignment_options: AssignmentOptionObject,

    // ===== 可选列绑定 (缺省时按列名推断) =====
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_col_idx: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier_col_idx: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_col_idx: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_choice_col_idx: Option<usize>,
    /// 同桌伙伴邮箱列
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_share_col_idx: Option<usize>,
}

impl SetupObject {
    /// 供应商行数 (以第一列为准)
    pub fn row_count(&self) -> usize {
        self.col_values.first().map(|c| c.len()).unwrap_or(0)
    }

    /// 列是否被纳入 (colInclude 为空时全部纳入)
    pub fn is_included(&self, col: usize) -> bool {
        self.col_include.get(col).copied().unwrap_or(true)
    }

    /// 将按列存储的数据转为按行的供应商记录
    ///
    /// 缺失的单元格补为空串
    pub fn vendor_records(&self) -> Vec<VendorRecord> {
        (0..self.row_count())
            .map(|row| {
                let cells = self
                    .col_values
                    .iter()
                    .map(|column| column.get(row).cloned().unwrap_or_default())
                    .collect();
                VendorRecord::new(row, cells)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_table_cap_accepts_percent_and_fraction() {
        let percent = AssignmentOptionObject {
            max_assignments_per_vendor: None,
            max_half_table_proportion_per_section: Some(50.0),
        };
        assert_eq!(percent.half_table_cap(), Some(0.5));

        let fraction = AssignmentOptionObject {
            max_assignments_per_vendor: None,
            max_half_table_proportion_per_section: Some(0.25),
        };
        assert_eq!(fraction.half_table_cap(), Some(0.25));

        // 1 是 1%,不是 100%
        let one_percent = AssignmentOptionObject {
            max_assignments_per_vendor: None,
            max_half_table_proportion_per_section: Some(1.0),
        };
        assert_eq!(one_percent.half_table_cap(), Some(0.01));

        let full = AssignmentOptionObject {
            max_assignments_per_vendor: None,
            max_half_table_proportion_per_section: Some(100.0),
        };
        assert_eq!(full.half_table_cap(), Some(1.0));

        assert_eq!(AssignmentOptionObject::default().half_table_cap(), None);
    }

    #[test]
    fn test_setup_deserialize_from_ui_document() {
        let raw = r#"{
            "colNames": ["Email Address", "2025-03-17"],
            "colValues": [["a@test.com", "b@test.com"], ["Gold", ""]],
            "colInclude": [true, true],
            "enumPriorityOrder": [[], []],
            "priority": [{"id": 1, "colNameIdx": 0, "dataType": "String", "sortingOrder": "ascending"}],
            "marketDates": [{"date": "2025-03-17", "colNameIdx": 1}],
            "tiers": [{"id": 1, "name": "Gold"}],
            "locations": [{"name": "Main Hall"}],
            "sections": [{"name": "A", "location": {"name": "Main Hall"}, "tier": {"id": 1, "name": "Gold"}, "count": 2}],
            "assignmentOptions": {"maxAssignmentsPerVendor": 1, "maxHalfTableProportionPerSection": 50}
        }"#;

        let setup: SetupObject = serde_json::from_str(raw).unwrap();
        assert_eq!(setup.row_count(), 2);
        assert_eq!(setup.sections[0].tier_name(), Some("Gold"));
        assert_eq!(setup.assignment_options.max_assignments_per_vendor, Some(1));
        assert_eq!(setup.email_col_idx, None);

        let records = setup.vendor_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].cell(0), "b@test.com");
        assert_eq!(records[1].cell(1), "");
    }

    #[test]
    fn test_vendor_records_pad_ragged_columns() {
        let setup = SetupObject {
            col_names: vec!["email".to_string(), "note".to_string()],
            col_values: vec![
                vec!["a@test.com".to_string(), "b@test.com".to_string()],
                vec!["x".to_string()],
            ],
            ..Default::default()
        };

        let records = setup.vendor_records();
        assert_eq!(records[1].cell(1), "");
        assert!(setup.is_included(1));
    }
}
