// ==========================================
// 市集摊位分配引擎 - 分配结果领域模型
// ==========================================
// 输出: AssignmentObject (JSON 字段名为兼容契约)
// 红线: 结果对象构造完成后不可变,调用方不会看到半成品
// ==========================================

use crate::domain::types::TableChoice;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// VendorAssignmentResult - 单条分配结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorAssignmentResult {
    pub email: String,
    pub date: String,
    pub table_code: String,
    pub table_choice: TableChoice,
    pub section: String,
    pub tier: Option<String>,     // 分区等级 (不限制时为空)
    pub location: Option<String>, // 分区位置 (不限制时为空)
}

// ==========================================
// AssignmentStatistics - 分配统计
// ==========================================
// 由结果列表派生,不单独修改
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentStatistics {
    pub total_vendors: usize, // 去重后的供应商数
    pub total_tables: usize,  // 去重后的桌号数
    pub assignments_per_date: BTreeMap<String, usize>,
    pub assignments_per_tier: BTreeMap<String, usize>,
    pub assignments_per_section: BTreeMap<String, usize>,
    pub assignments_per_table_choice: BTreeMap<String, usize>,
}

// ==========================================
// AssignmentObject - 分配结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentObject {
    pub vendor_assignments: Vec<VendorAssignmentResult>,
    pub assignment_date: String, // 运行时刻 (唯一不可复现字段)
    pub total_vendors_assigned: usize,
    pub total_tables_assigned: usize,
    pub assignment_statistics: AssignmentStatistics,
}

impl AssignmentObject {
    /// 指定供应商的全部分配
    pub fn assignments_for<'a>(
        &'a self,
        email: &'a str,
    ) -> impl Iterator<Item = &'a VendorAssignmentResult> + 'a {
        self.vendor_assignments.iter().filter(move |a| a.email == email)
    }

    /// 指定日期的全部分配
    pub fn assignments_on<'a>(
        &'a self,
        date: &'a str,
    ) -> impl Iterator<Item = &'a VendorAssignmentResult> + 'a {
        self.vendor_assignments.iter().filter(move |a| a.date == date)
    }
}
