// ==========================================
// 市集摊位分配引擎 - 分配统计
// ==========================================
// 职责: 由分配结果列表派生统计
// 输入: VendorAssignmentResult 列表
// 输出: AssignmentStatistics
// 红线: 各维度计数之和等于结果条数
// ==========================================

use crate::domain::assignment::{AssignmentStatistics, VendorAssignmentResult};
use std::collections::{BTreeMap, HashSet};

/// 无等级/位置限制的分区在统计中的归类名
pub const UNASSIGNED_BUCKET: &str = "Unassigned";

// ==========================================
// StatisticsAggregator - 统计聚合器
// ==========================================
pub struct StatisticsAggregator {
    // 无状态
}

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self {}
    }

    /// 单次遍历计算统计
    pub fn aggregate(&self, results: &[VendorAssignmentResult]) -> AssignmentStatistics {
        let mut emails = HashSet::new();
        let mut table_codes = HashSet::new();
        let mut stats = AssignmentStatistics::default();

        for result in results {
            emails.insert(result.email.as_str());
            table_codes.insert(result.table_code.as_str());

            bump(&mut stats.assignments_per_date, &result.date);
            bump(
                &mut stats.assignments_per_tier,
                result.tier.as_deref().unwrap_or(UNASSIGNED_BUCKET),
            );
            bump(&mut stats.assignments_per_section, &result.section);
            bump(
                &mut stats.assignments_per_table_choice,
                &result.table_choice.to_string(),
            );
        }

        stats.total_vendors = emails.len();
        stats.total_tables = table_codes.len();
        stats
    }

    /// 结果条数 (供应商-日期分配数)
    pub fn total_vendors_assigned(&self, results: &[VendorAssignmentResult]) -> usize {
        results.len()
    }

    /// 实际占用的桌数: 去重的 (日期, 桌号)
    pub fn total_tables_assigned(&self, results: &[VendorAssignmentResult]) -> usize {
        results
            .iter()
            .map(|r| (r.date.as_str(), r.table_code.as_str()))
            .collect::<HashSet<_>>()
            .len()
    }
}

impl Default for StatisticsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn bump(map: &mut BTreeMap<String, usize>, key: &str) {
    *map.entry(key.to_string()).or_insert(0) += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::TableChoice;

    fn create_test_result(email: &str, date: &str, code: &str, choice: TableChoice, tier: Option<&str>) -> VendorAssignmentResult {
        VendorAssignmentResult {
            email: email.to_string(),
            date: date.to_string(),
            table_code: code.to_string(),
            table_choice: choice,
            section: code[..1].to_string(),
            tier: tier.map(String::from),
            location: None,
        }
    }

    #[test]
    fn test_aggregate_counts_each_dimension() {
        let results = vec![
            create_test_result("a@test.com", "2025-03-17", "A01", TableChoice::Full, Some("Gold")),
            create_test_result("b@test.com", "2025-03-17", "B01", TableChoice::HalfLeft, None),
            create_test_result("c@test.com", "2025-03-17", "B01", TableChoice::HalfRight, None),
            create_test_result("a@test.com", "2025-03-18", "A01", TableChoice::Full, Some("Gold")),
        ];
        let aggregator = StatisticsAggregator::new();
        let stats = aggregator.aggregate(&results);

        assert_eq!(stats.total_vendors, 3);
        assert_eq!(stats.total_tables, 2);
        assert_eq!(stats.assignments_per_date["2025-03-17"], 3);
        assert_eq!(stats.assignments_per_tier["Gold"], 2);
        assert_eq!(stats.assignments_per_tier[UNASSIGNED_BUCKET], 2);
        assert_eq!(stats.assignments_per_section["B"], 2);
        assert_eq!(stats.assignments_per_table_choice["Full table"], 2);
        assert_eq!(stats.assignments_per_table_choice["Half table - Right"], 1);

        assert_eq!(aggregator.total_vendors_assigned(&results), 4);
        // A01 两天各算一次,B01 左右两侧算一次
        assert_eq!(aggregator.total_tables_assigned(&results), 3);

        for map in [
            &stats.assignments_per_date,
            &stats.assignments_per_tier,
            &stats.assignments_per_section,
            &stats.assignments_per_table_choice,
        ] {
            assert_eq!(map.values().sum::<usize>(), results.len());
        }
    }

    #[test]
    fn test_aggregate_empty() {
        let stats = StatisticsAggregator::new().aggregate(&[]);
        assert_eq!(stats, AssignmentStatistics::default());
    }
}
