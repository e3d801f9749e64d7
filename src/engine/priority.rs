// ==========================================
// 市集摊位分配引擎 - 供应商优先级排序
// ==========================================
// 职责: 按优先级规则链对供应商排序 (字典序逐级比较)
// 输入: 已解析的规则链 + 供应商记录
// 输出: 排序后的供应商列表 (全序,行号兜底)
// ==========================================
// 规则:
// - String: 字典序,sortingOrder 决定方向
// - Number: 按浮点数比较,无法解析的值无论方向都排最后
// - Enum: 按枚举顺序位置,未列出的值排在所有已列出值之后
// - Contains / NotContains: 命中 (或未命中) 者排前,组内继续比较下一条
// ==========================================


use crate::config::EngineConfig;
use crate::domain::types::SortDirection;
use crate::domain::vendor::VendorRecord;
use crate::engine::schema::{Criterion, CriterionKind, SetupSchema};
use serde_json::{json, Value};
use std::cmp::Ordering;

// ==========================================
// PriorityClassifier - 优先级排序器
// ==========================================
pub struct PriorityClassifier<'a> {
    schema: &'a SetupSchema,
    config: EngineConfig,
}

impl<'a> PriorityClassifier<'a> {
    /// 构造函数
    ///
    /// # 参数
    /// - `schema`: 已校验的配置结构
    /// - `config`: 引擎配置 (子串匹配大小写规则)
    pub fn new(schema: &'a SetupSchema, config: EngineConfig) -> Self {
        Self { schema, config }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 排序供应商列表
    ///
    /// # 返回
    /// 排序后的列表（按优先级从高到低）
    pub fn sort(&self, mut vendors: Vec<VendorRecord>) -> Vec<VendorRecord> {
        vendors.sort_by(|a, b| self.compare(a, b));
        vendors
    }

    /// 对借用的供应商排序
    pub fn rank<'v>(&self, vendors: &'v [VendorRecord]) -> Vec<&'v VendorRecord> {
        let mut ranked: Vec<&VendorRecord> = vendors.iter().collect();
        ranked.sort_by(|a, b| self.compare(a, b));
        ranked
    }

    /// 比较两个供应商的优先级
    ///
    /// # 返回
    /// Ordering::Less 表示 a 优先于 b
    pub fn compare(&self, a: &VendorRecord, b: &VendorRecord) -> Ordering {
        for criterion in &self.schema.criteria {
            match self.compare_by(criterion, a.cell(criterion.col), b.cell(criterion.col)) {
                Ordering::Equal => {}
                other => return other,
            }
        }
        a.row_index.cmp(&b.row_index)
    }

    // ==========================================
    // 单条规则比较
    // ==========================================

    fn compare_by(&self, criterion: &Criterion, a: &str, b: &str) -> Ordering {
        match &criterion.kind {
            CriterionKind::String(direction) => apply_direction(a.cmp(b), *direction),
            CriterionKind::Number(direction) => compare_numbers(a, b, *direction),
            CriterionKind::Enum {
                order,
                all_others_rank,
            } => {
                let rank_a = enum_rank(order, *all_others_rank, a);
                let rank_b = enum_rank(order, *all_others_rank, b);
                rank_a.cmp(&rank_b)
            }
            CriterionKind::Contains(needle) => {
                // 命中者排前: false < true
                let miss_a = !self.matches_substring(a, needle);
                let miss_b = !self.matches_substring(b, needle);
                miss_a.cmp(&miss_b)
            }
            CriterionKind::NotContains(needle) => {
                let hit_a = self.matches_substring(a, needle);
                let hit_b = self.matches_substring(b, needle);
                hit_a.cmp(&hit_b)
            }
        }
    }

    /// 子串匹配 (遵循配置的大小写规则)
    pub fn matches_substring(&self, value: &str, needle: &str) -> bool {
        self.config.normalize(value).contains(&self.config.normalize(needle))
    }

    /// 生成排序原因 (可解释性)
    ///
    /// # 返回
    /// JSON 格式: 每条规则的列名、类型与该供应商的取值/名次
    pub fn generate_sort_reason(&self, vendor: &VendorRecord) -> String {
        let keys: Vec<Value> = self
            .schema
            .criteria
            .iter()
            .map(|criterion| {
                let raw = vendor.cell(criterion.col);
                let column = self
                    .schema
                    .col_names
                    .get(criterion.col)
                    .cloned()
                    .unwrap_or_default();
                let key = match &criterion.kind {
                    CriterionKind::String(direction) => {
                        json!({"type": "String", "direction": direction.to_string(), "value": raw})
                    }
                    CriterionKind::Number(direction) => json!({
                        "type": "Number",
                        "direction": direction.to_string(),
                        "value": parse_number(raw),
                    }),
                    CriterionKind::Enum {
                        order,
                        all_others_rank,
                    } => json!({
                        "type": "Enum",
                        "value": raw,
                        "rank": enum_rank(order, *all_others_rank, raw),
                    }),
                    CriterionKind::Contains(needle) => json!({
                        "type": "Contains",
                        "needle": needle,
                        "matched": self.matches_substring(raw, needle),
                    }),
                    CriterionKind::NotContains(needle) => json!({
                        "type": "Does not contain",
                        "needle": needle,
                        "matched": self.matches_substring(raw, needle),
                    }),
                };
                json!({"priority_id": criterion.priority_id, "column": column, "key": key})
            })
            .collect();

        json!({"row_index": vendor.row_index, "sort_keys": keys}).to_string()
    }
}

// ==========================================
// 辅助函数
// ==========================================

fn apply_direction(ord: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => ord,
        SortDirection::Descending => ord.reverse(),
    }
}

/// 解析数值,非有限值视为无法解析
fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 数值比较: 无法解析的值始终排最后 (不受方向影响)
fn compare_numbers(a: &str, b: &str, direction: SortDirection) -> Ordering {
    match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => {
            apply_direction(x.partial_cmp(&y).unwrap_or(Ordering::Equal), direction)
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// 枚举名次: 列出的值取其位置; 未列出的值取 "<All others>" 位置,否则排在所有列出值之后
pub(crate) fn enum_rank(order: &[String], all_others_rank: Option<usize>, raw: &str) -> usize {
    let value = raw.trim();
    order
        .iter()
        .position(|v| v == value)
        .or(all_others_rank)
        .unwrap_or(order.len())
}
