// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================
// 以"按行"的方式描述供应商,build() 时转成按列存储的 SetupObject
// ==========================================

use market_assign::domain::types::DataType;
use market_assign::{
    AssignmentOptionObject, LocationObject, MarketDateObject, PriorityObject, SectionObject,
    SetupObject, TierObject,
};

// ==========================================
// SetupObject 构建器
// ==========================================

pub struct SetupBuilder {
    attributes: Vec<String>,
    dates: Vec<String>,
    rows: Vec<(Vec<String>, Vec<String>)>,
    priorities: Vec<(i64, String, DataType, String)>,
    enum_orders: Vec<(String, Vec<String>)>,
    tiers: Vec<String>,
    sections: Vec<SectionObject>,
    options: AssignmentOptionObject,
}

impl SetupBuilder {
    /// # 参数
    /// - `attributes`: 非日期列的列名 (日期列由 date() 追加在其后)
    pub fn new(attributes: &[&str]) -> Self {
        Self {
            attributes: attributes.iter().map(|s| s.to_string()).collect(),
            dates: Vec::new(),
            rows: Vec::new(),
            priorities: Vec::new(),
            enum_orders: Vec::new(),
            tiers: Vec::new(),
            sections: Vec::new(),
            options: AssignmentOptionObject::default(),
        }
    }

    pub fn date(mut self, date: &str) -> Self {
        self.dates.push(date.to_string());
        self
    }

    /// 追加一行供应商: 属性值 + 每个日期的报名值
    pub fn vendor(mut self, attributes: &[&str], dates: &[&str]) -> Self {
        self.rows.push((
            attributes.iter().map(|s| s.to_string()).collect(),
            dates.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    pub fn priority(mut self, id: i64, column: &str, data_type: DataType, sorting_order: &str) -> Self {
        self.priorities
            .push((id, column.to_string(), data_type, sorting_order.to_string()));
        self
    }

    pub fn enum_order(mut self, column: &str, order: &[&str]) -> Self {
        self.enum_orders.push((
            column.to_string(),
            order.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    pub fn tier(mut self, name: &str) -> Self {
        self.tiers.push(name.to_string());
        self
    }

    pub fn section(mut self, name: &str, tier: Option<&str>, location: Option<&str>, count: u32) -> Self {
        self.sections.push(SectionObject {
            name: name.to_string(),
            location: location.map(|l| LocationObject {
                name: l.to_string(),
            }),
            tier: tier.map(|t| TierObject {
                id: 0,
                name: t.to_string(),
            }),
            count,
        });
        self
    }

    pub fn max_per_vendor(mut self, max: u32) -> Self {
        self.options.max_assignments_per_vendor = Some(max);
        self
    }

    pub fn half_cap(mut self, cap: f64) -> Self {
        self.options.max_half_table_proportion_per_section = Some(cap);
        self
    }

    fn col_index(&self, column: &str) -> usize {
        self.attributes
            .iter()
            .chain(self.dates.iter())
            .position(|c| c == column)
            .unwrap_or_else(|| panic!("unknown column {}", column))
    }

    pub fn build(self) -> SetupObject {
        let col_names: Vec<String> = self
            .attributes
            .iter()
            .chain(self.dates.iter())
            .cloned()
            .collect();

        let mut col_values = vec![Vec::new(); col_names.len()];
        for (attributes, dates) in &self.rows {
            for (idx, column) in col_values.iter_mut().enumerate() {
                let value = if idx < self.attributes.len() {
                    attributes.get(idx)
                } else {
                    dates.get(idx - self.attributes.len())
                };
                column.push(value.cloned().unwrap_or_default());
            }
        }

        let enum_priority_order = if self.enum_orders.is_empty() {
            Vec::new()
        } else {
            let mut orders = vec![Vec::new(); col_names.len()];
            for (column, order) in &self.enum_orders {
                orders[self.col_index(column)] = order.clone();
            }
            orders
        };

        let priority = self
            .priorities
            .iter()
            .map(|(id, column, data_type, order)| PriorityObject {
                id: *id,
                col_name_idx: self.col_index(column),
                data_type: *data_type,
                sorting_order: order.clone(),
            })
            .collect();

        let market_dates = self
            .dates
            .iter()
            .enumerate()
            .map(|(idx, date)| MarketDateObject {
                date: date.clone(),
                col_name_idx: self.attributes.len() + idx,
            })
            .collect();

        let tiers = self
            .tiers
            .iter()
            .enumerate()
            .map(|(idx, name)| TierObject {
                id: idx as i64 + 1,
                name: name.clone(),
            })
            .collect();

        SetupObject {
            col_names,
            col_values,
            col_include: Vec::new(),
            enum_priority_order,
            priority,
            market_dates,
            tiers,
            locations: Vec::new(),
            sections: self.sections,
            assignment_options: self.options,
            email_col_idx: None,
            tier_col_idx: None,
            location_col_idx: None,
            table_choice_col_idx: None,
            table_share_col_idx: None,
        }
    }
}
