// ==========================================
// 市集摊位分配引擎 - 分配结果校验
// ==========================================
// 职责: 对照市集配置复核一份分配结果 (可来自引擎,也可为人工修改后的结果)
// 输入: SetupObject + AssignmentObject
// 输出: ValidationReport (违规列表 + 覆盖情况)
// 红线: 只读校验,不修改结果
// ==========================================

use crate::config::EngineConfig;
use crate::domain::assignment::AssignmentObject;
use crate::domain::setup::SetupObject;
use crate::domain::types::{TableChoice, TablePreference};
use crate::domain::vendor::VendorRecord;
use crate::engine::eligibility::EligibilityFilter;
use crate::engine::error::ConfigError;
use crate::engine::schema::SetupSchema;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use tracing::{debug, instrument};

// ==========================================
// Violation - 违规项
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Violation {
    TooManyAssignments { email: String, count: u32, max: u32 },
    DuplicateVendorDate { email: String, date: String },
    DoubleBookedTable { date: String, table_code: String, table_choice: TableChoice },
    CapacityOverrun { date: String, section: String, used: usize, count: u32 },
    HalfTableCapExceeded { date: String, section: String, half_units: usize, count: u32 },
    Ineligible { email: String, date: String, section: String, reason: String },
    PreferenceMismatch { email: String, date: String, table_choice: TableChoice, preference: String },
    UnknownVendor { email: String },
    UnknownSection { section: String },
    UnknownDate { date: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::TooManyAssignments { email, count, max } => {
                write!(f, "超出单供应商分配上限: email={}, count={}, max={}", email, count, max)
            }
            Violation::DuplicateVendorDate { email, date } => {
                write!(f, "同日重复分配: email={}, date={}", email, date)
            }
            Violation::DoubleBookedTable { date, table_code, table_choice } => {
                write!(f, "桌位重复占用: date={}, table={}, side={}", date, table_code, table_choice)
            }
            Violation::CapacityOverrun { date, section, used, count } => {
                write!(f, "分区桌数超限: date={}, section={}, used={}, count={}", date, section, used, count)
            }
            Violation::HalfTableCapExceeded { date, section, half_units, count } => write!(
                f,
                "半桌占比超限: date={}, section={}, half_units={}, count={}",
                date, section, half_units, count
            ),
            Violation::Ineligible { email, date, section, reason } => write!(
                f,
                "供应商不符合分区条件: email={}, date={}, section={}, reason={}",
                email, date, section, reason
            ),
            Violation::PreferenceMismatch { email, date, table_choice, preference } => write!(
                f,
                "桌位类型与偏好不符: email={}, date={}, table_choice={}, preference={}",
                email, date, table_choice, preference
            ),
            Violation::UnknownVendor { email } => write!(f, "未知供应商: email={}", email),
            Violation::UnknownSection { section } => write!(f, "未知分区: section={}", section),
            Violation::UnknownDate { date } => write!(f, "未知日期: date={}", date),
        }
    }
}

// ==========================================
// ValidationReport - 校验报告
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
    /// 至少报名一天但没有任何分配的供应商 (按行顺序)
    pub unassigned_vendors: Vec<String>,
    /// 分配次数 → 供应商数
    pub vendor_assignment_counts: BTreeMap<usize, usize>,
    /// 每个日期全部报名供应商都放下所需的桌数
    pub theoretical_max: BTreeMap<String, usize>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

// ==========================================
// AssignmentValidator - 结果校验器
// ==========================================
pub struct AssignmentValidator {
    schema: SetupSchema,
    config: EngineConfig,
    vendors: Vec<VendorRecord>,
}

impl AssignmentValidator {
    /// 构造函数
    ///
    /// # 返回
    /// - Err(ConfigError): 配置结构错误
    pub fn new(setup: &SetupObject, config: EngineConfig) -> Result<Self, ConfigError> {
        let schema = SetupSchema::resolve(setup)?;

        // 与调度器一致: 忽略空邮箱,重复邮箱保留首行
        let mut seen = HashSet::new();
        let vendors = setup
            .vendor_records()
            .into_iter()
            .filter(|v| {
                let email = schema.email(v);
                !email.is_empty() && seen.insert(email.to_string())
            })
            .collect();

        Ok(Self {
            schema,
            config,
            vendors,
        })
    }

    /// 校验分配结果
    #[instrument(skip(self, object), fields(results = object.vendor_assignments.len()))]
    pub fn validate(&self, object: &AssignmentObject) -> ValidationReport {
        let filter = EligibilityFilter::new(&self.schema, self.config);
        let by_email: HashMap<&str, &VendorRecord> =
            self.vendors.iter().map(|v| (self.schema.email(v), v)).collect();

        let mut violations = Vec::new();
        let mut per_vendor: HashMap<&str, u32> = HashMap::new();
        let mut vendor_dates = HashSet::new();
        let mut sides = HashSet::new();
        // (日期, 分区) → (整桌桌号, 半桌桌号)
        let mut tables: BTreeMap<(&str, &str), (HashSet<&str>, HashSet<&str>)> = BTreeMap::new();

        for result in &object.vendor_assignments {
            let email = result.email.as_str();
            let date = result.date.as_str();
            *per_vendor.entry(email).or_insert(0) += 1;

            if !vendor_dates.insert((email, date)) {
                violations.push(Violation::DuplicateVendorDate {
                    email: email.to_string(),
                    date: date.to_string(),
                });
            }

            // 整桌占两侧
            let claimed: &[TableChoice] = match result.table_choice {
                TableChoice::Full => &[TableChoice::HalfLeft, TableChoice::HalfRight],
                TableChoice::HalfLeft => &[TableChoice::HalfLeft],
                TableChoice::HalfRight => &[TableChoice::HalfRight],
            };
            if claimed
                .iter()
                .any(|side| !sides.insert((date, result.table_code.as_str(), *side)))
            {
                violations.push(Violation::DoubleBookedTable {
                    date: date.to_string(),
                    table_code: result.table_code.clone(),
                    table_choice: result.table_choice,
                });
            }

            let entry = tables.entry((date, result.section.as_str())).or_default();
            if result.table_choice.is_half() {
                entry.1.insert(result.table_code.as_str());
            } else {
                entry.0.insert(result.table_code.as_str());
            }

            let date_idx = self.schema.date_index(date);
            if date_idx.is_none() {
                violations.push(Violation::UnknownDate {
                    date: date.to_string(),
                });
            }
            let section = self.schema.section(&result.section);
            if section.is_none() {
                violations.push(Violation::UnknownSection {
                    section: result.section.clone(),
                });
            }
            let Some(vendor) = by_email.get(email) else {
                violations.push(Violation::UnknownVendor {
                    email: email.to_string(),
                });
                continue;
            };

            if let (Some(date_idx), Some(section)) = (date_idx, section) {
                if let Err(reason) = filter.check(vendor, section, date_idx) {
                    violations.push(Violation::Ineligible {
                        email: email.to_string(),
                        date: date.to_string(),
                        section: section.name.clone(),
                        reason: reason.to_string(),
                    });
                }
            }

            let preference = self.schema.table_preference(vendor);
            if !preference.accepts(result.table_choice) {
                violations.push(Violation::PreferenceMismatch {
                    email: email.to_string(),
                    date: date.to_string(),
                    table_choice: result.table_choice,
                    preference: preference.to_string(),
                });
            }
        }

        // 单供应商上限
        if let Some(max) = self.schema.max_assignments_per_vendor {
            let mut over: Vec<(&str, u32)> = per_vendor
                .iter()
                .filter(|(_, count)| **count > max)
                .map(|(email, count)| (*email, *count))
                .collect();
            over.sort();
            for (email, count) in over {
                violations.push(Violation::TooManyAssignments {
                    email: email.to_string(),
                    count,
                    max,
                });
            }
        }

        // 分区桌数与半桌占比
        for ((date, section_name), (full, half)) in &tables {
            let Some(section) = self.schema.section(section_name) else {
                continue;
            };
            let used = full.len() + half.len();
            if used > section.count as usize {
                violations.push(Violation::CapacityOverrun {
                    date: date.to_string(),
                    section: section.name.clone(),
                    used,
                    count: section.count,
                });
            }
            if let Some(cap) = self.schema.half_table_cap {
                let exceeded = section.count == 0
                    || half.len() as f64 / f64::from(section.count) > cap + 1e-9;
                if !half.is_empty() && exceeded {
                    violations.push(Violation::HalfTableCapExceeded {
                        date: date.to_string(),
                        section: section.name.clone(),
                        half_units: half.len(),
                        count: section.count,
                    });
                }
            }
        }

        let report = ValidationReport {
            violations,
            unassigned_vendors: self.unassigned_vendors(&filter, &per_vendor),
            vendor_assignment_counts: self.assignment_histogram(&per_vendor),
            theoretical_max: self.theoretical_max(&filter),
        };

        debug!(
            violations = report.violations.len(),
            unassigned = report.unassigned_vendors.len(),
            "分配结果校验完成"
        );

        report
    }

    fn unassigned_vendors(&self, filter: &EligibilityFilter, per_vendor: &HashMap<&str, u32>) -> Vec<String> {
        self.vendors
            .iter()
            .filter(|v| (0..self.schema.dates.len()).any(|d| filter.participates(v, d)))
            .map(|v| self.schema.email(v))
            .filter(|email| !per_vendor.contains_key(email))
            .map(String::from)
            .collect()
    }

    fn assignment_histogram(&self, per_vendor: &HashMap<&str, u32>) -> BTreeMap<usize, usize> {
        let mut histogram = BTreeMap::new();
        for vendor in &self.vendors {
            let count = per_vendor.get(self.schema.email(vendor)).copied().unwrap_or(0);
            *histogram.entry(count as usize).or_insert(0) += 1;
        }
        histogram
    }

    /// 整桌偏好的供应商计 2 个半桌,其余计 1 个,向上取整为桌数
    fn theoretical_max(&self, filter: &EligibilityFilter) -> BTreeMap<String, usize> {
        self.schema
            .dates
            .iter()
            .enumerate()
            .map(|(date_idx, market_date)| {
                let halves: usize = self
                    .vendors
                    .iter()
                    .filter(|v| filter.participates(v, date_idx))
                    .map(|v| match self.schema.table_preference(v) {
                        TablePreference::FullOnly => 2,
                        _ => 1,
                    })
                    .sum();
                (market_date.date.clone(), halves.div_ceil(2))
            })
            .collect()
    }
}
