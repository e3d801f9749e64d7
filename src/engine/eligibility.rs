// ==========================================
// 市集摊位分配引擎 - 准入判定
// ==========================================
// 职责: 判定供应商在某日期能否使用某分区
// 输入: 供应商记录 + 分区 + 日期序号
// 输出: 是否准入 / 不准入原因
// 红线: 纯判定,无副作用
// ==========================================
// 规则:
// 1) 子串硬过滤 (仅 FILTERING 模式): 不满足 Contains/NotContains 的供应商整轮不准入
// 2) 日期参与: 日期列为真值,或列出至少一个已知等级,才参与该日
// 3) 等级: 分区有等级时,供应商等级列/日期列列出的等级须包含该等级
// 4) 位置: 分区有位置时,供应商位置列须包含该位置
// ==========================================

use crate::config::EngineConfig;
use crate::domain::setup::SectionObject;
use crate::domain::types::ContainsMode;
use crate::domain::vendor::VendorRecord;
use crate::engine::schema::SetupSchema;
use std::fmt;
use tracing::debug;

// ==========================================
// DateParticipation - 日期列取值
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateParticipation {
    Absent,              // 不参与 (空/否)
    Present,             // 参与 (是)
    Listed(Vec<String>), // 非布尔文本,按逗号拆分 (可能是等级清单)
}

impl DateParticipation {
    /// 解析日期列单元格
    ///
    /// 布尔类文本按布尔解析; 其他非空文本按逗号拆分保留,
    /// 是否算参与由准入判定器结合已知等级决定
    pub fn parse(raw: &str) -> Self {
        let value = raw.trim();
        match value.to_lowercase().as_str() {
            "" | "false" | "no" | "n" | "0" | "-" => DateParticipation::Absent,
            "true" | "yes" | "y" | "1" | "x" | "✓" | "✔" | "checked" => DateParticipation::Present,
            _ => {
                let tokens: Vec<String> = value
                    .split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect();
                if tokens.is_empty() {
                    DateParticipation::Absent
                } else {
                    DateParticipation::Listed(tokens)
                }
            }
        }
    }

    pub fn participates(&self) -> bool {
        !matches!(self, DateParticipation::Absent)
    }
}

// ==========================================
// IneligibleReason - 不准入原因
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IneligibleReason {
    SubstringFilter { priority_id: i64 },
    NotParticipating { date: String },
    TierMismatch { tier: String },
    LocationMismatch { location: String },
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IneligibleReason::SubstringFilter { priority_id } => {
                write!(f, "SUBSTRING_FILTER: priority_id={}", priority_id)
            }
            IneligibleReason::NotParticipating { date } => {
                write!(f, "NOT_PARTICIPATING: date={}", date)
            }
            IneligibleReason::TierMismatch { tier } => write!(f, "TIER_MISMATCH: tier={}", tier),
            IneligibleReason::LocationMismatch { location } => {
                write!(f, "LOCATION_MISMATCH: location={}", location)
            }
        }
    }
}

// ==========================================
// EligibilityFilter - 准入判定器
// ==========================================
pub struct EligibilityFilter<'a> {
    schema: &'a SetupSchema,
    config: EngineConfig,
}

impl<'a> EligibilityFilter<'a> {
    pub fn new(schema: &'a SetupSchema, config: EngineConfig) -> Self {
        Self { schema, config }
    }

    /// 判定供应商在某日期能否使用某分区
    pub fn is_eligible(&self, vendor: &VendorRecord, section: &SectionObject, date_idx: usize) -> bool {
        self.check(vendor, section, date_idx).is_ok()
    }

    /// 逐项判定,返回首个不准入原因
    pub fn check(
        &self,
        vendor: &VendorRecord,
        section: &SectionObject,
        date_idx: usize,
    ) -> Result<(), IneligibleReason> {
        self.check_substring_filters(vendor)?;

        let participation = self.date_participation(vendor, date_idx);
        if !participation.participates() {
            return Err(IneligibleReason::NotParticipating {
                date: self
                    .schema
                    .dates
                    .get(date_idx)
                    .map(|d| d.date.clone())
                    .unwrap_or_default(),
            });
        }

        if let Some(tier) = section.tier_name() {
            if !self.tier_allowed(vendor, &participation, tier) {
                return Err(IneligibleReason::TierMismatch {
                    tier: tier.to_string(),
                });
            }
        }

        if let Some(location) = section.location_name() {
            let allowed = self
                .schema
                .location_cell(vendor)
                .map(|cell| self.tag_list_contains(cell, location))
                .unwrap_or(true);
            if !allowed {
                return Err(IneligibleReason::LocationMismatch {
                    location: location.to_string(),
                });
            }
        }

        Ok(())
    }

    /// 子串硬过滤 (与日期、分区无关,整轮有效)
    pub fn check_substring_filters(&self, vendor: &VendorRecord) -> Result<(), IneligibleReason> {
        if self.config.contains_mode == ContainsMode::RankingOnly {
            return Ok(());
        }

        for criterion in &self.schema.criteria {
            if let Some((needle, must_contain)) = criterion.substring() {
                let hit = self
                    .config
                    .normalize(vendor.cell(criterion.col))
                    .contains(&self.config.normalize(needle));
                if hit != must_contain {
                    return Err(IneligibleReason::SubstringFilter {
                        priority_id: criterion.priority_id,
                    });
                }
            }
        }
        Ok(())
    }

    /// 供应商在该日期可用的分区序号 (按声明顺序)
    pub fn eligible_sections(&self, vendor: &VendorRecord, date_idx: usize) -> Vec<usize> {
        self.schema
            .sections
            .iter()
            .enumerate()
            .filter(|(_, section)| self.is_eligible(vendor, section, date_idx))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// 供应商是否参与该日期
    pub fn participates(&self, vendor: &VendorRecord, date_idx: usize) -> bool {
        self.date_participation(vendor, date_idx).participates()
    }

    /// 日期列的有效取值
    ///
    /// 非布尔文本只有列出至少一个已知等级时才算参与,
    /// 其余文本 (如 "n/a"、"not attending") 按不参与处理
    pub fn date_participation(&self, vendor: &VendorRecord, date_idx: usize) -> DateParticipation {
        let raw = self.schema.date_cell(date_idx, vendor);
        match DateParticipation::parse(raw) {
            DateParticipation::Listed(tokens) => {
                if tokens.iter().any(|t| self.is_known_tier(t)) {
                    DateParticipation::Listed(tokens)
                } else {
                    debug!(
                        row_index = vendor.row_index,
                        date_idx = date_idx,
                        value = raw,
                        "日期列无法识别,按不参与处理"
                    );
                    DateParticipation::Absent
                }
            }
            other => other,
        }
    }

    // ==========================================
    // 等级 / 位置匹配
    // ==========================================

    fn tier_allowed(&self, vendor: &VendorRecord, participation: &DateParticipation, tier: &str) -> bool {
        // 等级列
        if let Some(cell) = self.schema.tier_cell(vendor) {
            if !self.tag_list_contains(cell, tier) {
                return false;
            }
        }

        // 日期列列出的等级
        if let DateParticipation::Listed(tokens) = participation {
            if !tokens.iter().any(|t| self.same_text(t, tier)) {
                return false;
            }
        }

        true
    }

    fn is_known_tier(&self, token: &str) -> bool {
        self.schema.tier_names.iter().any(|n| self.same_text(n, token))
    }

    fn tag_list_contains(&self, cell: &str, tag: &str) -> bool {
        cell.split(',').any(|t| self.same_text(t, tag))
    }

    fn same_text(&self, a: &str, b: &str) -> bool {
        self.config.normalize(a) == self.config.normalize(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::setup::{LocationObject, MarketDateObject, PriorityObject, SetupObject, TierObject};
    use crate::domain::types::DataType;

    // ==========================================
    // 测试辅助函数
    // ==========================================

    fn create_test_setup() -> SetupObject {
        SetupObject {
            col_names: vec![
                "Email".to_string(),
                "Tier".to_string(),
                "Location".to_string(),
                "Products".to_string(),
                "2025-03-17".to_string(),
                "2025-03-18".to_string(),
            ],
            col_values: vec![
                vec!["a@test.com", "b@test.com", "c@test.com"],
                vec!["Gold", "Silver", ""],
                vec!["Main Hall, Side Room", "Side Room", "Main Hall"],
                vec!["handmade soap", "resale", "handmade art"],
                vec!["yes", "Gold,Silver", "Silver"],
                vec!["", "no", "Bronze"],
            ]
            .into_iter()
            .map(|c| c.into_iter().map(String::from).collect())
            .collect(),
            market_dates: vec![
                MarketDateObject {
                    date: "2025-03-17".to_string(),
                    col_name_idx: 4,
                },
                MarketDateObject {
                    date: "2025-03-18".to_string(),
                    col_name_idx: 5,
                },
            ],
            tiers: vec![
                TierObject { id: 1, name: "Gold".to_string() },
                TierObject { id: 2, name: "Silver".to_string() },
            ],
            ..Default::default()
        }
    }

    fn section(name: &str, tier: Option<&str>, location: Option<&str>) -> SectionObject {
        SectionObject {
            name: name.to_string(),
            tier: tier.map(|t| TierObject {
                id: 1,
                name: t.to_string(),
            }),
            location: location.map(|l| LocationObject { name: l.to_string() }),
            count: 1,
        }
    }

    fn with_filter<F: FnOnce(&EligibilityFilter, &[VendorRecord])>(setup: &SetupObject, config: EngineConfig, f: F) {
        let schema = SetupSchema::resolve(setup).unwrap();
        let filter = EligibilityFilter::new(&schema, config);
        let vendors = setup.vendor_records();
        f(&filter, &vendors);
    }

    // ==========================================
    // 日期参与
    // ==========================================

    #[test]
    fn test_date_participation_parse() {
        assert_eq!(DateParticipation::parse("  "), DateParticipation::Absent);
        assert_eq!(DateParticipation::parse("No"), DateParticipation::Absent);
        assert_eq!(DateParticipation::parse("TRUE"), DateParticipation::Present);
        assert_eq!(
            DateParticipation::parse("Gold, Silver"),
            DateParticipation::Listed(vec!["Gold".to_string(), "Silver".to_string()])
        );
        assert_eq!(DateParticipation::parse(" , "), DateParticipation::Absent);
    }

    #[test]
    fn test_missing_date_flag_is_ineligible() {
        let setup = create_test_setup();
        with_filter(&setup, EngineConfig::default(), |filter, vendors| {
            let open = section("A", None, None);
            assert!(filter.is_eligible(&vendors[0], &open, 0));
            assert_eq!(
                filter.check(&vendors[0], &open, 1),
                Err(IneligibleReason::NotParticipating {
                    date: "2025-03-18".to_string()
                })
            );
            assert!(!filter.participates(&vendors[1], 1));
        });
    }

    // ==========================================
    // 等级与位置
    // ==========================================

    #[test]
    fn test_tier_column_must_match_section_tier() {
        let setup = create_test_setup();
        with_filter(&setup, EngineConfig::default(), |filter, vendors| {
            let gold = section("G", Some("gold"), None);
            assert!(filter.is_eligible(&vendors[0], &gold, 0));
            assert!(matches!(
                filter.check(&vendors[1], &gold, 0),
                Err(IneligibleReason::TierMismatch { .. })
            ));
        });
    }

    #[test]
    fn test_date_cell_tier_list_restricts_tiers() {
        let mut setup = create_test_setup();
        // 不绑定等级列,只看日期列
        setup.col_names[1] = "Rank".to_string();
        with_filter(&setup, EngineConfig::default(), |filter, vendors| {
            let gold = section("G", Some("Gold"), None);
            let silver = section("S", Some("Silver"), None);

            // c 的日期列只列出 Silver
            assert!(!filter.is_eligible(&vendors[2], &gold, 0));
            assert!(filter.is_eligible(&vendors[2], &silver, 0));
            // "Bronze" 不是已知等级,该日不参与
            assert!(!filter.participates(&vendors[2], 1));
            assert_eq!(
                filter.check(&vendors[2], &gold, 1),
                Err(IneligibleReason::NotParticipating {
                    date: "2025-03-18".to_string()
                })
            );
        });
    }

    #[test]
    fn test_unrecognized_date_text_is_not_participation() {
        let mut setup = create_test_setup();
        setup.col_values[4] = vec!["not attending", "n/a", "Silver, maybe"]
            .into_iter()
            .map(String::from)
            .collect();
        with_filter(&setup, EngineConfig::default(), |filter, vendors| {
            let open = section("A", None, None);
            assert!(!filter.is_eligible(&vendors[0], &open, 0));
            assert!(!filter.is_eligible(&vendors[1], &open, 0));
            assert_eq!(filter.date_participation(&vendors[1], 0), DateParticipation::Absent);
            // 含已知等级的清单仍算参与
            assert!(filter.is_eligible(&vendors[2], &open, 0));
        });
    }

    #[test]
    fn test_location_column_must_list_section_location() {
        let setup = create_test_setup();
        with_filter(&setup, EngineConfig::default(), |filter, vendors| {
            let main = section("M", None, Some("Main Hall"));
            assert!(filter.is_eligible(&vendors[0], &main, 0));
            assert_eq!(
                filter.check(&vendors[1], &main, 0),
                Err(IneligibleReason::LocationMismatch {
                    location: "Main Hall".to_string()
                })
            );
        });
    }

    #[test]
    fn test_eligible_sections_in_declaration_order() {
        let mut setup = create_test_setup();
        setup.col_names[1] = "Rank".to_string();
        setup.col_names[2] = "Area".to_string();
        setup.sections = vec![
            section("A", None, None),
            section("G", Some("Gold"), None),
            section("B", Some("Bronze"), None),
        ];
        with_filter(&setup, EngineConfig::default(), |filter, vendors| {
            // b 的日期列列出 Gold,Silver
            assert_eq!(filter.eligible_sections(&vendors[1], 0), vec![0, 1]);
            assert!(filter.eligible_sections(&vendors[1], 1).is_empty());
            // a 只写了 yes,不受等级清单限制
            assert_eq!(filter.eligible_sections(&vendors[0], 0), vec![0, 1, 2]);
        });
    }

    // ==========================================
    // 子串硬过滤
    // ==========================================

    #[test]
    fn test_contains_filter_only_in_filtering_mode() {
        let mut setup = create_test_setup();
        setup.priority = vec![PriorityObject {
            id: 1,
            col_name_idx: 3,
            data_type: DataType::Contains,
            sorting_order: "Handmade".to_string(),
        }];
        let open = section("A", None, None);

        with_filter(&setup, EngineConfig::default(), |filter, vendors| {
            assert!(filter.is_eligible(&vendors[0], &open, 0));
            assert_eq!(
                filter.check(&vendors[1], &open, 0),
                Err(IneligibleReason::SubstringFilter { priority_id: 1 })
            );
        });

        let ranking_only = EngineConfig {
            contains_mode: ContainsMode::RankingOnly,
            ..EngineConfig::default()
        };
        with_filter(&setup, ranking_only, |filter, vendors| {
            assert!(filter.is_eligible(&vendors[1], &open, 0));
        });
    }

    #[test]
    fn test_not_contains_filter_rejects_matches() {
        let mut setup = create_test_setup();
        setup.priority = vec![PriorityObject {
            id: 7,
            col_name_idx: 3,
            data_type: DataType::NotContains,
            sorting_order: "resale".to_string(),
        }];
        with_filter(&setup, EngineConfig::default(), |filter, vendors| {
            assert!(filter.check_substring_filters(&vendors[0]).is_ok());
            assert!(filter.check_substring_filters(&vendors[1]).is_err());
        });
    }
}
