// ==========================================
// 市集摊位分配引擎 - 分配调度器
// ==========================================
// 用途: 协调配置解析、排序、准入与容量跟踪
// 流程: 解析配置 → 排序供应商 → 逐日逐供应商放置 → 汇总统计
// 红线: 贪心放置,不回溯; 取消只在日期之间检查; 不返回半成品
// 同桌: 绑定同桌伙伴列时,双方共用一张新桌的左右两侧
// ==========================================

use crate::config::EngineConfig;
use crate::domain::assignment::{AssignmentObject, VendorAssignmentResult};
use crate::domain::setup::SetupObject;
use crate::domain::types::TablePreference;
use crate::domain::vendor::VendorRecord;
use crate::engine::capacity::{CapacityTracker, Reservation};
use crate::engine::eligibility::EligibilityFilter;
use crate::engine::error::AssignmentError;
use crate::engine::priority::PriorityClassifier;
use crate::engine::schema::SetupSchema;
use crate::engine::statistics::StatisticsAggregator;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

// ==========================================
// AssignmentScheduler - 分配调度器
// ==========================================
pub struct AssignmentScheduler {
    config: EngineConfig,
    aggregator: StatisticsAggregator,
}

impl AssignmentScheduler {
    /// 构造函数
    ///
    /// # 参数
    /// - `config`: 引擎配置 (运行期间只读)
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            aggregator: StatisticsAggregator::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 执行一次完整分配
    pub fn run(&self, setup: &SetupObject) -> Result<AssignmentObject, AssignmentError> {
        self.run_with_cancellation(setup, &CancellationToken::new())
    }

    /// 执行一次完整分配 (可取消)
    ///
    /// # 返回
    /// - Ok(AssignmentObject): 全部日期处理完成
    /// - Err(AssignmentError::Config): 配置结构错误
    /// - Err(AssignmentError::Cancelled): 在某两个日期之间被取消
    pub fn run_with_cancellation(
        &self,
        setup: &SetupObject,
        cancel: &CancellationToken,
    ) -> Result<AssignmentObject, AssignmentError> {
        self.run_with_progress(setup, cancel, |_, _| {})
    }

    /// 执行一次完整分配 (可取消,逐日回报进度)
    ///
    /// # 参数
    /// - `cancel`: 取消令牌,每个日期开始前检查
    /// - `on_date_done`: 每个日期放置完成后回调 (日期序号, 日期)
    #[instrument(skip(self, setup, cancel, on_date_done), fields(
        rows = setup.row_count(),
        dates = setup.market_dates.len(),
        sections = setup.sections.len()
    ))]
    pub fn run_with_progress<F>(
        &self,
        setup: &SetupObject,
        cancel: &CancellationToken,
        mut on_date_done: F,
    ) -> Result<AssignmentObject, AssignmentError>
    where
        F: FnMut(usize, &str),
    {
        // ==========================================
        // 步骤1: 解析配置结构
        // ==========================================
        let schema = SetupSchema::resolve(setup)?;

        info!(
            contains_mode = %self.config.contains_mode,
            case_insensitive_match = self.config.case_insensitive_match,
            table_code_width = self.config.table_code_width,
            max_assignments_per_vendor = ?schema.max_assignments_per_vendor,
            half_table_cap = ?schema.half_table_cap,
            table_share = schema.table_share_col.is_some(),
            "开始执行分配流程"
        );

        let filter = EligibilityFilter::new(&schema, self.config);
        let classifier = PriorityClassifier::new(&schema, self.config);

        // ==========================================
        // 步骤2: 筛选并排序供应商 (只排一次)
        // ==========================================
        debug!("步骤2: 筛选并排序供应商");

        let candidates = self.select_candidates(&schema, &filter, setup.vendor_records());
        let ranked = classifier.sort(candidates);
        let by_email: HashMap<&str, &VendorRecord> =
            ranked.iter().map(|v| (schema.email(v), v)).collect();

        info!(ranked_count = ranked.len(), "供应商排序完成");

        // ==========================================
        // 步骤3: 逐日放置
        // ==========================================
        debug!("步骤3: 逐日放置供应商");

        let mut tracker = CapacityTracker::new(
            &schema.sections,
            schema.half_table_cap,
            self.config.table_code_width,
        );
        let mut assigned_counts: HashMap<usize, u32> = HashMap::new();
        let mut results = Vec::new();

        for (date_idx, market_date) in schema.dates.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(completed_dates = date_idx, "分配流程已取消");
                return Err(AssignmentError::Cancelled {
                    completed_dates: date_idx,
                });
            }

            let before = results.len();
            let mut placed_today: HashSet<usize> = HashSet::new();

            for vendor in &ranked {
                if placed_today.contains(&vendor.row_index)
                    || !Self::under_cap(&schema, &assigned_counts, vendor)
                {
                    continue;
                }

                let sections = filter.eligible_sections(vendor, date_idx);
                if sections.is_empty() {
                    continue;
                }

                let preference = schema.table_preference(vendor);

                // 同桌伙伴: 两人占同一张新桌的左右两侧
                if let Some(partner) = self.share_partner(
                    &schema,
                    &by_email,
                    vendor,
                    preference,
                    &placed_today,
                    &assigned_counts,
                ) {
                    if let Some((section_idx, left, right)) =
                        self.place_shared(&mut tracker, &filter, date_idx, &sections, partner)
                    {
                        debug!(
                            date = %market_date.date,
                            email = schema.email(vendor),
                            partner = schema.email(partner),
                            table_code = %left.table_code,
                            "同桌伙伴分配"
                        );
                        for (who, reservation) in [(vendor, left), (partner, right)] {
                            results.push(build_result(&schema, who, &market_date.date, section_idx, reservation));
                            placed_today.insert(who.row_index);
                            *assigned_counts.entry(who.row_index).or_insert(0) += 1;
                        }
                        continue;
                    }
                }

                match self.place(&mut tracker, date_idx, &sections, preference) {
                    Some((section_idx, reservation)) => {
                        results.push(build_result(&schema, vendor, &market_date.date, section_idx, reservation));
                        placed_today.insert(vendor.row_index);
                        *assigned_counts.entry(vendor.row_index).or_insert(0) += 1;
                    }
                    None => {
                        debug!(
                            date = %market_date.date,
                            email = schema.email(vendor),
                            preference = %preference,
                            "无可用桌位,本日未分配"
                        );
                    }
                }
            }

            info!(
                date = %market_date.date,
                assigned = results.len() - before,
                "单日分配完成"
            );
            on_date_done(date_idx, market_date.date.as_str());
        }

        // ==========================================
        // 步骤4: 汇总统计
        // ==========================================
        let assignment_statistics = self.aggregator.aggregate(&results);
        let object = AssignmentObject {
            total_vendors_assigned: self.aggregator.total_vendors_assigned(&results),
            total_tables_assigned: self.aggregator.total_tables_assigned(&results),
            assignment_statistics,
            assignment_date: Utc::now().to_rfc3339(),
            vendor_assignments: results,
        };

        info!(
            total_vendors_assigned = object.total_vendors_assigned,
            total_tables_assigned = object.total_tables_assigned,
            "分配流程完成"
        );

        Ok(object)
    }

    /// 剔除空邮箱、重复邮箱与未通过子串过滤的行
    fn select_candidates(
        &self,
        schema: &SetupSchema,
        filter: &EligibilityFilter,
        vendors: Vec<VendorRecord>,
    ) -> Vec<VendorRecord> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::with_capacity(vendors.len());

        for vendor in vendors {
            let email = schema.email(&vendor).to_string();
            if email.is_empty() {
                warn!(row_index = vendor.row_index, "邮箱为空,跳过该行");
                continue;
            }
            if !seen.insert(email.clone()) {
                warn!(row_index = vendor.row_index, email = %email, "邮箱重复,保留首行");
                continue;
            }
            if let Err(reason) = filter.check_substring_filters(&vendor) {
                warn!(row_index = vendor.row_index, email = %email, reason = %reason, "未通过子串过滤");
                continue;
            }
            candidates.push(vendor);
        }

        candidates
    }

    fn under_cap(schema: &SetupSchema, counts: &HashMap<usize, u32>, vendor: &VendorRecord) -> bool {
        let count = counts.get(&vendor.row_index).copied().unwrap_or(0);
        schema
            .max_assignments_per_vendor
            .map_or(true, |max| count < max)
    }

    /// 查找可同桌的伙伴
    ///
    /// 双方都接受半桌,伙伴是另一位候选供应商、当日未分配且未达上限
    fn share_partner<'v>(
        &self,
        schema: &SetupSchema,
        by_email: &HashMap<&str, &'v VendorRecord>,
        vendor: &VendorRecord,
        preference: TablePreference,
        placed_today: &HashSet<usize>,
        counts: &HashMap<usize, u32>,
    ) -> Option<&'v VendorRecord> {
        if !preference.allows_half() {
            return None;
        }
        let partner_email = schema.table_share_email(vendor)?;
        let partner = match by_email.get(partner_email) {
            Some(partner) => *partner,
            None => {
                debug!(email = schema.email(vendor), partner = partner_email, "同桌伙伴不在候选名单中");
                return None;
            }
        };

        if partner.row_index == vendor.row_index
            || placed_today.contains(&partner.row_index)
            || !Self::under_cap(schema, counts, partner)
            || !schema.table_preference(partner).allows_half()
        {
            return None;
        }
        Some(partner)
    }

    /// 同桌放置: 在双方都可用的分区中按顺序找一张新桌
    fn place_shared(
        &self,
        tracker: &mut CapacityTracker,
        filter: &EligibilityFilter,
        date_idx: usize,
        sections: &[usize],
        partner: &VendorRecord,
    ) -> Option<(usize, Reservation, Reservation)> {
        let partner_sections = filter.eligible_sections(partner, date_idx);
        for &section_idx in sections.iter().filter(|idx| partner_sections.contains(*idx)) {
            match tracker.reserve_shared(date_idx, section_idx) {
                Ok((left, right)) => return Some((section_idx, left, right)),
                Err(e) => debug!(error = %e, "同桌预留失败"),
            }
        }
        None
    }

    /// 放置单个供应商: 先按分区顺序找整桌,再按分区顺序找半桌
    fn place(
        &self,
        tracker: &mut CapacityTracker,
        date_idx: usize,
        sections: &[usize],
        preference: TablePreference,
    ) -> Option<(usize, Reservation)> {
        if preference.allows_full() {
            for &section_idx in sections {
                if let Ok(reservation) = tracker.reserve_full(date_idx, section_idx) {
                    return Some((section_idx, reservation));
                }
            }
        }

        if preference.allows_half() {
            for &section_idx in sections {
                match tracker.reserve_half(date_idx, section_idx) {
                    Ok(reservation) => return Some((section_idx, reservation)),
                    Err(e) => debug!(error = %e, "半桌预留失败"),
                }
            }
        }

        None
    }
}

impl Default for AssignmentScheduler {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn build_result(
    schema: &SetupSchema,
    vendor: &VendorRecord,
    date: &str,
    section_idx: usize,
    reservation: Reservation,
) -> VendorAssignmentResult {
    let section = &schema.sections[section_idx];
    VendorAssignmentResult {
        email: schema.email(vendor).to_string(),
        date: date.to_string(),
        table_code: reservation.table_code,
        table_choice: reservation.table_choice,
        section: section.name.clone(),
        tier: section.tier_name().map(String::from),
        location: section.location_name().map(String::from),
    }
}

/// 使用默认引擎配置执行分配
pub fn assign_setup(setup: &SetupObject) -> Result<AssignmentObject, AssignmentError> {
    AssignmentScheduler::default().run(setup)
}
