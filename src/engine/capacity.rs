// ==========================================
// 市集摊位分配引擎 - 桌位容量跟踪
// ==========================================
// 职责: 按 (日期, 分区) 记录整桌/半桌占用,分配桌号
// 输入: 分区定义 + 半桌占比上限 + 桌号宽度
// 输出: Reservation (桌号 + 整桌/半桌左右)
// 红线: 已用桌数 (整桌 + 半桌单元) 不超过 section.count
// ==========================================
// 半桌占比按桌单元计算: 一张桌占一侧或两侧都算一个半桌单元,
// 占比 = 半桌单元数 / section.count。新开半桌前检查占比,
// 填补已开半桌的另一侧不改变占比,总是允许。
// ==========================================

use crate::domain::setup::SectionObject;
use crate::domain::types::TableChoice;
use std::collections::HashMap;
use thiserror::Error;

const PROPORTION_EPSILON: f64 = 1e-9;

/// 一次成功的桌位预留
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub table_code: String,
    pub table_choice: TableChoice,
}

/// 桌位不足 (引擎内部错误,由调度器消化)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("分区桌位不足: date_idx={date_idx}, section={section}, reason={reason}")]
pub struct CapacityExceeded {
    pub date_idx: usize,
    pub section: String,
    pub reason: &'static str,
}

/// 单个 (日期, 分区) 的占用状态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionUsage {
    pub full_used: u32,
    pub half_units: u32,
    /// 只占了左侧的半桌桌号
    pub open_half: Option<String>,
    next_index: u32,
}

impl SectionUsage {
    /// 已消耗桌数
    pub fn tables_used(&self) -> u32 {
        self.full_used + self.half_units
    }
}

// ==========================================
// CapacityTracker - 容量跟踪器
// ==========================================
pub struct CapacityTracker<'a> {
    sections: &'a [SectionObject],
    half_table_cap: Option<f64>,
    code_width: usize,
    usage: HashMap<(usize, usize), SectionUsage>,
}

impl<'a> CapacityTracker<'a> {
    /// 构造函数
    ///
    /// # 参数
    /// - `sections`: 分区定义 (按声明顺序)
    /// - `half_table_cap`: 半桌占比上限 (0~1, None 表示不限制)
    /// - `code_width`: 桌号序号补零宽度
    pub fn new(sections: &'a [SectionObject], half_table_cap: Option<f64>, code_width: usize) -> Self {
        Self {
            sections,
            half_table_cap,
            code_width,
            usage: HashMap::new(),
        }
    }

    /// 查询占用状态
    pub fn usage(&self, date_idx: usize, section_idx: usize) -> SectionUsage {
        self.usage
            .get(&(date_idx, section_idx))
            .cloned()
            .unwrap_or_default()
    }

    /// 预留整桌
    pub fn reserve_full(&mut self, date_idx: usize, section_idx: usize) -> Result<Reservation, CapacityExceeded> {
        let (section, count) = self.section_info(date_idx, section_idx)?;
        let usage = self.usage.entry((date_idx, section_idx)).or_default();

        if usage.tables_used() >= count {
            return Err(exceeded(date_idx, &section.name, "NO_TABLE_LEFT"));
        }

        usage.full_used += 1;
        let table_code = next_code(usage, &section.name, self.code_width);
        Ok(Reservation {
            table_code,
            table_choice: TableChoice::Full,
        })
    }

    /// 预留半桌
    ///
    /// 有已开半桌时占其右侧; 否则在上限允许时新开一张桌的左侧
    pub fn reserve_half(&mut self, date_idx: usize, section_idx: usize) -> Result<Reservation, CapacityExceeded> {
        let (section, count) = self.section_info(date_idx, section_idx)?;
        let cap = self.half_table_cap;
        let usage = self.usage.entry((date_idx, section_idx)).or_default();

        if let Some(table_code) = usage.open_half.take() {
            return Ok(Reservation {
                table_code,
                table_choice: TableChoice::HalfRight,
            });
        }

        let table_code = open_half_table(usage, section, count, cap, date_idx, self.code_width)?;
        usage.open_half = Some(table_code.clone());
        Ok(Reservation {
            table_code,
            table_choice: TableChoice::HalfLeft,
        })
    }

    /// 为同桌伙伴预留一张新桌的左右两侧
    ///
    /// 不使用已开半桌; 新桌计入半桌单元,受半桌上限约束
    ///
    /// # 返回
    /// (左侧, 右侧) 两个预留,桌号相同
    pub fn reserve_shared(
        &mut self,
        date_idx: usize,
        section_idx: usize,
    ) -> Result<(Reservation, Reservation), CapacityExceeded> {
        let (section, count) = self.section_info(date_idx, section_idx)?;
        let cap = self.half_table_cap;
        let usage = self.usage.entry((date_idx, section_idx)).or_default();

        let table_code = open_half_table(usage, section, count, cap, date_idx, self.code_width)?;
        Ok((
            Reservation {
                table_code: table_code.clone(),
                table_choice: TableChoice::HalfLeft,
            },
            Reservation {
                table_code,
                table_choice: TableChoice::HalfRight,
            },
        ))
    }

    fn section_info(&self, date_idx: usize, section_idx: usize) -> Result<(&'a SectionObject, u32), CapacityExceeded> {
        let sections = self.sections;
        sections
            .get(section_idx)
            .map(|s| (s, s.count))
            .ok_or_else(|| exceeded(date_idx, &format!("#{}", section_idx), "UNKNOWN_SECTION"))
    }
}

/// 新开一张半桌: 检查剩余桌数与半桌上限,返回桌号
fn open_half_table(
    usage: &mut SectionUsage,
    section: &SectionObject,
    count: u32,
    cap: Option<f64>,
    date_idx: usize,
    width: usize,
) -> Result<String, CapacityExceeded> {
    if usage.tables_used() >= count {
        return Err(exceeded(date_idx, &section.name, "NO_TABLE_LEFT"));
    }
    if let Some(cap) = cap {
        let proportion = f64::from(usage.half_units + 1) / f64::from(count);
        if proportion > cap + PROPORTION_EPSILON {
            return Err(exceeded(date_idx, &section.name, "HALF_TABLE_CAP"));
        }
    }

    usage.half_units += 1;
    Ok(next_code(usage, &section.name, width))
}

fn next_code(usage: &mut SectionUsage, name: &str, width: usize) -> String {
    usage.next_index += 1;
    format_table_code(name, usage.next_index, width)
}

/// 桌号格式: 分区名 + 补零序号 (A01)
pub fn format_table_code(section: &str, index: u32, width: usize) -> String {
    format!("{}{:0width$}", section, index, width = width)
}

fn exceeded(date_idx: usize, section: &str, reason: &'static str) -> CapacityExceeded {
    CapacityExceeded {
        date_idx,
        section: section.to_string(),
        reason,
    }
}
