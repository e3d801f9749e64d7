// ==========================================
// 市集摊位分配引擎 - 透视表 CSV 导出
// ==========================================
// 职责: 一行一个供应商,一列一个日期,单元格为当日桌号
// 输入: AssignmentObject
// 输出: CSV (email, section, tier, location, table_choice, <日期...>)
// ==========================================

use crate::domain::assignment::AssignmentObject;
use crate::exporter::error::ExportError;
use chrono::NaiveDate;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

const FIXED_HEADERS: [&str; 5] = ["email", "section", "tier", "location", "table_choice"];

/// 可识别的日期格式
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// 单个供应商的透视行
struct PivotRow<'a> {
    email: &'a str,
    sections: Vec<&'a str>,
    tiers: Vec<&'a str>,
    locations: Vec<&'a str>,
    choices: Vec<String>,
    /// (日期, 桌号)
    tables: Vec<(&'a str, &'a str)>,
}

fn push_unique<T: PartialEq>(values: &mut Vec<T>, value: T) {
    if !values.contains(&value) {
        values.push(value);
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw.trim(), fmt).ok())
}

/// 结果中出现的日期,可解析的按日历排序在前,其余按字符串排序
pub fn pivot_dates(object: &AssignmentObject) -> Vec<String> {
    let mut dates: Vec<&str> = Vec::new();
    for result in &object.vendor_assignments {
        push_unique(&mut dates, result.date.as_str());
    }
    dates.sort_by(|a, b| match (parse_date(a), parse_date(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.cmp(b),
    });
    dates.into_iter().map(String::from).collect()
}

/// 导出透视表 CSV
///
/// # 参数
/// - `object`: 分配结果
/// - `writer`: 输出目标
///
/// # 返回
/// 写出的数据行数 (不含表头)
pub fn export_pivot_csv<W: Write>(object: &AssignmentObject, writer: W) -> Result<usize, ExportError> {
    let dates = pivot_dates(object);

    // 按邮箱首次出现顺序聚合
    let mut rows: Vec<PivotRow> = Vec::new();
    for result in &object.vendor_assignments {
        let idx = match rows.iter().position(|r| r.email == result.email) {
            Some(idx) => idx,
            None => {
                rows.push(PivotRow {
                    email: result.email.as_str(),
                    sections: Vec::new(),
                    tiers: Vec::new(),
                    locations: Vec::new(),
                    choices: Vec::new(),
                    tables: Vec::new(),
                });
                rows.len() - 1
            }
        };
        let row = &mut rows[idx];
        push_unique(&mut row.sections, result.section.as_str());
        if let Some(tier) = result.tier.as_deref() {
            push_unique(&mut row.tiers, tier);
        }
        if let Some(location) = result.location.as_deref() {
            push_unique(&mut row.locations, location);
        }
        push_unique(&mut row.choices, result.table_choice.to_string());
        row.tables.push((result.date.as_str(), result.table_code.as_str()));
    }

    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = FIXED_HEADERS.to_vec();
    header.extend(dates.iter().map(String::as_str));
    csv_writer.write_record(&header)?;

    for row in &rows {
        let mut record = vec![
            row.email.to_string(),
            row.sections.join(","),
            row.tiers.join(","),
            row.locations.join(","),
            row.choices.join(","),
        ];
        for date in &dates {
            let codes: Vec<&str> = row
                .tables
                .iter()
                .filter(|(d, _)| *d == date.as_str())
                .map(|(_, code)| *code)
                .collect();
            record.push(codes.join(","));
        }
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush().map_err(|e| ExportError::Csv(e.into()))?;

    debug!(rows = rows.len(), dates = dates.len(), "透视表写出完成");
    Ok(rows.len())
}

/// 导出透视表到文件
pub fn export_pivot_csv_file(object: &AssignmentObject, path: &Path) -> Result<usize, ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let rows = export_pivot_csv(object, file)?;
    info!(path = %path.display(), rows = rows, "透视表 CSV 已导出");
    Ok(rows)
}
