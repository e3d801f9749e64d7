// ==========================================
// 市集摊位分配引擎 - 导出层
// ==========================================
// 职责: 把分配结果转换为外部表格格式
// 红线: 只读分配结果,不重新计算
// ==========================================

pub mod error;
pub mod pivot_csv;

pub use error::ExportError;
pub use pivot_csv::{export_pivot_csv, export_pivot_csv_file, pivot_dates};
