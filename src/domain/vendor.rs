// ==========================================
// 市集摊位分配引擎 - 供应商记录
// ==========================================
// 来源: 报名表的一行 (colValues 按行切片)
// 红线: 加载后不可变
// ==========================================

/// 供应商记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorRecord {
    /// 原始行号 (排序最终兜底键)
    pub row_index: usize,
    cells: Vec<String>,
}

impl VendorRecord {
    pub fn new(row_index: usize, cells: Vec<String>) -> Self {
        Self { row_index, cells }
    }

    /// 读取单元格,越界返回空串
    pub fn cell(&self, col: usize) -> &str {
        self.cells.get(col).map(String::as_str).unwrap_or("")
    }
}
