// ==========================================
// 市集摊位分配引擎 - 领域模型层
// ==========================================
// 职责: 定义配置对象、供应商记录、分配结果
// 红线: 不含分配逻辑,不含存储访问
// ==========================================

pub mod assignment;
pub mod setup;
pub mod types;
pub mod vendor;

// 重导出核心类型
pub use assignment::{AssignmentObject, AssignmentStatistics, VendorAssignmentResult};
pub use setup::{
    AssignmentOptionObject, LocationObject, MarketDateObject, PriorityObject, SectionObject,
    SetupObject, TierObject,
};
pub use types::{ContainsMode, DataType, SortDirection, TableChoice, TablePreference};
pub use vendor::VendorRecord;
