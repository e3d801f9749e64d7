// ==========================================
// 市集摊位分配引擎 - 引擎层
// ==========================================
// 职责: 实现分配规则 (排序 / 准入 / 容量 / 调度 / 统计 / 校验)
// 红线: 引擎不做 I/O, 输入全部在运行前给定
// ==========================================

pub mod capacity;
pub mod eligibility;
pub mod error;
pub mod priority;
pub mod scheduler;
pub mod schema;
pub mod statistics;
pub mod validator;

// 重导出核心引擎
pub use capacity::{CapacityExceeded, CapacityTracker, Reservation};
pub use eligibility::{DateParticipation, EligibilityFilter, IneligibleReason};
pub use error::{AssignmentError, ConfigError};
pub use priority::PriorityClassifier;
pub use scheduler::{assign_setup, AssignmentScheduler};
pub use schema::SetupSchema;
pub use statistics::StatisticsAggregator;
pub use validator::{AssignmentValidator, ValidationReport, Violation};

// 取消令牌 (宿主持有,调度器在日期之间检查)
pub use tokio_util::sync::CancellationToken;
