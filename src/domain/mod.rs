// ==========================================
// 制造工艺变更跟踪系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod actor;
pub mod process_change;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionType, ChangeActionLog};
pub use actor::Actor;
pub use process_change::{
    ChangeField, NewProcessChange, ProcessChange, ProcessChangeDraft, ProcessChangeFilter,
    ProcessChangePatch,
};
pub use types::{ChangeStatus, ProcessArea, UserRole};
