// ==========================================
// 制造工艺变更跟踪系统 - 引擎层
// ==========================================
// 职责: 业务规则（访问策略、状态机、派生字段、变更事件）
// 红线: 引擎不直接访问数据库；与存储后端无关
// ==========================================

pub mod access_policy;
pub mod derived_fields;
pub mod error;
pub mod events;
pub mod transition;

// 重导出
pub use access_policy::{AccessPolicy, WriteScope, SUPERVISOR_WRITABLE_FIELDS};
pub use derived_fields::DerivedFieldCalculator;
pub use error::{EngineError, EngineResult};
pub use events::{
    ChangeEvent, ChangeEventPublisher, ChangeEventType, EventPublishers, NoOpEventPublisher,
};
pub use transition::{TransitionOutcome, TransitionValidator};
