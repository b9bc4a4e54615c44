// ==========================================
// 制造工艺变更跟踪系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供传输层（HTTP 等）调用
// ==========================================

pub mod dashboard_api;
pub mod error;
pub mod process_change_api;

// 重导出核心类型
pub use dashboard_api::{DashboardApi, DashboardSummary, OverdueChange};
pub use error::{ApiError, ApiResult};
pub use process_change_api::{system_clock, upload_path, Clock, ProcessChangeApi};
