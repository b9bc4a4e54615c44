// ==========================================
// 制造工艺变更跟踪系统 - 应用层
// ==========================================
// 职责: 组装存储、引擎、服务与 API
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, StoreBackend, DB_PATH_ENV, STORE_BACKEND_ENV};
