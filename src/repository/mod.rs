// ==========================================
// 制造工艺变更跟踪系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽存储细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod error;
pub mod memory_change_repo;
pub mod process_change_repo;
pub mod sqlite_change_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use memory_change_repo::InMemoryProcessChangeStore;
pub use process_change_repo::ProcessChangeStore;
pub use sqlite_change_repo::SqliteProcessChangeStore;
