// ==========================================
// 制造工艺变更跟踪系统 - 操作日志数据仓储
// ==========================================
// 对齐: change_action_log 表
// 红线: 日志只追加，不修改；变更删除后日志仍保留
// ==========================================

mod core;
mod queries;


pub use core::ActionLogRepository;
