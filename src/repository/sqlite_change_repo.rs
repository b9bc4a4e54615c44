// ==========================================
// 制造工艺变更跟踪系统 - SQLite 存储后端
// ==========================================
// 对齐: process_change 表
// 约束: 附件列表以 JSON 文本存储；时间戳使用定长格式
// ==========================================

mod core;
mod queries;


pub use core::SqliteProcessChangeStore;
