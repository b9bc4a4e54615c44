// ==========================================
// 制造工艺变更跟踪系统 - 核心库
// ==========================================
// 系统定位: 工艺变更审批工作流（提案 → 评审 → 接受/拒绝）
// 技术栈: Rust + SQLite
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 权限/状态机/派生字段
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// 服务层 - 事件发布（通知/审计）
pub mod services;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// 演示数据
pub mod seed;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ChangeStatus, ProcessArea, UserRole};

// 领域实体
pub use domain::{
    Actor, ChangeActionLog, ChangeField, NewProcessChange, ProcessChange, ProcessChangeFilter,
    ProcessChangePatch,
};

// 配置
pub use config::{ChangeConfig, ConfigManager};

// 引擎
pub use engine::{AccessPolicy, DerivedFieldCalculator, EngineError, TransitionValidator};

// 仓储
pub use repository::{InMemoryProcessChangeStore, ProcessChangeStore, SqliteProcessChangeStore};

// API
pub use api::{ApiError, ApiResult, DashboardApi, ProcessChangeApi};

// 应用
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "制造工艺变更跟踪系统";

// 数据库版本
pub const DB_VERSION: i64 = db::CURRENT_SCHEMA_VERSION;
