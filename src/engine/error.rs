// ==========================================
// 制造工艺变更跟踪系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::types::{ChangeStatus, UserRole};
use thiserror::Error;

/// 引擎层错误类型（权限、状态机、派生字段校验）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("权限不足: {reason}")]
    PermissionDenied { reason: String },

    #[error("无效的状态转换: from={from} to={to} (role={role})")]
    InvalidTransition {
        from: ChangeStatus,
        to: ChangeStatus,
        role: UserRole,
    },

    #[error("数据验证失败: {0}")]
    ValidationError(String),
}

impl EngineError {
    pub fn denied(reason: impl Into<String>) -> Self {
        EngineError::PermissionDenied {
            reason: reason.into(),
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
