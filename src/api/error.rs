// ==========================================
// 制造工艺变更跟踪系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换引擎/仓储错误为调用方可映射的错误
// 说明: 传输层（HTTP 等）自行将各变体映射为状态码
// ==========================================

use crate::domain::types::ChangeStatus;
use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("权限不足: {0}")]
    PermissionDenied(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidTransition { from: ChangeStatus, to: ChangeStatus },

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::PermissionDenied { reason } => ApiError::PermissionDenied(reason),
            EngineError::InvalidTransition { from, to, .. } => {
                ApiError::InvalidTransition { from, to }
            }
            EngineError::ValidationError(msg) => ApiError::ValidationError(msg),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为业务可理解的错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::DatabaseError(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InternalError(format!("存储字段{}无法解析: {}", field, message))
            }
            RepositoryError::SerializationError(msg) | RepositoryError::InternalError(msg) => {
                ApiError::InternalError(msg)
            }
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
