// ==========================================
// 制造工艺变更跟踪系统 - 操作日志领域模型
// ==========================================
// 用途: 变更记录的审计追踪（创建/修改/状态迁移/删除）
// 对齐: change_action_log 表
// ==========================================

use crate::domain::actor::Actor;
use crate::domain::types::ChangeStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ChangeActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeActionLog {
    // ===== 主键 =====
    pub action_id: String,        // 日志ID (UUID)
    pub change_id: i64,           // 关联变更记录（删除后仍保留）
    pub action_type: String,      // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime, // 操作时间戳

    // ===== 操作人 =====
    pub actor_id: i64,
    pub actor_role: String,

    // ===== 状态迁移 =====
    pub from_status: Option<String>,
    pub to_status: Option<String>,

    // ===== 操作负载 =====
    pub payload_json: Option<JsonValue>, // 请求涉及的字段等 (JSON)
    pub detail: Option<String>,          // 详细描述
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    Create,       // 创建变更
    Update,       // 修改字段
    StatusChange, // 状态迁移
    Delete,       // 删除变更
}

impl ActionType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Create => "CREATE",
            ActionType::Update => "UPDATE",
            ActionType::StatusChange => "STATUS_CHANGE",
            ActionType::Delete => "DELETE",
        }
    }

    /// 从字符串解析
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATE" => Some(ActionType::Create),
            "UPDATE" => Some(ActionType::Update),
            "STATUS_CHANGE" => Some(ActionType::StatusChange),
            "DELETE" => Some(ActionType::Delete),
            _ => None,
        }
    }
}

impl ChangeActionLog {
    /// 创建新的操作日志
    ///
    /// # 参数
    /// - `change_id`: 变更记录ID
    /// - `action_type`: 操作类型
    /// - `actor`: 操作人
    /// - `action_ts`: 操作时间
    pub fn new(
        change_id: i64,
        action_type: ActionType,
        actor: &Actor,
        action_ts: NaiveDateTime,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            change_id,
            action_type: action_type.as_str().to_string(),
            action_ts,
            actor_id: actor.id,
            actor_role: actor.role.as_str().to_string(),
            from_status: None,
            to_status: None,
            payload_json: None,
            detail: None,
        }
    }

    /// 设置状态迁移
    pub fn with_transition(mut self, from: ChangeStatus, to: ChangeStatus) -> Self {
        self.from_status = Some(from.as_str().to_string());
        self.to_status = Some(to.as_str().to_string());
        self
    }

    /// 设置操作负载 (转换为JSON)
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Self {
        self.payload_json = serde_json::to_value(payload).ok();
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// 解析后的操作类型
    pub fn kind(&self) -> Option<ActionType> {
        ActionType::parse(&self.action_type)
    }
}
