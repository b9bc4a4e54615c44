// ==========================================
// 制造工艺变更跟踪系统 - 操作人
// ==========================================
// 操作人由上游认证层提供，显式传入每个核心操作（不存在全局"当前用户"）
// ==========================================

use crate::domain::types::UserRole;
use serde::{Deserialize, Serialize};

/// 操作人
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: i64,
    pub role: UserRole,
    pub identity_ref: String, // 外部身份ID（认证系统侧）
    #[serde(default)]
    pub name: Option<String>,
}

impl Actor {
    pub fn new(id: i64, role: UserRole, identity_ref: impl Into<String>) -> Self {
        Self {
            id,
            role,
            identity_ref: identity_ref.into(),
            name: None,
        }
    }

    pub fn engineer(id: i64) -> Self {
        Self::new(id, UserRole::Engineer, format!("user_{}", id))
    }

    pub fn supervisor(id: i64) -> Self {
        Self::new(id, UserRole::Supervisor, format!("user_{}", id))
    }

    pub fn admin(id: i64) -> Self {
        Self::new(id, UserRole::Admin, format!("user_{}", id))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// 是否至少具备指定角色
    pub fn has_role(&self, required: UserRole) -> bool {
        self.role.at_least(required)
    }

    /// 日志/审计中使用的显示名
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => format!("{}({})", name, self.id),
            None => format!("{}#{}", self.role, self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(Actor::engineer(1).display_name(), "ENGINEER#1");
        assert_eq!(
            Actor::supervisor(2).with_name("Jane").display_name(),
            "Jane(2)"
        );
    }

    #[test]
    fn test_has_role() {
        assert!(Actor::admin(3).has_role(UserRole::Supervisor));
        assert!(!Actor::engineer(1).has_role(UserRole::Supervisor));
        assert!(Actor::admin(3).is_admin());
    }
}
