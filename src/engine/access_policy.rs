// ==========================================
// 制造工艺变更跟踪系统 - 访问策略
// ==========================================
// 职责: 判断操作人（角色 + 是否创建人）能否写入/删除某条变更记录
// 规则:
// - ADMIN: 任意字段、任意状态
// - 创建人: 任意字段（状态迁移另由 TransitionValidator 校验）
// - 非创建人 SUPERVISOR: 仅 status / generalComments / acceptanceDate
//   请求中含其他字段时整单拒绝（不做静默剔除）
// - 其他组合: 拒绝
// - 删除: 仅创建人或 ADMIN
// ==========================================

use std::collections::BTreeSet;

use crate::domain::actor::Actor;
use crate::domain::process_change::{ChangeField, ProcessChange};
use crate::domain::types::UserRole;
use crate::engine::error::{EngineError, EngineResult};

/// 非创建人主管可写字段
pub const SUPERVISOR_WRITABLE_FIELDS: [ChangeField; 3] = [
    ChangeField::Status,
    ChangeField::GeneralComments,
    ChangeField::AcceptanceDate,
];

/// 写权限范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteScope {
    /// 全部字段
    Full,
    /// 仅评审字段
    ReviewOnly,
    /// 无写权限
    None,
}

// ==========================================
// AccessPolicy
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct AccessPolicy;

impl AccessPolicy {
    pub fn new() -> Self {
        Self
    }

    /// 操作人对记录的写权限范围
    pub fn write_scope(&self, actor: &Actor, record: &ProcessChange) -> WriteScope {
        if actor.is_admin() || record.is_owned_by(actor.id) {
            WriteScope::Full
        } else if actor.role == UserRole::Supervisor {
            WriteScope::ReviewOnly
        } else {
            WriteScope::None
        }
    }

    /// 校验写权限
    ///
    /// # 参数
    /// - actor: 操作人
    /// - record: 当前记录
    /// - requested_fields: 本次请求涉及的字段
    ///
    /// # 返回
    /// - Ok(()): 允许
    /// - Err(EngineError::PermissionDenied): 拒绝（带原因）
    pub fn can_write(
        &self,
        actor: &Actor,
        record: &ProcessChange,
        requested_fields: &BTreeSet<ChangeField>,
    ) -> EngineResult<()> {
        match self.write_scope(actor, record) {
            WriteScope::Full => Ok(()),
            WriteScope::ReviewOnly => {
                let extra: Vec<&str> = requested_fields
                    .iter()
                    .filter(|f| !SUPERVISOR_WRITABLE_FIELDS.contains(f))
                    .map(|f| f.as_str())
                    .collect();
                if extra.is_empty() {
                    Ok(())
                } else {
                    Err(EngineError::denied(format!(
                        "主管仅可修改 status/generalComments/acceptanceDate，请求包含不允许的字段: {}",
                        extra.join(", ")
                    )))
                }
            }
            WriteScope::None => Err(EngineError::denied(format!(
                "用户{}无权修改变更#{}",
                actor.display_name(),
                record.id
            ))),
        }
    }

    /// 校验删除权限（仅创建人或管理员，与状态无关）
    pub fn can_delete(&self, actor: &Actor, record: &ProcessChange) -> EngineResult<()> {
        if actor.is_admin() || record.is_owned_by(actor.id) {
            Ok(())
        } else {
            Err(EngineError::denied(format!(
                "仅创建人或管理员可删除变更#{}",
                record.id
            )))
        }
    }

    /// 读权限：所有已认证用户均可读取，无字段脱敏
    pub fn can_read(&self, _actor: &Actor, _record: &ProcessChange) -> bool {
        true
    }
}
