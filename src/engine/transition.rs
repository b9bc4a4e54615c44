// ==========================================
// 制造工艺变更跟踪系统 - 状态迁移校验器
// ==========================================
// 状态机（按角色）:
//
// | 当前      | 工程师(创建人) | 主管                  | 管理员   |
// |-----------|----------------|-----------------------|----------|
// | PROPOSED  | -              | → OPEN                | → 任意   |
// | OPEN      | → SUBMITTED    | -                     | → 任意   |
// | SUBMITTED | -              | → ACCEPTED/→ REJECTED | → 任意   |
// | ACCEPTED  | 终态           | 终态                  | → 任意   |
// | REJECTED  | 终态           | 终态                  | → 任意   |
//
// - 目标状态 == 当前状态: 空操作，总是允许
// - 非创建人工程师不可修改状态
// - 主管同时是创建人时，额外拥有创建人列的迁移权
// - 迁移权与角色等级不单调（工程师与主管的迁移集合不相交）
// ==========================================

use crate::domain::actor::Actor;
use crate::domain::process_change::ProcessChange;
use crate::domain::types::{ChangeStatus, UserRole};
use crate::engine::error::{EngineError, EngineResult};

/// 创建人可执行的迁移
const OWNER_TRANSITIONS: &[(ChangeStatus, ChangeStatus)] =
    &[(ChangeStatus::Open, ChangeStatus::Submitted)];

/// 主管可执行的迁移
const SUPERVISOR_TRANSITIONS: &[(ChangeStatus, ChangeStatus)] = &[
    (ChangeStatus::Proposed, ChangeStatus::Open),
    (ChangeStatus::Submitted, ChangeStatus::Accepted),
    (ChangeStatus::Submitted, ChangeStatus::Rejected),
];

/// 校验结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// 目标状态与当前一致，无迁移
    NoOp,
    /// 有效迁移
    Move { from: ChangeStatus, to: ChangeStatus },
}

impl TransitionOutcome {
    /// 是否进入指定状态（从其他状态迁入）
    pub fn enters(&self, status: ChangeStatus) -> bool {
        matches!(self, TransitionOutcome::Move { to, .. } if *to == status)
    }
}

// ==========================================
// TransitionValidator
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct TransitionValidator;

impl TransitionValidator {
    pub fn new() -> Self {
        Self
    }

    /// 纯规则判断：给定角色、是否创建人，from → to 是否允许
    pub fn is_allowed(
        &self,
        role: UserRole,
        is_owner: bool,
        from: ChangeStatus,
        to: ChangeStatus,
    ) -> bool {
        if from == to {
            return true;
        }
        match role {
            UserRole::Admin => true,
            UserRole::Supervisor => {
                SUPERVISOR_TRANSITIONS.contains(&(from, to))
                    || (is_owner && OWNER_TRANSITIONS.contains(&(from, to)))
            }
            UserRole::Engineer => is_owner && OWNER_TRANSITIONS.contains(&(from, to)),
        }
    }

    /// 当前状态下可迁往的目标状态（不含当前状态本身）
    pub fn allowed_targets(
        &self,
        role: UserRole,
        is_owner: bool,
        from: ChangeStatus,
    ) -> Vec<ChangeStatus> {
        ChangeStatus::ALL
            .into_iter()
            .filter(|to| *to != from && self.is_allowed(role, is_owner, from, *to))
            .collect()
    }

    /// 校验一次状态修改请求
    ///
    /// # 返回
    /// - Ok(NoOp): 目标状态与当前一致
    /// - Ok(Move): 允许迁移
    /// - Err(PermissionDenied): 非创建人工程师试图修改状态
    /// - Err(InvalidTransition): 该角色在当前状态下不允许此迁移
    pub fn validate(
        &self,
        actor: &Actor,
        record: &ProcessChange,
        requested: ChangeStatus,
    ) -> EngineResult<TransitionOutcome> {
        let from = record.status;
        if from == requested {
            return Ok(TransitionOutcome::NoOp);
        }

        let is_owner = record.is_owned_by(actor.id);
        if actor.role == UserRole::Engineer && !is_owner {
            return Err(EngineError::denied(format!(
                "仅创建人可修改变更#{}的状态",
                record.id
            )));
        }

        if self.is_allowed(actor.role, is_owner, from, requested) {
            Ok(TransitionOutcome::Move {
                from,
                to: requested,
            })
        } else {
            Err(EngineError::InvalidTransition {
                from,
                to: requested,
                role: actor.role,
            })
        }
    }
}
