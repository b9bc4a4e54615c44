// ==========================================
// 制造工艺变更跟踪系统 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 变更状态 (Change Status)
// ==========================================
// 状态迁移只能经过 TransitionValidator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeStatus {
    Proposed,  // 已提案
    Open,      // 已立项
    Submitted, // 已提交评审
    Accepted,  // 已接受
    Rejected,  // 已拒绝
}

impl ChangeStatus {
    /// 全部状态（按工作流顺序）
    pub const ALL: [ChangeStatus; 5] = [
        ChangeStatus::Proposed,
        ChangeStatus::Open,
        ChangeStatus::Submitted,
        ChangeStatus::Accepted,
        ChangeStatus::Rejected,
    ];

    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeStatus::Proposed => "PROPOSED",
            ChangeStatus::Open => "OPEN",
            ChangeStatus::Submitted => "SUBMITTED",
            ChangeStatus::Accepted => "ACCEPTED",
            ChangeStatus::Rejected => "REJECTED",
        }
    }

    /// 从字符串解析
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PROPOSED" => Some(ChangeStatus::Proposed),
            "OPEN" => Some(ChangeStatus::Open),
            "SUBMITTED" => Some(ChangeStatus::Submitted),
            "ACCEPTED" => Some(ChangeStatus::Accepted),
            "REJECTED" => Some(ChangeStatus::Rejected),
            _ => None,
        }
    }

    /// 是否为终态（非管理员不可再迁移）
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChangeStatus::Accepted | ChangeStatus::Rejected)
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 工艺区域 (Process Area)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessArea {
    Metals,    // 金属化
    Etch,      // 刻蚀
    Plating,   // 电镀
    Saw,       // 划片
    Grind,     // 研磨
    Photo,     // 光刻
    Diffusion, // 扩散
    Other,     // 其他
}

impl ProcessArea {
    pub const ALL: [ProcessArea; 8] = [
        ProcessArea::Metals,
        ProcessArea::Etch,
        ProcessArea::Plating,
        ProcessArea::Saw,
        ProcessArea::Grind,
        ProcessArea::Photo,
        ProcessArea::Diffusion,
        ProcessArea::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessArea::Metals => "METALS",
            ProcessArea::Etch => "ETCH",
            ProcessArea::Plating => "PLATING",
            ProcessArea::Saw => "SAW",
            ProcessArea::Grind => "GRIND",
            ProcessArea::Photo => "PHOTO",
            ProcessArea::Diffusion => "DIFFUSION",
            ProcessArea::Other => "OTHER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "METALS" => Some(ProcessArea::Metals),
            "ETCH" => Some(ProcessArea::Etch),
            "PLATING" => Some(ProcessArea::Plating),
            "SAW" => Some(ProcessArea::Saw),
            "GRIND" => Some(ProcessArea::Grind),
            "PHOTO" => Some(ProcessArea::Photo),
            "DIFFUSION" => Some(ProcessArea::Diffusion),
            "OTHER" => Some(ProcessArea::Other),
            _ => None,
        }
    }
}

impl fmt::Display for ProcessArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 用户角色 (User Role)
// ==========================================
// 顺序: Engineer < Supervisor < Admin
// 仅用于"至少具备某角色"的粗粒度判断，状态迁移权限另见 TransitionValidator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Engineer,   // 工程师
    Supervisor, // 主管
    Admin,      // 管理员
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Engineer => "ENGINEER",
            UserRole::Supervisor => "SUPERVISOR",
            UserRole::Admin => "ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "ENGINEER" => Some(UserRole::Engineer),
            "SUPERVISOR" => Some(UserRole::Supervisor),
            "ADMIN" => Some(UserRole::Admin),
            _ => None,
        }
    }

    /// 是否至少具备指定角色
    pub fn at_least(&self, required: UserRole) -> bool {
        *self >= required
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
