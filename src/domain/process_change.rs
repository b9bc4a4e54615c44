// ==========================================
// 制造工艺变更跟踪系统 - 工艺变更领域模型
// ==========================================
// 职责: 变更记录实体、创建输入、局部更新补丁、查询过滤器
// 红线: 不含数据访问逻辑，不含权限/状态机逻辑
// ==========================================

use crate::domain::types::{ChangeStatus, ProcessArea};
use chrono::{NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// 记录时间戳保留的小数位（微秒，与 SQLite 存储格式一致）
pub const TIMESTAMP_SUBSEC_DIGITS: u16 = 6;

/// 截断到记录精度；两种存储后端写入前都经过这里
pub fn to_record_precision(ts: NaiveDateTime) -> NaiveDateTime {
    ts.trunc_subsecs(TIMESTAMP_SUBSEC_DIGITS)
}

// ==========================================
// ProcessChange - 工艺变更记录
// ==========================================
// 对齐: process_change 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessChange {
    // ===== 主键 =====
    pub id: i64, // 创建时由存储分配，不复用

    // ===== 工作流 =====
    pub status: ChangeStatus,
    pub change_owner: i64, // 创建人，创建后不可改

    // ===== 业务内容 =====
    pub title: String,
    pub process_area: ProcessArea,
    pub reason: String,
    pub change_overview: String,
    pub general_comments: String,
    #[serde(default)]
    pub attachments: Vec<String>, // 附件引用（有序，不解析内容）
    pub spec_updated: bool,

    // ===== 日期 =====
    pub proposal_date: NaiveDateTime,
    pub target_date: NaiveDateTime,
    pub acceptance_date: Option<NaiveDateTime>, // 仅在进入 ACCEPTED 时写入一次

    // ===== 派生字段 =====
    pub age_of_change: i64, // 距提案日天数（向上取整）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_of_change_override: Option<i64>, // 写入时显式指定的天数

    // ===== 审计时间戳 =====
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ProcessChange {
    /// 是否由指定用户创建
    pub fn is_owned_by(&self, actor_id: i64) -> bool {
        self.change_owner == actor_id
    }

    /// 是否曾经进入过 ACCEPTED
    pub fn has_been_accepted(&self) -> bool {
        self.acceptance_date.is_some()
    }
}

// ==========================================
// NewProcessChange - 创建输入
// ==========================================
// 来自请求层的原始输入；status 字段即使提供也会被忽略（新记录一律 PROPOSED）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewProcessChange {
    pub title: String,
    pub process_area: Option<ProcessArea>,
    pub status: Option<ChangeStatus>,
    pub proposal_date: Option<NaiveDateTime>,
    pub target_date: Option<NaiveDateTime>,
    pub age_of_change: Option<i64>,
    pub reason: String,
    pub change_overview: String,
    pub general_comments: Option<String>,
    pub attachments: Vec<String>,
    pub spec_updated: bool,
}

impl NewProcessChange {
    /// 按必填字段构造
    pub fn new(
        title: impl Into<String>,
        process_area: ProcessArea,
        reason: impl Into<String>,
        change_overview: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            process_area: Some(process_area),
            reason: reason.into(),
            change_overview: change_overview.into(),
            ..Default::default()
        }
    }

    /// 缺失的必填字段（按固定顺序）
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.process_area.is_none() {
            missing.push("processArea");
        }
        if self.reason.trim().is_empty() {
            missing.push("reason");
        }
        if self.change_overview.trim().is_empty() {
            missing.push("changeOverview");
        }
        missing
    }
}

// ==========================================
// ProcessChangeDraft - 待入库的新记录
// ==========================================
// 已通过校验、默认值已补齐；id 由存储分配，updated_at = created_at
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessChangeDraft {
    pub status: ChangeStatus,
    pub title: String,
    pub process_area: ProcessArea,
    pub change_owner: i64,
    pub proposal_date: NaiveDateTime,
    pub target_date: NaiveDateTime,
    pub age_of_change: i64,
    pub age_of_change_override: Option<i64>,
    pub reason: String,
    pub change_overview: String,
    pub general_comments: String,
    pub attachments: Vec<String>,
    pub spec_updated: bool,
    pub created_at: NaiveDateTime,
}

impl ProcessChangeDraft {
    /// 赋予 id 得到完整记录（时间戳截断到记录精度）
    pub fn into_record(self, id: i64) -> ProcessChange {
        let created_at = to_record_precision(self.created_at);
        ProcessChange {
            id,
            status: self.status,
            change_owner: self.change_owner,
            title: self.title,
            process_area: self.process_area,
            reason: self.reason,
            change_overview: self.change_overview,
            general_comments: self.general_comments,
            attachments: self.attachments,
            spec_updated: self.spec_updated,
            proposal_date: to_record_precision(self.proposal_date),
            target_date: to_record_precision(self.target_date),
            acceptance_date: None,
            age_of_change: self.age_of_change,
            age_of_change_override: self.age_of_change_override,
            created_at,
            updated_at: created_at,
        }
    }
}

// ==========================================
// ChangeField - 可写字段
// ==========================================
// change_owner / id / 审计时间戳不在此列，结构上不可写
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeField {
    Status,
    Title,
    ProcessArea,
    ProposalDate,
    TargetDate,
    AcceptanceDate,
    AgeOfChange,
    Reason,
    ChangeOverview,
    GeneralComments,
    Attachments,
    SpecUpdated,
}

impl ChangeField {
    /// 字段名（与 JSON 字段一致）
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeField::Status => "status",
            ChangeField::Title => "title",
            ChangeField::ProcessArea => "processArea",
            ChangeField::ProposalDate => "proposalDate",
            ChangeField::TargetDate => "targetDate",
            ChangeField::AcceptanceDate => "acceptanceDate",
            ChangeField::AgeOfChange => "ageOfChange",
            ChangeField::Reason => "reason",
            ChangeField::ChangeOverview => "changeOverview",
            ChangeField::GeneralComments => "generalComments",
            ChangeField::Attachments => "attachments",
            ChangeField::SpecUpdated => "specUpdated",
        }
    }
}

impl fmt::Display for ChangeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// ProcessChangePatch - 局部更新
// ==========================================
// None 表示不修改；未知字段（如 changeOwner）在反序列化时直接报错
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ProcessChangePatch {
    pub status: Option<ChangeStatus>,
    pub title: Option<String>,
    pub process_area: Option<ProcessArea>,
    pub proposal_date: Option<NaiveDateTime>,
    pub target_date: Option<NaiveDateTime>,
    pub acceptance_date: Option<NaiveDateTime>,
    pub age_of_change: Option<i64>,
    pub reason: Option<String>,
    pub change_overview: Option<String>,
    pub general_comments: Option<String>,
    pub attachments: Option<Vec<String>>,
    pub spec_updated: Option<bool>,
}

impl ProcessChangePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: ChangeStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_general_comments(mut self, comments: impl Into<String>) -> Self {
        self.general_comments = Some(comments.into());
        self
    }

    pub fn with_acceptance_date(mut self, date: NaiveDateTime) -> Self {
        self.acceptance_date = Some(date);
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<String>) -> Self {
        self.attachments = Some(attachments);
        self
    }

    /// 本次请求涉及的字段集合
    pub fn fields(&self) -> BTreeSet<ChangeField> {
        let mut fields = BTreeSet::new();
        if self.status.is_some() {
            fields.insert(ChangeField::Status);
        }
        if self.title.is_some() {
            fields.insert(ChangeField::Title);
        }
        if self.process_area.is_some() {
            fields.insert(ChangeField::ProcessArea);
        }
        if self.proposal_date.is_some() {
            fields.insert(ChangeField::ProposalDate);
        }
        if self.target_date.is_some() {
            fields.insert(ChangeField::TargetDate);
        }
        if self.acceptance_date.is_some() {
            fields.insert(ChangeField::AcceptanceDate);
        }
        if self.age_of_change.is_some() {
            fields.insert(ChangeField::AgeOfChange);
        }
        if self.reason.is_some() {
            fields.insert(ChangeField::Reason);
        }
        if self.change_overview.is_some() {
            fields.insert(ChangeField::ChangeOverview);
        }
        if self.general_comments.is_some() {
            fields.insert(ChangeField::GeneralComments);
        }
        if self.attachments.is_some() {
            fields.insert(ChangeField::Attachments);
        }
        if self.spec_updated.is_some() {
            fields.insert(ChangeField::SpecUpdated);
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// 将补丁合并到记录上，并刷新 updated_at
    ///
    /// 两种存储后端共用此合并逻辑；acceptance_date 只写不清，时间戳截断到记录精度
    pub fn apply_to(&self, record: &mut ProcessChange, updated_at: NaiveDateTime) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(area) = self.process_area {
            record.process_area = area;
        }
        if let Some(date) = self.proposal_date {
            record.proposal_date = to_record_precision(date);
        }
        if let Some(date) = self.target_date {
            record.target_date = to_record_precision(date);
        }
        if let Some(date) = self.acceptance_date {
            record.acceptance_date = Some(to_record_precision(date));
        }
        if let Some(age) = self.age_of_change {
            record.age_of_change_override = Some(age);
            record.age_of_change = age;
        }
        if let Some(reason) = &self.reason {
            record.reason = reason.clone();
        }
        if let Some(overview) = &self.change_overview {
            record.change_overview = overview.clone();
        }
        if let Some(comments) = &self.general_comments {
            record.general_comments = comments.clone();
        }
        if let Some(attachments) = &self.attachments {
            record.attachments = attachments.clone();
        }
        if let Some(flag) = self.spec_updated {
            record.spec_updated = flag;
        }
        record.updated_at = to_record_precision(updated_at);
    }
}

// ==========================================
// ProcessChangeFilter - 列表过滤条件
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessChangeFilter {
    pub status: Option<ChangeStatus>,
    pub process_area: Option<ProcessArea>,
    pub change_owner: Option<i64>,
}

impl ProcessChangeFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_status(mut self, status: ChangeStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn by_area(mut self, area: ProcessArea) -> Self {
        self.process_area = Some(area);
        self
    }

    pub fn by_owner(mut self, owner: i64) -> Self {
        self.change_owner = Some(owner);
        self
    }

    /// 记录是否满足全部过滤条件
    pub fn matches(&self, change: &ProcessChange) -> bool {
        self.status.map_or(true, |s| change.status == s)
            && self.process_area.map_or(true, |a| change.process_area == a)
            && self.change_owner.map_or(true, |o| change.change_owner == o)
    }
}
