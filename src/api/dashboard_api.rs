// ==========================================
// 制造工艺变更跟踪系统 - 看板 API
// ==========================================
// 职责: 变更统计聚合（按状态/工艺区域）、在办变更周期、逾期清单、操作日志查询
// 说明: 统计基于 ProcessChangeApi 的读取结果（ageOfChange 已刷新）
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::process_change_api::ProcessChangeApi;
use crate::domain::action_log::ChangeActionLog;
use crate::domain::actor::Actor;
use crate::domain::process_change::{ProcessChange, ProcessChangeFilter};
use crate::domain::types::{ChangeStatus, ProcessArea};
use crate::repository::action_log_repo::ActionLogRepository;

/// 逾期变更
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueChange {
    pub id: i64,
    pub title: String,
    pub process_area: ProcessArea,
    pub status: ChangeStatus,
    pub change_owner: i64,
    pub target_date: NaiveDateTime,
    pub days_overdue: i64,
}

/// 看板汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total: usize,
    /// 状态 → 数量（全部状态均出现，含 0）
    pub by_status: BTreeMap<String, usize>,
    /// 工艺区域 → 数量（全部区域均出现，含 0）
    pub by_area: BTreeMap<String, usize>,
    /// 在办（非终态）变更数
    pub open_count: usize,
    pub avg_open_age_days: f64,
    pub max_open_age_days: i64,
    /// 已过目标日期且未结束的变更（逾期天数倒序）
    pub overdue: Vec<OverdueChange>,
    pub generated_at: NaiveDateTime,
}

// ==========================================
// DashboardApi - 看板 API
// ==========================================
pub struct DashboardApi {
    change_api: Arc<ProcessChangeApi>,
    /// 操作日志仓储（内存部署下为 None）
    action_log_repo: Option<Arc<ActionLogRepository>>,
}

impl DashboardApi {
    pub fn new(
        change_api: Arc<ProcessChangeApi>,
        action_log_repo: Option<Arc<ActionLogRepository>>,
    ) -> Self {
        Self {
            change_api,
            action_log_repo,
        }
    }

    /// 汇总统计
    pub fn summary(&self, actor: &Actor, filter: &ProcessChangeFilter) -> ApiResult<DashboardSummary> {
        let now = self.change_api.now();
        let changes = self.change_api.list_changes(actor, filter)?;
        Ok(summarize(&changes, now))
    }

    /// 指定变更的操作历史（时间正序）
    pub fn change_history(&self, change_id: i64) -> ApiResult<Vec<ChangeActionLog>> {
        match &self.action_log_repo {
            Some(repo) => Ok(repo.find_by_change_id(change_id)?),
            None => Ok(Vec::new()),
        }
    }

    /// 最近的操作日志
    pub fn recent_actions(&self, limit: i32) -> ApiResult<Vec<ChangeActionLog>> {
        match &self.action_log_repo {
            Some(repo) => Ok(repo.find_recent(limit.max(0))?),
            None => Ok(Vec::new()),
        }
    }
}

/// 纯聚合（不访问存储）
pub fn summarize(changes: &[ProcessChange], now: NaiveDateTime) -> DashboardSummary {
    let mut by_status: BTreeMap<String, usize> = ChangeStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();
    let mut by_area: BTreeMap<String, usize> = ProcessArea::ALL
        .iter()
        .map(|a| (a.as_str().to_string(), 0))
        .collect();

    let mut open_ages = Vec::new();
    let mut overdue = Vec::new();

    for change in changes {
        *by_status.entry(change.status.as_str().to_string()).or_insert(0) += 1;
        *by_area.entry(change.process_area.as_str().to_string()).or_insert(0) += 1;

        if change.status.is_terminal() {
            continue;
        }
        open_ages.push(change.age_of_change);

        if change.target_date < now {
            overdue.push(OverdueChange {
                id: change.id,
                title: change.title.clone(),
                process_area: change.process_area,
                status: change.status,
                change_owner: change.change_owner,
                target_date: change.target_date,
                days_overdue: (now - change.target_date).num_days(),
            });
        }
    }

    overdue.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue).then_with(|| a.id.cmp(&b.id)));

    let avg_open_age_days = if open_ages.is_empty() {
        0.0
    } else {
        open_ages.iter().sum::<i64>() as f64 / open_ages.len() as f64
    };

    DashboardSummary {
        total: changes.len(),
        by_status,
        by_area,
        open_count: open_ages.len(),
        avg_open_age_days,
        max_open_age_days: open_ages.iter().copied().max().unwrap_or(0),
        overdue,
        generated_at: now,
    }
}
