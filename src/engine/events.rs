// ==========================================
// 制造工艺变更跟踪系统 - 变更事件发布
// ==========================================
// 职责: 定义变更事件与发布 trait，实现依赖倒置
// 说明: Engine 层定义 trait，services 层实现（通知 / 审计日志）
// 约束: 发布失败只记录日志，不影响已提交的变更
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

use crate::domain::actor::Actor;
use crate::domain::process_change::{ChangeField, ProcessChange};
use crate::domain::types::{ChangeStatus, ProcessArea};

// ==========================================
// 变更事件类型
// ==========================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeEventType {
    /// 新建变更
    Created,
    /// 状态迁移
    StatusChanged { from: ChangeStatus, to: ChangeStatus },
    /// 字段修改（无状态迁移）
    Updated,
    /// 删除
    Deleted,
}

impl ChangeEventType {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            ChangeEventType::Created => "Created",
            ChangeEventType::StatusChanged { .. } => "StatusChanged",
            ChangeEventType::Updated => "Updated",
            ChangeEventType::Deleted => "Deleted",
        }
    }
}

/// 变更事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub change_id: i64,
    pub title: String,
    /// 变更创建人（状态通知的收件人）
    pub change_owner: i64,
    pub process_area: ProcessArea,
    pub event_type: ChangeEventType,
    pub actor: Actor,
    /// 本次请求涉及的字段
    pub fields: Vec<ChangeField>,
    pub occurred_at: NaiveDateTime,
}

impl ChangeEvent {
    pub fn new(
        change: &ProcessChange,
        event_type: ChangeEventType,
        actor: &Actor,
        occurred_at: NaiveDateTime,
    ) -> Self {
        Self {
            change_id: change.id,
            title: change.title.clone(),
            change_owner: change.change_owner,
            process_area: change.process_area,
            event_type,
            actor: actor.clone(),
            fields: Vec::new(),
            occurred_at,
        }
    }

    pub fn with_fields(mut self, fields: impl IntoIterator<Item = ChangeField>) -> Self {
        self.fields = fields.into_iter().collect();
        self
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 变更事件发布者
pub trait ChangeEventPublisher: Send + Sync {
    /// 发布者名称（用于日志）
    fn name(&self) -> &str;

    /// 发布变更事件
    fn publish(&self, event: &ChangeEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
///
/// 用于不需要事件发布的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl ChangeEventPublisher for NoOpEventPublisher {
    fn name(&self) -> &str {
        "noop"
    }

    fn publish(&self, event: &ChangeEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - change_id={}, event_type={}",
            event.change_id,
            event.event_type.as_str()
        );
        Ok(())
    }
}

/// 多发布者扇出
///
/// 逐个发布，单个失败只记录 warn，不中断其余发布者
#[derive(Clone, Default)]
pub struct EventPublishers {
    inner: Vec<Arc<dyn ChangeEventPublisher>>,
}

impl EventPublishers {
    pub fn none() -> Self {
        Self { inner: Vec::new() }
    }

    pub fn with(mut self, publisher: Arc<dyn ChangeEventPublisher>) -> Self {
        self.inner.push(publisher);
        self
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// 发布事件，返回失败的发布者数量
    pub fn publish_all(&self, event: &ChangeEvent) -> usize {
        let mut failures = 0;
        for publisher in &self.inner {
            if let Err(e) = publisher.publish(event) {
                failures += 1;
                tracing::warn!(
                    publisher = publisher.name(),
                    change_id = event.change_id,
                    event_type = event.event_type.as_str(),
                    "变更事件发布失败: {}",
                    e
                );
            }
        }
        failures
    }
}
