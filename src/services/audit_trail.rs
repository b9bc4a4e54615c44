// ==========================================
// 制造工艺变更跟踪系统 - 审计追踪
// ==========================================
// 职责: 将变更事件写入 change_action_log
// 说明: 仅 SQLite 部署启用；变更删除后日志仍保留
// ==========================================

use std::error::Error;
use std::sync::Arc;

use crate::domain::action_log::{ActionType, ChangeActionLog};
use crate::engine::events::{ChangeEvent, ChangeEventPublisher, ChangeEventType};
use crate::repository::ActionLogRepository;

/// 操作日志发布者
pub struct ActionLogPublisher {
    repo: Arc<ActionLogRepository>,
}

impl ActionLogPublisher {
    pub fn new(repo: Arc<ActionLogRepository>) -> Self {
        Self { repo }
    }

    /// 将事件转换为操作日志
    pub fn to_action_log(event: &ChangeEvent) -> ChangeActionLog {
        let action_type = match event.event_type {
            ChangeEventType::Created => ActionType::Create,
            ChangeEventType::StatusChanged { .. } => ActionType::StatusChange,
            ChangeEventType::Updated => ActionType::Update,
            ChangeEventType::Deleted => ActionType::Delete,
        };

        let mut log = ChangeActionLog::new(event.change_id, action_type, &event.actor, event.occurred_at)
            .with_detail(event.title.clone());

        if let ChangeEventType::StatusChanged { from, to } = event.event_type {
            log = log.with_transition(from, to);
        }

        if !event.fields.is_empty() {
            let fields: Vec<&str> = event.fields.iter().map(|f| f.as_str()).collect();
            log = log.with_payload(&fields);
        }

        log
    }
}

impl ChangeEventPublisher for ActionLogPublisher {
    fn name(&self) -> &str {
        "action_log"
    }

    fn publish(&self, event: &ChangeEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        let log = Self::to_action_log(event);
        let action_id = self.repo.insert(&log)?;
        tracing::debug!(
            change_id = event.change_id,
            action_id = %action_id,
            action_type = %log.action_type,
            "操作日志已写入"
        );
        Ok(())
    }
}
