// ==========================================
// 制造工艺变更跟踪系统 - 变更通知
// ==========================================
// 职责: 将变更事件渲染为本地化邮件，交给 Mailer 投递
// 规则:
// - 新建变更: 通知主管（等待审核）
// - 状态迁移: 通知变更创建人
// - 字段修改 / 删除: 不通知
// 说明: 实际投递（SMTP 等）在系统外部，默认 LogMailer 仅写日志
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::{Arc, Mutex};

use crate::domain::types::UserRole;
use crate::engine::events::{ChangeEvent, ChangeEventPublisher, ChangeEventType};
use crate::i18n::t_in;

// ==========================================
// 邮件模型
// ==========================================

/// 收件人（解析为具体地址由外部投递方负责）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// 某角色的全体用户
    Role(UserRole),
    /// 指定用户
    User(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    pub recipient: Recipient,
    pub subject: String,
    pub body: String,
}

/// 邮件投递接口
pub trait Mailer: Send + Sync {
    fn send(&self, message: &MailMessage) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 仅写日志的投递实现
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, message: &MailMessage) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::info!(
            recipient = ?message.recipient,
            subject = %message.subject,
            "邮件通知: {}",
            message.body
        );
        Ok(())
    }
}

/// 收集到内存的投递实现（演示/测试用）
#[derive(Debug, Default)]
pub struct OutboxMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已投递的邮件（按投递顺序）
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Mailer for OutboxMailer {
    fn send(&self, message: &MailMessage) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.sent
            .lock()
            .map_err(|e| format!("锁获取失败: {}", e))?
            .push(message.clone());
        Ok(())
    }
}

// ==========================================
// NotificationPublisher
// ==========================================
pub struct NotificationPublisher {
    mailer: Arc<dyn Mailer>,
    locale: String,
}

impl NotificationPublisher {
    pub fn new(mailer: Arc<dyn Mailer>, locale: impl Into<String>) -> Self {
        Self {
            mailer,
            locale: locale.into(),
        }
    }

    /// 渲染事件对应的邮件；不需要通知的事件返回 None
    pub fn render(&self, event: &ChangeEvent) -> Option<MailMessage> {
        let id = event.change_id.to_string();
        let actor = event.actor.display_name();

        match &event.event_type {
            ChangeEventType::Created => Some(MailMessage {
                recipient: Recipient::Role(UserRole::Supervisor),
                subject: t_in(&self.locale, "notification.new_change_subject", &[("id", &id)]),
                body: t_in(
                    &self.locale,
                    "notification.new_change_body",
                    &[
                        ("id", &id),
                        ("title", &event.title),
                        ("area", event.process_area.as_str()),
                        ("actor", &actor),
                    ],
                ),
            }),
            ChangeEventType::StatusChanged { from, to } => Some(MailMessage {
                recipient: Recipient::User(event.change_owner),
                subject: t_in(&self.locale, "notification.status_changed_subject", &[("id", &id)]),
                body: t_in(
                    &self.locale,
                    "notification.status_changed_body",
                    &[
                        ("id", &id),
                        ("title", &event.title),
                        ("from", from.as_str()),
                        ("to", to.as_str()),
                        ("actor", &actor),
                    ],
                ),
            }),
            ChangeEventType::Updated | ChangeEventType::Deleted => None,
        }
    }
}

impl ChangeEventPublisher for NotificationPublisher {
    fn name(&self) -> &str {
        "notification"
    }

    fn publish(&self, event: &ChangeEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        match self.render(event) {
            Some(message) => self.mailer.send(&message),
            None => {
                tracing::debug!(
                    change_id = event.change_id,
                    event_type = event.event_type.as_str(),
                    "该事件无需通知"
                );
                Ok(())
            }
        }
    }
}
