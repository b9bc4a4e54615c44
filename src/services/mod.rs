// ==========================================
// 制造工艺变更跟踪系统 - 服务层
// ==========================================
// 职责: 实现 Engine 层定义的 ChangeEventPublisher trait
// 架构: 依赖倒置 - 服务层实现 Engine 层定义的接口
// ==========================================

pub mod audit_trail;
pub mod notification;

pub use audit_trail::ActionLogPublisher;
pub use notification::{LogMailer, MailMessage, Mailer, NotificationPublisher, OutboxMailer, Recipient};
