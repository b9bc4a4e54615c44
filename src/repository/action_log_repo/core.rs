use crate::db::format_ts;
use crate::domain::action_log::ChangeActionLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ActionLogRepository - 操作日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    /// 创建新的操作日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入操作日志
    ///
    /// # 返回
    /// - `Ok(action_id)`: 成功插入,返回action_id
    /// - `Err(...)`: 数据库错误
    pub fn insert(&self, log: &ChangeActionLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO change_action_log (
                action_id, change_id, action_type, action_ts, actor_id, actor_role,
                from_status, to_status, payload_json, detail
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                log.action_id,
                log.change_id,
                log.action_type,
                format_ts(&log.action_ts),
                log.actor_id,
                log.actor_role,
                log.from_status,
                log.to_status,
                log.payload_json.as_ref().map(|v| v.to_string()),
                log.detail,
            ],
        )?;

        Ok(log.action_id.clone())
    }

    /// 批量插入操作日志
    pub fn batch_insert(&self, logs: &[ChangeActionLog]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for log in logs {
            tx.execute(
                r#"
                INSERT INTO change_action_log (
                    action_id, change_id, action_type, action_ts, actor_id, actor_role,
                    from_status, to_status, payload_json, detail
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
                params![
                    log.action_id,
                    log.change_id,
                    log.action_type,
                    format_ts(&log.action_ts),
                    log.actor_id,
                    log.actor_role,
                    log.from_status,
                    log.to_status,
                    log.payload_json.as_ref().map(|v| v.to_string()),
                    log.detail,
                ],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }
}
