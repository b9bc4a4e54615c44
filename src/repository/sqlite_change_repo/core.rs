use crate::db::{format_ts, init_schema, open_sqlite_connection};
use crate::domain::process_change::ProcessChange;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// SqliteProcessChangeStore - SQLite 变更存储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct SqliteProcessChangeStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteProcessChangeStore {
    /// 使用共享连接创建（schema 由调用方保证）
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 打开数据库文件并建表
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    /// 共享连接（供同库的其他仓储使用）
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写回完整记录（update 事务内使用）
    pub(super) fn write_back(conn: &Connection, record: &ProcessChange) -> RepositoryResult<usize> {
        let attachments_json = serde_json::to_string(&record.attachments)?;
        let rows = conn.execute(
            r#"
            UPDATE process_change SET
                status = ?2,
                title = ?3,
                process_area = ?4,
                proposal_date = ?5,
                target_date = ?6,
                acceptance_date = ?7,
                age_of_change = ?8,
                age_of_change_override = ?9,
                reason = ?10,
                change_overview = ?11,
                general_comments = ?12,
                attachments_json = ?13,
                spec_updated = ?14,
                updated_at = ?15
            WHERE id = ?1
            "#,
            params![
                record.id,
                record.status.as_str(),
                record.title,
                record.process_area.as_str(),
                format_ts(&record.proposal_date),
                format_ts(&record.target_date),
                record.acceptance_date.as_ref().map(format_ts),
                record.age_of_change,
                record.age_of_change_override,
                record.reason,
                record.change_overview,
                record.general_comments,
                attachments_json,
                record.spec_updated,
                format_ts(&record.updated_at),
            ],
        )?;
        Ok(rows)
    }
}
