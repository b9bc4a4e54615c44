use super::core::ActionLogRepository;
use crate::db::parse_ts;
use crate::domain::action_log::ChangeActionLog;
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Result as SqliteResult, Row};

const SELECT_COLUMNS: &str = "action_id, change_id, action_type, action_ts, actor_id, actor_role, \
                              from_status, to_status, payload_json, detail";

impl ActionLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 action_id 查询单个日志
    pub fn find_by_id(&self, action_id: &str) -> RepositoryResult<Option<ChangeActionLog>> {
        let conn = self.get_conn()?;

        let sql = format!(
            "SELECT {} FROM change_action_log WHERE action_id = ?",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        match stmt.query_row(params![action_id], |row| self.map_row(row)) {
            Ok(log) => Ok(Some(log)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询指定变更的全部日志（按时间正序，即变更历史）
    pub fn find_by_change_id(&self, change_id: i64) -> RepositoryResult<Vec<ChangeActionLog>> {
        let conn = self.get_conn()?;

        let sql = format!(
            "SELECT {} FROM change_action_log WHERE change_id = ? ORDER BY action_ts ASC, rowid ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let logs = stmt
            .query_map(params![change_id], |row| self.map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 查询指定操作人的日志（按时间倒序）
    pub fn find_by_actor(&self, actor_id: i64, limit: i32) -> RepositoryResult<Vec<ChangeActionLog>> {
        let conn = self.get_conn()?;

        let sql = format!(
            "SELECT {} FROM change_action_log WHERE actor_id = ? \
             ORDER BY action_ts DESC, rowid DESC LIMIT ?",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let logs = stmt
            .query_map(params![actor_id, limit], |row| self.map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 查询最近的日志
    pub fn find_recent(&self, limit: i32) -> RepositoryResult<Vec<ChangeActionLog>> {
        let conn = self.get_conn()?;

        let sql = format!(
            "SELECT {} FROM change_action_log ORDER BY action_ts DESC, rowid DESC LIMIT ?",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let logs = stmt
            .query_map(params![limit], |row| self.map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 统计指定变更的日志条数
    pub fn count_by_change(&self, change_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM change_action_log WHERE change_id = ?",
            params![change_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 将数据库行映射为 ChangeActionLog
    fn map_row(&self, row: &Row) -> SqliteResult<ChangeActionLog> {
        let action_ts_str: String = row.get(3)?;
        let payload_json_str: Option<String> = row.get(8)?;

        // 解析时间戳
        let action_ts = parse_ts(&action_ts_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

        // 解析 JSON 字段
        let payload_json = payload_json_str.and_then(|s| serde_json::from_str(&s).ok());

        Ok(ChangeActionLog {
            action_id: row.get(0)?,
            change_id: row.get(1)?,
            action_type: row.get(2)?,
            action_ts,
            actor_id: row.get(4)?,
            actor_role: row.get(5)?,
            from_status: row.get(6)?,
            to_status: row.get(7)?,
            payload_json,
            detail: row.get(9)?,
        })
    }
}
