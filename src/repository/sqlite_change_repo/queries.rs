use super::core::SqliteProcessChangeStore;
use crate::db::{format_ts, parse_ts};
use crate::domain::process_change::{
    ProcessChange, ProcessChangeDraft, ProcessChangeFilter, ProcessChangePatch,
};
use crate::domain::types::{ChangeStatus, ProcessArea};
use crate::repository::error::RepositoryResult;
use crate::repository::process_change_repo::ProcessChangeStore;
use chrono::NaiveDateTime;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result as SqliteResult, Row};

const SELECT_COLUMNS: &str = "id, status, change_owner, title, process_area, reason, change_overview, \
                              general_comments, attachments_json, spec_updated, proposal_date, \
                              target_date, acceptance_date, age_of_change, age_of_change_override, \
                              created_at, updated_at";

impl ProcessChangeStore for SqliteProcessChangeStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn create(&self, draft: ProcessChangeDraft) -> RepositoryResult<ProcessChange> {
        let conn = self.get_conn()?;
        let attachments_json = serde_json::to_string(&draft.attachments)?;
        let created_at = format_ts(&draft.created_at);

        conn.execute(
            r#"
            INSERT INTO process_change (
                status, title, process_area, change_owner, proposal_date, target_date,
                acceptance_date, age_of_change, age_of_change_override, reason,
                change_overview, general_comments, attachments_json, spec_updated,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, NULL, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                draft.status.as_str(),
                draft.title,
                draft.process_area.as_str(),
                draft.change_owner,
                format_ts(&draft.proposal_date),
                format_ts(&draft.target_date),
                draft.age_of_change,
                draft.age_of_change_override,
                draft.reason,
                draft.change_overview,
                draft.general_comments,
                attachments_json,
                draft.spec_updated,
                created_at,
                created_at,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Ok(draft.into_record(id))
    }

    fn get_by_id(&self, id: i64) -> RepositoryResult<Option<ProcessChange>> {
        let conn = self.get_conn()?;
        Ok(Self::select_one(&conn, id)?)
    }

    fn list(&self, filter: &ProcessChangeFilter) -> RepositoryResult<Vec<ProcessChange>> {
        let conn = self.get_conn()?;

        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        if let Some(status) = filter.status {
            conditions.push("status = ?");
            values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(area) = filter.process_area {
            conditions.push("process_area = ?");
            values.push(Value::Text(area.as_str().to_string()));
        }
        if let Some(owner) = filter.change_owner {
            conditions.push("change_owner = ?");
            values.push(Value::Integer(owner));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM process_change {} ORDER BY updated_at DESC, id DESC",
            SELECT_COLUMNS, where_clause
        );

        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(values), |row| Self::map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    fn update(
        &self,
        id: i64,
        patch: &ProcessChangePatch,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<Option<ProcessChange>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut record = match Self::select_one(&tx, id)? {
            Some(r) => r,
            None => return Ok(None),
        };

        patch.apply_to(&mut record, updated_at);
        Self::write_back(&tx, &record)?;
        tx.commit()?;

        Ok(Some(record))
    }

    fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM process_change WHERE id = ?", params![id])?;
        Ok(rows > 0)
    }

    fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM process_change", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl SqliteProcessChangeStore {
    // ==========================================
    // 辅助方法
    // ==========================================

    fn select_one(conn: &Connection, id: i64) -> SqliteResult<Option<ProcessChange>> {
        let sql = format!("SELECT {} FROM process_change WHERE id = ?", SELECT_COLUMNS);
        conn.query_row(&sql, params![id], |row| Self::map_row(row))
            .optional()
    }

    /// 将数据库行映射为 ProcessChange
    fn map_row(row: &Row) -> SqliteResult<ProcessChange> {
        let status_str: String = row.get(1)?;
        let status = ChangeStatus::parse(&status_str)
            .ok_or_else(|| invalid_text(1, format!("未知状态: {}", status_str)))?;

        let area_str: String = row.get(4)?;
        let process_area = ProcessArea::parse(&area_str)
            .ok_or_else(|| invalid_text(4, format!("未知工艺区域: {}", area_str)))?;

        let attachments_str: String = row.get(8)?;
        let attachments: Vec<String> = serde_json::from_str(&attachments_str)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;

        let acceptance_str: Option<String> = row.get(12)?;
        let acceptance_date = match acceptance_str {
            Some(s) => Some(ts_column(12, &s)?),
            None => None,
        };

        Ok(ProcessChange {
            id: row.get(0)?,
            status,
            change_owner: row.get(2)?,
            title: row.get(3)?,
            process_area,
            reason: row.get(5)?,
            change_overview: row.get(6)?,
            general_comments: row.get(7)?,
            attachments,
            spec_updated: row.get(9)?,
            proposal_date: ts_column(10, &row.get::<_, String>(10)?)?,
            target_date: ts_column(11, &row.get::<_, String>(11)?)?,
            acceptance_date,
            age_of_change: row.get(13)?,
            age_of_change_override: row.get(14)?,
            created_at: ts_column(15, &row.get::<_, String>(15)?)?,
            updated_at: ts_column(16, &row.get::<_, String>(16)?)?,
        })
    }
}

fn ts_column(idx: usize, s: &str) -> SqliteResult<NaiveDateTime> {
    parse_ts(s).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn invalid_text(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}
