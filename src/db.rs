// ==========================================
// 制造工艺变更跟踪系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 统一建表（幂等）与时间戳格式
// ==========================================

use chrono::NaiveDateTime;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 时间戳存储格式（定长，保证按字符串排序即按时间排序）
pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开内存数据库并建表（测试/演示用）
pub fn open_in_memory_with_schema() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS process_change (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            status TEXT NOT NULL
                CHECK(status IN ('PROPOSED', 'OPEN', 'SUBMITTED', 'ACCEPTED', 'REJECTED')),
            title TEXT NOT NULL,
            process_area TEXT NOT NULL
                CHECK(process_area IN ('METALS', 'ETCH', 'PLATING', 'SAW', 'GRIND', 'PHOTO', 'DIFFUSION', 'OTHER')),
            change_owner INTEGER NOT NULL,
            proposal_date TEXT NOT NULL,
            target_date TEXT NOT NULL,
            acceptance_date TEXT,
            age_of_change INTEGER NOT NULL DEFAULT 0,
            age_of_change_override INTEGER,
            reason TEXT NOT NULL,
            change_overview TEXT NOT NULL,
            general_comments TEXT NOT NULL DEFAULT '',
            attachments_json TEXT NOT NULL DEFAULT '[]',
            spec_updated INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_change_status ON process_change(status);
        CREATE INDEX IF NOT EXISTS idx_change_area ON process_change(process_area);
        CREATE INDEX IF NOT EXISTS idx_change_owner ON process_change(change_owner);
        CREATE INDEX IF NOT EXISTS idx_change_updated_at ON process_change(updated_at DESC);

        CREATE TABLE IF NOT EXISTS change_action_log (
            action_id TEXT PRIMARY KEY,
            change_id INTEGER NOT NULL,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            actor_id INTEGER NOT NULL,
            actor_role TEXT NOT NULL,
            from_status TEXT,
            to_status TEXT,
            payload_json TEXT,
            detail TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_action_change_ts ON change_action_log(change_id, action_ts);
        CREATE INDEX IF NOT EXISTS idx_action_actor_ts ON change_action_log(actor_id, action_ts);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 格式化时间戳（存储用）
pub fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

/// 解析时间戳（兼容无小数秒与 ISO 'T' 分隔的历史数据）
pub fn parse_ts(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
}
