// ==========================================
// 重建演示数据库
// ==========================================
// 用法: reset_and_seed_demo_db [db_path]
// - 已存在的库先备份为 <db_path>.bak.<时间戳> 再删除
// - 建表 + 写入演示变更
// ==========================================

use chrono::Local;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use process_change_tracker::app::get_default_db_path;
use process_change_tracker::db::{init_schema, open_sqlite_connection, read_schema_version};
use process_change_tracker::repository::SqliteProcessChangeStore;
use process_change_tracker::{logging, seed};

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let schema_version = read_schema_version(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    let store = SqliteProcessChangeStore::new(conn.clone());
    let seeded = seed::seed_store(&store)?;

    eprintln!("Seeded {} ({:?})", db_path, schema_version);
    for change in &seeded {
        eprintln!(
            "  #{:<3} {:<10} {:<10} {}",
            change.id, change.status, change.process_area, change.title
        );
    }

    print_quick_counts(conn)?;
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn print_quick_counts(conn: Arc<Mutex<rusqlite::Connection>>) -> Result<(), Box<dyn Error>> {
    let conn = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
    let tables = ["process_change", "change_action_log", "config_kv"];

    eprintln!("Row counts:");
    for t in tables {
        let sql = format!("SELECT COUNT(*) FROM {}", t);
        let c: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        eprintln!("  {:<20} {}", t, c);
    }
    Ok(())
}
