// ==========================================
// 制造工艺变更跟踪系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ChangeConfig - 业务配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeConfig {
    /// 未指定目标日期时，目标日期 = 创建时刻 + N 天（取值 0..=MAX_TARGET_DAYS）
    pub default_target_days: i64,
    /// 是否发送变更通知
    pub notifications_enabled: bool,
    /// 通知语言
    pub locale: String,
}

/// 默认目标周期上限（天）
pub const MAX_TARGET_DAYS: i64 = 36_500;

impl Default for ChangeConfig {
    fn default() -> Self {
        Self {
            default_target_days: 30,
            notifications_enabled: true,
            locale: "zh-CN".to_string(),
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 加载业务配置
    ///
    /// 缺失或无法解析的键回退到默认值（解析失败记录 warn）
    pub fn load_change_config(&self) -> Result<ChangeConfig, Box<dyn Error>> {
        let defaults = ChangeConfig::default();

        let default_target_days = match self.get_global_config_value(config_keys::DEFAULT_TARGET_DAYS)? {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(days) if (0..=MAX_TARGET_DAYS).contains(&days) => days,
                _ => {
                    tracing::warn!(key = config_keys::DEFAULT_TARGET_DAYS, value = %raw, "配置值无效，使用默认值");
                    defaults.default_target_days
                }
            },
            None => defaults.default_target_days,
        };

        let notifications_enabled =
            match self.get_global_config_value(config_keys::NOTIFICATIONS_ENABLED)? {
                Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                    "1" | "true" | "yes" | "on" => true,
                    "0" | "false" | "no" | "off" => false,
                    _ => {
                        tracing::warn!(key = config_keys::NOTIFICATIONS_ENABLED, value = %raw, "配置值无效，使用默认值");
                        defaults.notifications_enabled
                    }
                },
                None => defaults.notifications_enabled,
            };

        let locale = self
            .get_global_config_value(config_keys::LOCALE)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.locale);

        Ok(ChangeConfig {
            default_target_days,
            notifications_enabled,
            locale,
        })
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        // 查询所有global scope的配置
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 默认目标周期（天）
    pub const DEFAULT_TARGET_DAYS: &str = "default_target_days";

    // 通知
    pub const NOTIFICATIONS_ENABLED: &str = "notifications_enabled";
    pub const LOCALE: &str = "locale";
}
