// ==========================================
// 制造工艺变更跟踪系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 环境变量:
// - PROCESS_CHANGE_STORE=memory|sqlite（默认 sqlite）
// - PROCESS_CHANGE_DB_PATH: SQLite 文件路径
// ==========================================

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::api::{DashboardApi, ProcessChangeApi};
use crate::config::{ChangeConfig, ConfigManager};
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::EventPublishers;
use crate::repository::{
    ActionLogRepository, InMemoryProcessChangeStore, ProcessChangeStore, SqliteProcessChangeStore,
};
use crate::services::{ActionLogPublisher, LogMailer, Mailer, NotificationPublisher};

/// 存储后端选择
pub const STORE_BACKEND_ENV: &str = "PROCESS_CHANGE_STORE";
/// 数据库路径
pub const DB_PATH_ENV: &str = "PROCESS_CHANGE_DB_PATH";

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

impl StoreBackend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Some(StoreBackend::Memory),
            "sqlite" | "db" => Some(StoreBackend::Sqlite),
            _ => None,
        }
    }

    /// 从环境变量读取（未设置或无法识别时为 Sqlite）
    pub fn from_env() -> Self {
        match std::env::var(STORE_BACKEND_ENV) {
            Ok(raw) => Self::parse(&raw).unwrap_or_else(|| {
                tracing::warn!("{}={} 无法识别，使用 sqlite", STORE_BACKEND_ENV, raw);
                StoreBackend::Sqlite
            }),
            Err(_) => StoreBackend::Sqlite,
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => f.write_str("memory"),
            StoreBackend::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    pub backend: StoreBackend,

    /// 数据库路径（内存后端为 None）
    pub db_path: Option<String>,

    /// 生效的业务配置
    pub config: ChangeConfig,

    /// 工艺变更API
    pub process_change_api: Arc<ProcessChangeApi>,

    /// 看板API
    pub dashboard_api: Arc<DashboardApi>,

    /// 操作日志仓储（用于审计追踪，内存后端为 None）
    pub action_log_repo: Option<Arc<ActionLogRepository>>,
}

impl AppState {
    /// 使用 SQLite 后端创建
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并建表（幂等）
    /// 2. 从 config_kv 读取业务配置
    /// 3. 装配事件发布者（通知 + 操作日志）并创建 API 实例
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::open(StoreBackend::Sqlite, Some(db_path), Arc::new(LogMailer))
    }

    /// 使用内存后端创建
    pub fn in_memory() -> Result<Self, String> {
        Self::open(StoreBackend::Memory, None, Arc::new(LogMailer))
    }

    /// 按环境变量创建
    pub fn from_env() -> Result<Self, String> {
        match StoreBackend::from_env() {
            StoreBackend::Memory => Self::in_memory(),
            StoreBackend::Sqlite => Self::new(get_default_db_path()),
        }
    }

    /// 通用装配入口
    pub fn open(
        backend: StoreBackend,
        db_path: Option<String>,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self, String> {
        tracing::info!(backend = %backend, db_path = ?db_path, "初始化AppState");

        let (store, action_log_repo, config): (
            Arc<dyn ProcessChangeStore>,
            Option<Arc<ActionLogRepository>>,
            ChangeConfig,
        ) = match backend {
            StoreBackend::Memory => (
                Arc::new(InMemoryProcessChangeStore::new()),
                None,
                ChangeConfig::default(),
            ),
            StoreBackend::Sqlite => {
                let path = db_path
                    .clone()
                    .ok_or_else(|| "SQLite 后端需要数据库路径".to_string())?;

                // 创建数据库连接（共享连接）
                let conn = open_sqlite_connection(&path)
                    .map_err(|e| format!("无法打开数据库: {}", e))?;
                init_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;
                let conn = Arc::new(Mutex::new(conn));

                let config = ConfigManager::from_connection(conn.clone())
                    .and_then(|mgr| mgr.load_change_config())
                    .map_err(|e| format!("配置加载失败: {}", e))?;

                (
                    Arc::new(SqliteProcessChangeStore::new(conn.clone())),
                    Some(Arc::new(ActionLogRepository::new(conn))),
                    config,
                )
            }
        };

        // ==========================================
        // 事件发布者
        // ==========================================
        let mut publishers = EventPublishers::none();
        if config.notifications_enabled {
            publishers = publishers.with(Arc::new(NotificationPublisher::new(
                mailer,
                config.locale.clone(),
            )));
        }
        if let Some(repo) = &action_log_repo {
            publishers = publishers.with(Arc::new(ActionLogPublisher::new(repo.clone())));
        }
        tracing::debug!(publishers = publishers.len(), "事件发布者已装配");

        // ==========================================
        // API层
        // ==========================================
        let process_change_api = Arc::new(ProcessChangeApi::new(store, publishers, config.clone()));
        let dashboard_api = Arc::new(DashboardApi::new(
            process_change_api.clone(),
            action_log_repo.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            backend,
            db_path,
            config,
            process_change_api,
            dashboard_api,
            action_log_repo,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先使用 PROCESS_CHANGE_DB_PATH；否则位于用户数据目录下
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    // 默认回退值，能拿到 data_dir 时再覆盖
    let mut path = PathBuf::from("./process_change_tracker.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("process-change-tracker-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("process-change-tracker");
        }

        // 确保目录存在
        std::fs::create_dir_all(&path).ok();
        path = path.join("process_change_tracker.db");
    }

    path.to_string_lossy().to_string()
}
