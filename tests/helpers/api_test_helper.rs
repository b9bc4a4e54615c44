// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 按存储后端装配 ProcessChangeApi / DashboardApi
// - 时钟可手动推进
// - 邮件收集到 OutboxMailer
// - SQLite 后端额外挂接操作日志
// ==========================================

#![allow(dead_code)]

use chrono::{Duration, NaiveDateTime};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

use process_change_tracker::api::{ApiError, DashboardApi, ProcessChangeApi};
use process_change_tracker::config::ChangeConfig;
use process_change_tracker::domain::{Actor, ChangeStatus, ProcessChange, ProcessChangePatch};
use process_change_tracker::engine::EventPublishers;
use process_change_tracker::repository::{
    ActionLogRepository, InMemoryProcessChangeStore, ProcessChangeStore, SqliteProcessChangeStore,
};
use process_change_tracker::services::{ActionLogPublisher, NotificationPublisher, OutboxMailer};

use crate::test_helpers::{create_test_db, new_change, open_shared, ts};

/// 测试后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Sqlite,
}

pub const ALL_BACKENDS: [Backend; 2] = [Backend::Memory, Backend::Sqlite];

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 包含 API 实例与可观测的副作用（邮件、操作日志、时钟）
pub struct ApiTestEnv {
    pub backend: Backend,
    pub change_api: Arc<ProcessChangeApi>,
    pub dashboard_api: Arc<DashboardApi>,
    pub store: Arc<dyn ProcessChangeStore>,
    pub outbox: Arc<OutboxMailer>,
    pub action_log_repo: Option<Arc<ActionLogRepository>>,
    now: Arc<Mutex<NaiveDateTime>>,

    // 临时文件（确保生命周期）
    _temp_file: Option<NamedTempFile>,
}

impl ApiTestEnv {
    /// 创建测试环境（通知语言为 en）
    pub fn new(backend: Backend) -> Self {
        Self::with_config(
            backend,
            ChangeConfig {
                locale: "en".to_string(),
                ..ChangeConfig::default()
            },
        )
    }

    pub fn with_config(backend: Backend, config: ChangeConfig) -> Self {
        let (store, action_log_repo, temp_file): (
            Arc<dyn ProcessChangeStore>,
            Option<Arc<ActionLogRepository>>,
            Option<NamedTempFile>,
        ) = match backend {
            Backend::Memory => (Arc::new(InMemoryProcessChangeStore::new()), None, None),
            Backend::Sqlite => {
                let (temp_file, db_path) = create_test_db().expect("无法创建测试数据库");
                let conn = open_shared(&db_path).expect("无法打开测试数据库");
                (
                    Arc::new(SqliteProcessChangeStore::new(conn.clone())),
                    Some(Arc::new(ActionLogRepository::new(conn))),
                    Some(temp_file),
                )
            }
        };

        let outbox = Arc::new(OutboxMailer::new());
        let mut publishers = EventPublishers::none().with(Arc::new(NotificationPublisher::new(
            outbox.clone(),
            config.locale.clone(),
        )));
        if let Some(repo) = &action_log_repo {
            publishers = publishers.with(Arc::new(ActionLogPublisher::new(repo.clone())));
        }

        let now = Arc::new(Mutex::new(ts(2026, 3, 1, 9)));
        let clock_now = now.clone();
        let change_api = Arc::new(
            ProcessChangeApi::new(store.clone(), publishers, config)
                .with_clock(Arc::new(move || *clock_now.lock().unwrap())),
        );
        let dashboard_api = Arc::new(DashboardApi::new(change_api.clone(), action_log_repo.clone()));

        Self {
            backend,
            change_api,
            dashboard_api,
            store,
            outbox,
            action_log_repo,
            now,
            _temp_file: temp_file,
        }
    }

    /// 当前测试时间
    pub fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }

    /// 推进时钟
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + duration;
    }

    /// 以工程师身份创建一条变更
    pub fn create_as(&self, owner: &Actor, title: &str) -> ProcessChange {
        self.change_api
            .create_change(owner, new_change(title, process_change_tracker::ProcessArea::Etch))
            .expect("创建失败")
    }

    /// 直接在存储中把记录置为指定状态（绕过状态机，仅用于准备数据）
    pub fn force_status(&self, id: i64, status: ChangeStatus) -> ProcessChange {
        self.store
            .update(id, &ProcessChangePatch::new().with_status(status), self.now())
            .expect("存储更新失败")
            .expect("记录不存在")
    }

    /// 读取记录（管理员视角）
    pub fn load(&self, id: i64) -> Option<ProcessChange> {
        self.change_api
            .get_change(&Actor::admin(99), id)
            .expect("查询失败")
    }
}

/// 断言错误为 InvalidTransition 并返回 (from, to)
pub fn expect_invalid_transition(err: ApiError) -> (ChangeStatus, ChangeStatus) {
    match err {
        ApiError::InvalidTransition { from, to } => (from, to),
        other => panic!("Expected InvalidTransition, got {:?}", other),
    }
}
