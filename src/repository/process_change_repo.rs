// ==========================================
// 制造工艺变更跟踪系统 - 变更记录存储接口
// ==========================================
// 红线: 存储只做持久化，不做权限/状态机/派生字段判断
// 约束: 两种后端（内存 / SQLite）对同一调用序列行为一致
// - id 单调递增，不复用
// - list 按 updated_at DESC, id DESC 排序
// - update 原子地合并补丁并刷新 updated_at
// ==========================================

use chrono::NaiveDateTime;

use crate::domain::process_change::{
    ProcessChange, ProcessChangeDraft, ProcessChangeFilter, ProcessChangePatch,
};
use crate::repository::error::RepositoryResult;

/// 变更记录存储
pub trait ProcessChangeStore: Send + Sync {
    /// 后端名称（用于日志）
    fn backend_name(&self) -> &'static str;

    /// 插入新记录并分配 id
    fn create(&self, draft: ProcessChangeDraft) -> RepositoryResult<ProcessChange>;

    /// 按 id 查询
    fn get_by_id(&self, id: i64) -> RepositoryResult<Option<ProcessChange>>;

    /// 按过滤条件查询
    fn list(&self, filter: &ProcessChangeFilter) -> RepositoryResult<Vec<ProcessChange>>;

    /// 合并补丁
    ///
    /// # 返回
    /// - Ok(Some(record)): 合并后的记录
    /// - Ok(None): 记录不存在
    fn update(
        &self,
        id: i64,
        patch: &ProcessChangePatch,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<Option<ProcessChange>>;

    /// 删除记录，返回是否存在
    fn delete(&self, id: i64) -> RepositoryResult<bool>;

    /// 记录总数
    fn count(&self) -> RepositoryResult<usize> {
        Ok(self.list(&ProcessChangeFilter::all())?.len())
    }
}

/// 列表排序：updated_at 倒序，同一时刻按 id 倒序
pub(crate) fn sort_newest_first(records: &mut [ProcessChange]) {
    records.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
