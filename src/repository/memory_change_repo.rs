// ==========================================
// 制造工艺变更跟踪系统 - 内存存储后端
// ==========================================
// 用途: 测试与演示；进程退出即丢失
// 并发: 单把 Mutex 保护全部状态，update 在锁内读-改-写
// ==========================================

use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::process_change::{
    ProcessChange, ProcessChangeDraft, ProcessChangeFilter, ProcessChangePatch,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::process_change_repo::{sort_newest_first, ProcessChangeStore};

#[derive(Debug)]
struct MemoryState {
    records: BTreeMap<i64, ProcessChange>,
    next_id: i64,
}

/// 内存变更存储
#[derive(Debug)]
pub struct InMemoryProcessChangeStore {
    state: Mutex<MemoryState>,
}

impl Default for InMemoryProcessChangeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProcessChangeStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                records: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl ProcessChangeStore for InMemoryProcessChangeStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn create(&self, draft: ProcessChangeDraft) -> RepositoryResult<ProcessChange> {
        let mut state = self.lock()?;
        let id = state.next_id;
        state.next_id += 1;

        let record = draft.into_record(id);
        state.records.insert(id, record.clone());
        Ok(record)
    }

    fn get_by_id(&self, id: i64) -> RepositoryResult<Option<ProcessChange>> {
        Ok(self.lock()?.records.get(&id).cloned())
    }

    fn list(&self, filter: &ProcessChangeFilter) -> RepositoryResult<Vec<ProcessChange>> {
        let state = self.lock()?;
        let mut records: Vec<ProcessChange> = state
            .records
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    fn update(
        &self,
        id: i64,
        patch: &ProcessChangePatch,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<Option<ProcessChange>> {
        let mut state = self.lock()?;
        match state.records.get_mut(&id) {
            Some(record) => {
                patch.apply_to(record, updated_at);
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }

    fn delete(&self, id: i64) -> RepositoryResult<bool> {
        Ok(self.lock()?.records.remove(&id).is_some())
    }

    fn count(&self) -> RepositoryResult<usize> {
        Ok(self.lock()?.records.len())
    }
}
