// ==========================================
// 制造工艺变更跟踪系统 - 工艺变更 API
// ==========================================
// 职责: 变更记录的创建、查询、修改、删除与附件管理
// 流程（修改）:
//   访问策略 → 状态机（仅当 status 变化）→ 派生字段 → 存储 → 事件发布
// 约束:
// - 操作人显式传入每个操作
// - 任一校验失败则整单拒绝，不落库
// - 事件发布失败只记录日志
// ==========================================

use chrono::{Duration, NaiveDateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ChangeConfig;
use crate::domain::actor::Actor;
use crate::domain::process_change::{
    to_record_precision, NewProcessChange, ProcessChange, ProcessChangeDraft, ProcessChangeFilter,
    ProcessChangePatch,
};
use crate::domain::types::ChangeStatus;
use crate::engine::{
    AccessPolicy, ChangeEvent, ChangeEventType, DerivedFieldCalculator, EventPublishers,
    TransitionOutcome, TransitionValidator,
};
use crate::repository::ProcessChangeStore;

/// 时钟（测试中可注入固定时间）
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// 系统时钟（UTC，截断到记录精度）
pub fn system_clock() -> Clock {
    Arc::new(|| to_record_precision(Utc::now().naive_utc()))
}

/// 附件存放路径（文件本身由外部存储负责）
pub fn upload_path(change_id: i64, file_name: &str) -> String {
    format!("/uploads/change-{}/{}", change_id, file_name)
}

// ==========================================
// ProcessChangeApi - 工艺变更 API
// ==========================================
pub struct ProcessChangeApi {
    store: Arc<dyn ProcessChangeStore>,
    policy: AccessPolicy,
    validator: TransitionValidator,
    calculator: DerivedFieldCalculator,
    publishers: EventPublishers,
    config: ChangeConfig,
    clock: Clock,
    // 串行化读-改-写
    write_lock: Mutex<()>,
}

impl ProcessChangeApi {
    /// 创建新的ProcessChangeApi实例
    pub fn new(
        store: Arc<dyn ProcessChangeStore>,
        publishers: EventPublishers,
        config: ChangeConfig,
    ) -> Self {
        Self {
            store,
            policy: AccessPolicy::new(),
            validator: TransitionValidator::new(),
            calculator: DerivedFieldCalculator::new(),
            publishers,
            config,
            clock: system_clock(),
            write_lock: Mutex::new(()),
        }
    }

    /// 替换时钟
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ChangeConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn ProcessChangeStore> {
        self.store.clone()
    }

    pub(crate) fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    /// 默认目标日期 = now + default_target_days（越界返回 ValidationError）
    fn default_target_date(&self, now: NaiveDateTime) -> ApiResult<NaiveDateTime> {
        let days = self.config.default_target_days;
        Duration::try_days(days)
            .and_then(|offset| now.checked_add_signed(offset))
            .ok_or_else(|| {
                ApiError::ValidationError(format!("默认目标周期超出范围: {}天", days))
            })
    }

    fn lock_writes(&self) -> ApiResult<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|e| ApiError::InternalError(format!("写锁获取失败: {}", e)))
    }

    // ==========================================
    // 创建
    // ==========================================

    /// 创建工艺变更
    ///
    /// # 规则
    /// - 操作人成为创建人，状态固定为 PROPOSED（输入中的 status 被忽略）
    /// - 必填: title / processArea / reason / changeOverview
    /// - 默认: proposalDate=now, targetDate=now+default_target_days,
    ///   generalComments="", attachments=[], specUpdated=false
    pub fn create_change(&self, actor: &Actor, input: NewProcessChange) -> ApiResult<ProcessChange> {
        let missing = input.missing_required_fields();
        if !missing.is_empty() {
            return Err(ApiError::ValidationError(format!(
                "缺少必填字段: {}",
                missing.join(", ")
            )));
        }
        let process_area = input
            .process_area
            .ok_or_else(|| ApiError::ValidationError("缺少必填字段: processArea".to_string()))?;

        if let Some(age) = input.age_of_change {
            self.calculator.validate_age_override(age)?;
        }
        validate_attachments(&input.attachments)?;

        if let Some(status) = input.status {
            if status != ChangeStatus::Proposed {
                tracing::debug!(requested = %status, "创建时忽略输入的状态，新记录一律为 PROPOSED");
            }
        }

        let now = self.now();
        let proposal_date = input.proposal_date.unwrap_or(now);
        let target_date = match input.target_date {
            Some(date) => date,
            None => self.default_target_date(now)?,
        };
        let age_of_change = input
            .age_of_change
            .unwrap_or_else(|| self.calculator.age_in_days(proposal_date, now));

        let draft = ProcessChangeDraft {
            status: ChangeStatus::Proposed,
            title: input.title.trim().to_string(),
            process_area,
            change_owner: actor.id,
            proposal_date,
            target_date,
            age_of_change,
            age_of_change_override: input.age_of_change,
            reason: input.reason,
            change_overview: input.change_overview,
            general_comments: input.general_comments.unwrap_or_default(),
            attachments: input.attachments,
            spec_updated: input.spec_updated,
            created_at: now,
        };

        let created = self.store.create(draft)?;
        tracing::info!(
            change_id = created.id,
            actor_id = actor.id,
            process_area = %created.process_area,
            backend = self.store.backend_name(),
            "工艺变更已创建"
        );

        self.publishers.publish_all(&ChangeEvent::new(
            &created,
            ChangeEventType::Created,
            actor,
            now,
        ));
        Ok(created)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 查询单条变更（不存在返回 Ok(None)）
    pub fn get_change(&self, actor: &Actor, id: i64) -> ApiResult<Option<ProcessChange>> {
        let now = self.now();
        let record = self.store.get_by_id(id)?.filter(|r| self.policy.can_read(actor, r));
        Ok(record.map(|mut r| {
            self.calculator.refresh_age(&mut r, now);
            r
        }))
    }

    /// 查询变更列表（updated_at 倒序）
    pub fn list_changes(
        &self,
        actor: &Actor,
        filter: &ProcessChangeFilter,
    ) -> ApiResult<Vec<ProcessChange>> {
        let now = self.now();
        let mut records = self.store.list(filter)?;
        records.retain(|r| self.policy.can_read(actor, r));
        for record in records.iter_mut() {
            self.calculator.refresh_age(record, now);
        }
        tracing::debug!(actor_id = actor.id, count = records.len(), "查询变更列表");
        Ok(records)
    }

    // ==========================================
    // 修改
    // ==========================================

    /// 修改变更
    ///
    /// # 返回
    /// - Ok(record): 修改后的记录
    /// - Err(NotFound): 记录不存在
    /// - Err(PermissionDenied): 访问策略拒绝
    /// - Err(InvalidTransition): 状态机拒绝
    /// - Err(ValidationError): 派生字段/输入校验失败
    pub fn update_change(
        &self,
        actor: &Actor,
        id: i64,
        patch: ProcessChangePatch,
    ) -> ApiResult<ProcessChange> {
        self.mutate(actor, id, move |_| Ok(patch))
    }

    /// 追加附件引用
    pub fn add_attachment(
        &self,
        actor: &Actor,
        id: i64,
        reference: &str,
    ) -> ApiResult<ProcessChange> {
        let reference = reference.trim().to_string();
        if reference.is_empty() {
            return Err(ApiError::ValidationError("附件引用不能为空".to_string()));
        }

        self.mutate(actor, id, |record| {
            if record.attachments.contains(&reference) {
                return Err(ApiError::ValidationError(format!(
                    "附件已存在: {}",
                    reference
                )));
            }
            let mut attachments = record.attachments.clone();
            attachments.push(reference.clone());
            Ok(ProcessChangePatch::new().with_attachments(attachments))
        })
    }

    /// 移除附件引用（保持其余附件顺序）
    pub fn remove_attachment(
        &self,
        actor: &Actor,
        id: i64,
        reference: &str,
    ) -> ApiResult<ProcessChange> {
        let reference = reference.trim();
        self.mutate(actor, id, |record| {
            if !record.attachments.iter().any(|a| a == reference) {
                return Err(ApiError::NotFound(format!(
                    "变更#{}不包含附件: {}",
                    record.id, reference
                )));
            }
            let attachments = record
                .attachments
                .iter()
                .filter(|a| a.as_str() != reference)
                .cloned()
                .collect();
            Ok(ProcessChangePatch::new().with_attachments(attachments))
        })
    }

    /// 读-改-写的统一入口
    fn mutate<F>(&self, actor: &Actor, id: i64, build_patch: F) -> ApiResult<ProcessChange>
    where
        F: FnOnce(&ProcessChange) -> ApiResult<ProcessChangePatch>,
    {
        let guard = self.lock_writes()?;
        let now = self.now();

        let record = self
            .store
            .get_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("工艺变更(id={})不存在", id)))?;

        let patch = build_patch(&record)?;
        if patch.is_empty() {
            return Err(ApiError::ValidationError("更新请求不包含任何字段".to_string()));
        }
        let fields = patch.fields();

        // 1. 访问策略
        if let Err(e) = self.policy.can_write(actor, &record, &fields) {
            tracing::warn!(change_id = id, actor_id = actor.id, role = %actor.role, "修改被拒绝: {}", e);
            return Err(e.into());
        }

        // 2. 状态机
        let outcome = match patch.status {
            Some(requested) => match self.validator.validate(actor, &record, requested) {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(change_id = id, actor_id = actor.id, role = %actor.role, "状态迁移被拒绝: {}", e);
                    return Err(e.into());
                }
            },
            None => TransitionOutcome::NoOp,
        };

        // 3. 派生字段
        if let Some(attachments) = &patch.attachments {
            validate_attachments(attachments)?;
        }
        let completed = self.calculator.complete_patch(&record, &patch, now)?;

        // 4. 落库
        let mut updated = self
            .store
            .update(id, &completed, now)?
            .ok_or_else(|| ApiError::NotFound(format!("工艺变更(id={})不存在", id)))?;
        drop(guard);

        self.calculator.refresh_age(&mut updated, now);

        // 5. 事件
        let event_type = match outcome {
            TransitionOutcome::Move { from, to } => {
                tracing::info!(
                    change_id = id,
                    actor_id = actor.id,
                    from = %from,
                    to = %to,
                    "工艺变更状态迁移"
                );
                ChangeEventType::StatusChanged { from, to }
            }
            TransitionOutcome::NoOp => {
                tracing::info!(change_id = id, actor_id = actor.id, fields = fields.len(), "工艺变更已修改");
                ChangeEventType::Updated
            }
        };
        self.publishers.publish_all(
            &ChangeEvent::new(&updated, event_type, actor, now).with_fields(fields),
        );

        Ok(updated)
    }

    // ==========================================
    // 删除
    // ==========================================

    /// 删除变更（硬删除，仅创建人或管理员，任意状态）
    ///
    /// # 返回
    /// - Ok(true): 已删除
    /// - Ok(false): 记录不存在
    pub fn delete_change(&self, actor: &Actor, id: i64) -> ApiResult<bool> {
        let guard = self.lock_writes()?;
        let now = self.now();

        let record = match self.store.get_by_id(id)? {
            Some(r) => r,
            None => return Ok(false),
        };

        if let Err(e) = self.policy.can_delete(actor, &record) {
            tracing::warn!(change_id = id, actor_id = actor.id, "删除被拒绝: {}", e);
            return Err(e.into());
        }

        let deleted = self.store.delete(id)?;
        drop(guard);

        if deleted {
            tracing::info!(change_id = id, actor_id = actor.id, "工艺变更已删除");
            self.publishers.publish_all(&ChangeEvent::new(
                &record,
                ChangeEventType::Deleted,
                actor,
                now,
            ));
        }
        Ok(deleted)
    }
}

/// 附件引用不能为空白
fn validate_attachments(attachments: &[String]) -> ApiResult<()> {
    if attachments.iter().any(|a| a.trim().is_empty()) {
        return Err(ApiError::ValidationError("附件引用不能为空".to_string()));
    }
    Ok(())
}
