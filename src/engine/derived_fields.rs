// ==========================================
// 制造工艺变更跟踪系统 - 派生字段计算
// ==========================================
// 职责:
// 1. ageOfChange = ceil(|now - proposalDate| / 1天)，创建与读取共用同一公式
//    写入时显式指定的值（>= 0）优先
// 2. acceptanceDate 仅在进入 ACCEPTED 时写入一次，之后不清除、不覆盖
//    （调用方显式提供的值除外）
// ==========================================

use chrono::NaiveDateTime;

use crate::domain::process_change::{ProcessChange, ProcessChangePatch};
use crate::domain::types::ChangeStatus;
use crate::engine::error::{EngineError, EngineResult};

/// 一天的毫秒数
const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Default, Clone, Copy)]
pub struct DerivedFieldCalculator;

impl DerivedFieldCalculator {
    pub fn new() -> Self {
        Self
    }

    /// 距提案日的天数（向上取整，取绝对值）
    pub fn age_in_days(&self, proposal_date: NaiveDateTime, now: NaiveDateTime) -> i64 {
        let millis = (now - proposal_date).num_milliseconds().abs();
        (millis + DAY_MILLIS - 1) / DAY_MILLIS
    }

    /// 读取时刷新 ageOfChange（有显式值则使用显式值）
    pub fn refresh_age(&self, record: &mut ProcessChange, now: NaiveDateTime) {
        record.age_of_change = match record.age_of_change_override {
            Some(age) => age,
            None => self.age_in_days(record.proposal_date, now),
        };
    }

    /// 校验显式指定的 ageOfChange
    pub fn validate_age_override(&self, age: i64) -> EngineResult<()> {
        if age < 0 {
            return Err(EngineError::ValidationError(format!(
                "ageOfChange不能为负数: {}",
                age
            )));
        }
        Ok(())
    }

    /// 补齐一次更新请求的派生字段
    ///
    /// # 参数
    /// - record: 当前记录（更新前）
    /// - patch: 已通过权限与状态机校验的请求
    /// - now: 当前时间
    ///
    /// # 返回
    /// - Ok(patch): 补齐 acceptanceDate 后的请求
    /// - Err(ValidationError): 显式 acceptanceDate 不满足不变式、ageOfChange 为负、必填字段被清空
    pub fn complete_patch(
        &self,
        record: &ProcessChange,
        patch: &ProcessChangePatch,
        now: NaiveDateTime,
    ) -> EngineResult<ProcessChangePatch> {
        let mut completed = patch.clone();
        let target_status = patch.status.unwrap_or(record.status);

        if let Some(age) = patch.age_of_change {
            self.validate_age_override(age)?;
        }

        for (name, value) in [
            ("title", &patch.title),
            ("reason", &patch.reason),
            ("changeOverview", &patch.change_overview),
        ] {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(EngineError::ValidationError(format!("{}不能为空", name)));
            }
        }

        if patch.acceptance_date.is_some()
            && target_status != ChangeStatus::Accepted
            && !record.has_been_accepted()
        {
            return Err(EngineError::ValidationError(
                "acceptanceDate只能在变更被接受时设置".to_string(),
            ));
        }

        if target_status == ChangeStatus::Accepted
            && record.acceptance_date.is_none()
            && patch.acceptance_date.is_none()
        {
            completed.acceptance_date = Some(now);
        }

        Ok(completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::process_change::ProcessChangeDraft;
    use crate::domain::types::ProcessArea;
    use chrono::{Duration, NaiveDate};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn record(status: ChangeStatus) -> ProcessChange {
        ProcessChangeDraft {
            status,
            title: "研磨参数".to_string(),
            process_area: ProcessArea::Grind,
            change_owner: 1,
            proposal_date: at(1, 0),
            target_date: at(30, 0),
            age_of_change: 0,
            age_of_change_override: None,
            reason: "r".to_string(),
            change_overview: "o".to_string(),
            general_comments: String::new(),
            attachments: vec![],
            spec_updated: false,
            created_at: at(1, 0),
        }
        .into_record(1)
    }

    #[test]
    fn test_age_rounds_up_partial_days() {
        let calc = DerivedFieldCalculator::new();
        assert_eq!(calc.age_in_days(at(1, 0), at(1, 0)), 0);
        assert_eq!(calc.age_in_days(at(1, 0), at(1, 1)), 1);
        assert_eq!(calc.age_in_days(at(1, 0), at(3, 0)), 2);
        assert_eq!(calc.age_in_days(at(1, 0), at(3, 0) + Duration::seconds(1)), 3);
    }

    #[test]
    fn test_age_uses_absolute_difference() {
        let calc = DerivedFieldCalculator::new();
        // 提案日在未来
        assert_eq!(calc.age_in_days(at(10, 0), at(8, 12)), 2);
    }

    #[test]
    fn test_refresh_age_respects_override() {
        let calc = DerivedFieldCalculator::new();
        let mut r = record(ChangeStatus::Open);
        calc.refresh_age(&mut r, at(4, 0));
        assert_eq!(r.age_of_change, 3);

        r.age_of_change_override = Some(45);
        calc.refresh_age(&mut r, at(4, 0));
        assert_eq!(r.age_of_change, 45);
    }

    #[test]
    fn test_entering_accepted_sets_acceptance_date() {
        let calc = DerivedFieldCalculator::new();
        let r = record(ChangeStatus::Submitted);
        let patch = ProcessChangePatch::new().with_status(ChangeStatus::Accepted);
        let completed = calc.complete_patch(&r, &patch, at(9, 0)).unwrap();
        assert_eq!(completed.acceptance_date, Some(at(9, 0)));
    }

    #[test]
    fn test_explicit_acceptance_date_wins() {
        let calc = DerivedFieldCalculator::new();
        let r = record(ChangeStatus::Submitted);
        let patch = ProcessChangePatch::new()
            .with_status(ChangeStatus::Accepted)
            .with_acceptance_date(at(7, 0));
        let completed = calc.complete_patch(&r, &patch, at(9, 0)).unwrap();
        assert_eq!(completed.acceptance_date, Some(at(7, 0)));
    }

    #[test]
    fn test_reentering_accepted_keeps_existing_date() {
        let calc = DerivedFieldCalculator::new();
        let mut r = record(ChangeStatus::Rejected);
        r.acceptance_date = Some(at(3, 0));
        let patch = ProcessChangePatch::new().with_status(ChangeStatus::Accepted);
        let completed = calc.complete_patch(&r, &patch, at(9, 0)).unwrap();
        assert_eq!(completed.acceptance_date, None);
    }

    #[test]
    fn test_acceptance_date_without_acceptance_is_rejected() {
        let calc = DerivedFieldCalculator::new();
        let r = record(ChangeStatus::Submitted);
        let patch = ProcessChangePatch::new().with_acceptance_date(at(7, 0));
        assert!(matches!(
            calc.complete_patch(&r, &patch, at(9, 0)),
            Err(EngineError::ValidationError(_))
        ));
    }

    #[test]
    fn test_negative_age_and_blank_title_rejected() {
        let calc = DerivedFieldCalculator::new();
        let r = record(ChangeStatus::Open);

        let mut patch = ProcessChangePatch::new();
        patch.age_of_change = Some(-1);
        assert!(calc.complete_patch(&r, &patch, at(9, 0)).is_err());

        let patch = ProcessChangePatch::new().with_title("   ");
        assert!(calc.complete_patch(&r, &patch, at(9, 0)).is_err());
    }
}
