// ==========================================
// ProcessChangeApi 集成测试
// ==========================================
// 测试范围（内存 / SQLite 两种后端逐一执行）:
// 1. 创建: 默认值、必填字段、状态固定为 PROPOSED
// 2. 状态机: 按角色 × (当前, 目标) 全表校验
// 3. 访问策略: 主管只能改评审字段、非创建人工程师只读
// 4. 派生字段: acceptanceDate / ageOfChange
// 5. 删除、附件、通知与操作日志
// ==========================================

mod helpers;

use chrono::Duration;
use helpers::api_test_helper::*;
use process_change_tracker::api::ApiError;
use process_change_tracker::domain::{
    Actor, ChangeStatus, NewProcessChange, ProcessArea, ProcessChangeFilter, ProcessChangePatch,
    UserRole,
};
use process_change_tracker::services::Recipient;
use test_helpers::{new_change, ts};

fn engineer() -> Actor {
    Actor::engineer(1).with_name("John Engineer")
}

fn other_engineer() -> Actor {
    Actor::engineer(4)
}

fn supervisor() -> Actor {
    Actor::supervisor(2).with_name("Jane Supervisor")
}

fn admin() -> Actor {
    Actor::admin(3)
}

// ==========================================
// 创建
// ==========================================

#[test]
fn test_create_applies_defaults() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);
        let now = env.now();

        let created = env
            .change_api
            .create_change(&engineer(), new_change("新刻蚀配方", ProcessArea::Etch))
            .unwrap();

        assert_eq!(created.status, ChangeStatus::Proposed, "{:?}", backend);
        assert_eq!(created.change_owner, 1);
        assert_eq!(created.proposal_date, now);
        assert_eq!(created.target_date, now + Duration::days(30));
        assert_eq!(created.age_of_change, 0);
        assert_eq!(created.acceptance_date, None);
        assert_eq!(created.general_comments, "");
        assert!(created.attachments.is_empty());
        assert!(!created.spec_updated);
        assert_eq!(created.created_at, created.updated_at);

        let loaded = env.load(created.id).unwrap();
        assert_eq!(loaded.title, "新刻蚀配方");
    }
}

#[test]
fn test_create_ignores_requested_status() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);
        let mut input = new_change("直接接受?", ProcessArea::Plating);
        input.status = Some(ChangeStatus::Accepted);

        let created = env.change_api.create_change(&engineer(), input).unwrap();
        assert_eq!(created.status, ChangeStatus::Proposed);
        assert_eq!(created.acceptance_date, None);
    }
}

#[test]
fn test_create_missing_required_fields() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);
        let input = NewProcessChange {
            title: "  ".to_string(),
            reason: "r".to_string(),
            ..Default::default()
        };

        match env.change_api.create_change(&engineer(), input) {
            Err(ApiError::ValidationError(msg)) => {
                assert!(msg.contains("title"));
                assert!(msg.contains("processArea"));
                assert!(msg.contains("changeOverview"));
                assert!(!msg.contains("reason"));
            }
            other => panic!("Expected ValidationError, got {:?}", other),
        }
        assert_eq!(env.store.count().unwrap(), 0);
    }
}

#[test]
fn test_create_age_is_never_negative() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);

        // 提案日在未来: 取绝对值
        let mut input = new_change("未来提案", ProcessArea::Photo);
        input.proposal_date = Some(env.now() + Duration::hours(36));
        let created = env.change_api.create_change(&engineer(), input).unwrap();
        assert_eq!(created.age_of_change, 2);

        let mut input = new_change("负周期", ProcessArea::Photo);
        input.age_of_change = Some(-1);
        assert!(matches!(
            env.change_api.create_change(&engineer(), input),
            Err(ApiError::ValidationError(_))
        ));
    }
}

#[test]
fn test_age_refreshes_on_read() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);
        let created = env.create_as(&engineer(), "周期");

        env.advance(Duration::hours(25));
        assert_eq!(env.load(created.id).unwrap().age_of_change, 2);

        env.advance(Duration::days(3));
        let listed = env
            .change_api
            .list_changes(&engineer(), &ProcessChangeFilter::all())
            .unwrap();
        assert_eq!(listed[0].age_of_change, 5);

        // 显式指定的周期优先
        let patch = ProcessChangePatch {
            age_of_change: Some(1),
            ..Default::default()
        };
        env.change_api.update_change(&engineer(), created.id, patch).unwrap();
        env.advance(Duration::days(10));
        assert_eq!(env.load(created.id).unwrap().age_of_change, 1);
    }
}

// ==========================================
// 状态机全表
// ==========================================

/// 期望的迁移权（与角色/是否创建人对应）
fn expected_allowed(role: UserRole, is_owner: bool, from: ChangeStatus, to: ChangeStatus) -> bool {
    use ChangeStatus::*;
    if from == to {
        return true;
    }
    let owner_move = matches!((from, to), (Open, Submitted));
    let supervisor_move = matches!(
        (from, to),
        (Proposed, Open) | (Submitted, Accepted) | (Submitted, Rejected)
    );
    match role {
        UserRole::Admin => true,
        UserRole::Supervisor => supervisor_move || (is_owner && owner_move),
        UserRole::Engineer => is_owner && owner_move,
    }
}

#[test]
fn test_transition_table_is_exact() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);
        let owner = engineer();

        let cases = [
            (owner.clone(), true),
            (other_engineer(), false),
            (supervisor(), false),
            (admin(), false),
        ];

        for (actor, is_owner) in cases.iter() {
            for from in ChangeStatus::ALL {
                for to in ChangeStatus::ALL {
                    let record = env.create_as(&owner, "状态机");
                    env.force_status(record.id, from);

                    let result = env.change_api.update_change(
                        actor,
                        record.id,
                        ProcessChangePatch::new().with_status(to),
                    );
                    let allowed = expected_allowed(actor.role, *is_owner, from, to);

                    match result {
                        Ok(updated) => {
                            assert!(allowed, "{:?} {:?} {}→{} 不应允许", backend, actor.role, from, to);
                            assert_eq!(updated.status, to);
                        }
                        Err(ApiError::InvalidTransition { from: f, to: t }) => {
                            assert!(!allowed, "{:?} {:?} {}→{} 应允许", backend, actor.role, from, to);
                            assert_eq!((f, t), (from, to));
                            assert_eq!(env.load(record.id).unwrap().status, from);
                        }
                        Err(ApiError::PermissionDenied(_)) => {
                            // 非创建人工程师没有任何写权限
                            assert_eq!(actor.id, other_engineer().id);
                        }
                        Err(other) => panic!("unexpected error: {:?}", other),
                    }
                }
            }
        }
    }
}

#[test]
fn test_owner_submits_and_updated_at_refreshes() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);
        let owner = engineer();
        let record = env.create_as(&owner, "提交审核");
        env.force_status(record.id, ChangeStatus::Open);

        env.advance(Duration::minutes(5));
        let submitted = env
            .change_api
            .update_change(&owner, record.id, ProcessChangePatch::new().with_status(ChangeStatus::Submitted))
            .unwrap();
        assert_eq!(submitted.status, ChangeStatus::Submitted);
        assert_eq!(submitted.updated_at, env.now());
        assert!(submitted.updated_at > record.updated_at);

        let err = env
            .change_api
            .update_change(&owner, record.id, ProcessChangePatch::new().with_status(ChangeStatus::Accepted))
            .unwrap_err();
        assert_eq!(
            expect_invalid_transition(err),
            (ChangeStatus::Submitted, ChangeStatus::Accepted)
        );
    }
}

#[test]
fn test_owner_cannot_accept_from_open() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);
        let record = env.create_as(&engineer(), "越级接受");
        env.force_status(record.id, ChangeStatus::Open);

        let err = env
            .change_api
            .update_change(&engineer(), record.id, ProcessChangePatch::new().with_status(ChangeStatus::Accepted))
            .unwrap_err();
        assert_eq!(expect_invalid_transition(err), (ChangeStatus::Open, ChangeStatus::Accepted));
    }
}

#[test]
fn test_supervisor_owner_gets_owner_transition() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);
        let sup = supervisor();
        let record = env.create_as(&sup, "主管自己的变更");
        env.force_status(record.id, ChangeStatus::Open);

        let updated = env
            .change_api
            .update_change(&sup, record.id, ProcessChangePatch::new().with_status(ChangeStatus::Submitted))
            .unwrap();
        assert_eq!(updated.status, ChangeStatus::Submitted);
    }
}

#[test]
fn test_admin_reopens_rejected() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);
        let record = env.create_as(&engineer(), "重新打开");
        env.force_status(record.id, ChangeStatus::Rejected);

        let reopened = env
            .change_api
            .update_change(&admin(), record.id, ProcessChangePatch::new().with_status(ChangeStatus::Open))
            .unwrap();
        assert_eq!(reopened.status, ChangeStatus::Open);
    }
}

// ==========================================
// 派生字段: acceptanceDate
// ==========================================

#[test]
fn test_supervisor_accepts_and_acceptance_date_is_set() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);
        let record = env.create_as(&engineer(), "待接受");
        env.force_status(record.id, ChangeStatus::Submitted);
        env.advance(Duration::days(2));

        let accepted = env
            .change_api
            .update_change(
                &supervisor(),
                record.id,
                ProcessChangePatch::new()
                    .with_status(ChangeStatus::Accepted)
                    .with_general_comments("试产通过"),
            )
            .unwrap();

        assert_eq!(accepted.status, ChangeStatus::Accepted);
        assert_eq!(accepted.acceptance_date, Some(env.now()));
        assert_eq!(accepted.general_comments, "试产通过");
    }
}

#[test]
fn test_reentering_accepted_keeps_acceptance_date() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);
        let record = env.create_as(&engineer(), "再次接受");
        env.force_status(record.id, ChangeStatus::Submitted);

        let first = env
            .change_api
            .update_change(&supervisor(), record.id, ProcessChangePatch::new().with_status(ChangeStatus::Accepted))
            .unwrap();
        let first_date = first.acceptance_date.unwrap();

        env.advance(Duration::days(1));
        env.change_api
            .update_change(&admin(), record.id, ProcessChangePatch::new().with_status(ChangeStatus::Open))
            .unwrap();
        env.advance(Duration::days(1));
        let again = env
            .change_api
            .update_change(&admin(), record.id, ProcessChangePatch::new().with_status(ChangeStatus::Accepted))
            .unwrap();
        assert_eq!(again.acceptance_date, Some(first_date));

        // 显式覆盖
        let explicit = ts(2026, 2, 14, 0);
        let overridden = env
            .change_api
            .update_change(&admin(), record.id, ProcessChangePatch::new().with_acceptance_date(explicit))
            .unwrap();
        assert_eq!(overridden.acceptance_date, Some(explicit));
    }
}

#[test]
fn test_acceptance_date_rejected_before_acceptance() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);
        let record = env.create_as(&engineer(), "未接受");

        let result = env.change_api.update_change(
            &engineer(),
            record.id,
            ProcessChangePatch::new().with_acceptance_date(env.now()),
        );
        assert!(matches!(result, Err(ApiError::ValidationError(_))));
        assert_eq!(env.load(record.id).unwrap().acceptance_date, None);
    }
}

// ==========================================
// 访问策略
// ==========================================

#[test]
fn test_supervisor_extra_field_is_denied() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);
        let record = env.create_as(&engineer(), "主管越权");
        env.force_status(record.id, ChangeStatus::Submitted);

        let patch = ProcessChangePatch::new()
            .with_status(ChangeStatus::Accepted)
            .with_title("主管改了标题");
        let result = env.change_api.update_change(&supervisor(), record.id, patch);
        assert!(matches!(result, Err(ApiError::PermissionDenied(_))));

        // 整单拒绝，不落库
        let loaded = env.load(record.id).unwrap();
        assert_eq!(loaded.status, ChangeStatus::Submitted);
        assert_eq!(loaded.title, "主管越权");
    }
}

#[test]
fn test_non_owner_engineer_is_read_only() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);
        let record = env.create_as(&engineer(), "别人的变更");

        // 可读
        assert!(env.change_api.get_change(&other_engineer(), record.id).unwrap().is_some());

        let result = env.change_api.update_change(
            &other_engineer(),
            record.id,
            ProcessChangePatch::new().with_general_comments("路过"),
        );
        assert!(matches!(result, Err(ApiError::PermissionDenied(_))));

        let result = env.change_api.delete_change(&other_engineer(), record.id);
        assert!(matches!(result, Err(ApiError::PermissionDenied(_))));
        assert!(env.load(record.id).is_some());
    }
}

#[test]
fn test_owner_edits_fields_without_status_change() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);
        let record = env.create_as(&engineer(), "修改字段");
        env.advance(Duration::hours(1));

        let patch = ProcessChangePatch {
            process_area: Some(ProcessArea::Diffusion),
            target_date: Some(ts(2026, 4, 15, 0)),
            spec_updated: Some(true),
            ..Default::default()
        };
        let updated = env.change_api.update_change(&engineer(), record.id, patch).unwrap();

        assert_eq!(updated.status, ChangeStatus::Proposed);
        assert_eq!(updated.process_area, ProcessArea::Diffusion);
        assert_eq!(updated.target_date, ts(2026, 4, 15, 0));
        assert!(updated.spec_updated);
        assert_eq!(updated.change_owner, 1);
        assert_eq!(updated.updated_at, env.now());
    }
}

#[test]
fn test_empty_patch_and_blank_required_field() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);
        let record = env.create_as(&engineer(), "空请求");

        let result = env
            .change_api
            .update_change(&engineer(), record.id, ProcessChangePatch::new());
        assert!(matches!(result, Err(ApiError::ValidationError(_))));

        let result = env
            .change_api
            .update_change(&engineer(), record.id, ProcessChangePatch::new().with_title(" "));
        assert!(matches!(result, Err(ApiError::ValidationError(_))));
    }
}

#[test]
fn test_update_missing_record() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);
        let result = env.change_api.update_change(
            &admin(),
            404,
            ProcessChangePatch::new().with_general_comments("x"),
        );
        assert!(matches!(result, Err(ApiError::NotFound(_))));
        assert!(env.change_api.get_change(&admin(), 404).unwrap().is_none());
    }
}

// ==========================================
// 删除
// ==========================================

#[test]
fn test_delete_twice() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);
        let record = env.create_as(&engineer(), "删除");
        env.force_status(record.id, ChangeStatus::Accepted);

        assert!(env.change_api.delete_change(&engineer(), record.id).unwrap());
        assert!(!env.change_api.delete_change(&engineer(), record.id).unwrap());
        assert!(env.load(record.id).is_none());

        // id 不复用
        let next = env.create_as(&engineer(), "新记录");
        assert!(next.id > record.id);
    }
}

// ==========================================
// 附件
// ==========================================

#[test]
fn test_attachments_add_and_remove() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);
        let record = env.create_as(&engineer(), "附件");
        let a = format!("/uploads/change-{}/a.pdf", record.id);
        let b = format!("/uploads/change-{}/b.pdf", record.id);

        env.change_api.add_attachment(&engineer(), record.id, &a).unwrap();
        let with_both = env.change_api.add_attachment(&engineer(), record.id, &b).unwrap();
        assert_eq!(with_both.attachments, vec![a.clone(), b.clone()]);

        assert!(matches!(
            env.change_api.add_attachment(&engineer(), record.id, &a),
            Err(ApiError::ValidationError(_))
        ));
        assert!(matches!(
            env.change_api.add_attachment(&engineer(), record.id, "  "),
            Err(ApiError::ValidationError(_))
        ));

        let removed = env.change_api.remove_attachment(&engineer(), record.id, &a).unwrap();
        assert_eq!(removed.attachments, vec![b.clone()]);
        assert!(matches!(
            env.change_api.remove_attachment(&engineer(), record.id, &a),
            Err(ApiError::NotFound(_))
        ));

        // 主管不能改附件
        assert!(matches!(
            env.change_api.add_attachment(&supervisor(), record.id, "/uploads/x.pdf"),
            Err(ApiError::PermissionDenied(_))
        ));
    }
}

// ==========================================
// 列表
// ==========================================

#[test]
fn test_list_filters_and_order() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);
        let first = env
            .change_api
            .create_change(&engineer(), new_change("一", ProcessArea::Saw))
            .unwrap();
        env.advance(Duration::minutes(1));
        let second = env
            .change_api
            .create_change(&supervisor(), new_change("二", ProcessArea::Grind))
            .unwrap();
        env.advance(Duration::minutes(1));
        env.change_api
            .update_change(&engineer(), first.id, ProcessChangePatch::new().with_general_comments("更新"))
            .unwrap();

        let all = env.change_api.list_changes(&engineer(), &ProcessChangeFilter::all()).unwrap();
        let ids: Vec<i64> = all.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);

        let by_area = env
            .change_api
            .list_changes(&engineer(), &ProcessChangeFilter::all().by_area(ProcessArea::Grind))
            .unwrap();
        assert_eq!(by_area.len(), 1);
        assert_eq!(by_area[0].id, second.id);

        let by_owner = env
            .change_api
            .list_changes(&engineer(), &ProcessChangeFilter::all().by_owner(1))
            .unwrap();
        assert_eq!(by_owner.len(), 1);
        assert_eq!(by_owner[0].id, first.id);

        let none = env
            .change_api
            .list_changes(&engineer(), &ProcessChangeFilter::all().by_status(ChangeStatus::Rejected))
            .unwrap();
        assert!(none.is_empty());
    }
}

// ==========================================
// 事件: 通知 + 操作日志
// ==========================================

#[test]
fn test_notifications_on_create_and_status_change() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);
        let record = env.create_as(&engineer(), "Saw blade");

        env.change_api
            .update_change(&engineer(), record.id, ProcessChangePatch::new().with_general_comments("note"))
            .unwrap();
        env.change_api
            .update_change(&supervisor(), record.id, ProcessChangePatch::new().with_status(ChangeStatus::Open))
            .unwrap();

        let sent = env.outbox.sent();
        assert_eq!(sent.len(), 2, "{:?}", backend);

        assert_eq!(sent[0].recipient, Recipient::Role(UserRole::Supervisor));
        assert_eq!(sent[0].subject, format!("New Process Change #{}", record.id));
        assert!(sent[0].body.contains("Saw blade"));

        assert_eq!(sent[1].recipient, Recipient::User(1));
        assert!(sent[1].body.contains("PROPOSED"));
        assert!(sent[1].body.contains("OPEN"));
        assert!(sent[1].body.contains("Jane Supervisor(2)"));
    }
}

#[test]
fn test_rejected_mutation_sends_nothing() {
    for backend in ALL_BACKENDS {
        let env = ApiTestEnv::new(backend);
        let record = env.create_as(&engineer(), "拒绝");
        let before = env.outbox.sent().len();

        let _ = env.change_api.update_change(
            &engineer(),
            record.id,
            ProcessChangePatch::new().with_status(ChangeStatus::Accepted),
        );
        assert_eq!(env.outbox.sent().len(), before);
    }
}

#[test]
fn test_action_log_records_history() {
    let env = ApiTestEnv::new(Backend::Sqlite);
    let record = env.create_as(&engineer(), "审计");
    env.advance(Duration::minutes(1));
    env.change_api
        .update_change(&supervisor(), record.id, ProcessChangePatch::new().with_status(ChangeStatus::Open))
        .unwrap();
    env.advance(Duration::minutes(1));
    env.change_api.delete_change(&admin(), record.id).unwrap();

    let history = env.dashboard_api.change_history(record.id).unwrap();
    let kinds: Vec<&str> = history.iter().map(|h| h.action_type.as_str()).collect();
    assert_eq!(kinds, vec!["CREATE", "STATUS_CHANGE", "DELETE"]);
    assert_eq!(history[1].from_status.as_deref(), Some("PROPOSED"));
    assert_eq!(history[1].to_status.as_deref(), Some("OPEN"));
    assert_eq!(history[1].actor_id, 2);
    assert_eq!(history[2].actor_role, "ADMIN");
}
