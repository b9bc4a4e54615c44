// ==========================================
// 制造工艺变更跟踪系统 - 演示数据
// ==========================================
// 用途: 演示库初始化 / 手工联调
// 内容: 3 个演示用户（工程师/主管/管理员）+ 3 条演示变更
// 说明: 演示变更的 ageOfChange 不写死，读取时按提案日计算
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};

use crate::api::upload_path;
use crate::domain::actor::Actor;
use crate::domain::process_change::{ProcessChange, ProcessChangeDraft, ProcessChangePatch};
use crate::domain::types::{ChangeStatus, ProcessArea, UserRole};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::ProcessChangeStore;

/// 演示变更（含入库后需补写的字段）
#[derive(Debug, Clone)]
pub struct DemoChange {
    pub draft: ProcessChangeDraft,
    pub acceptance_date: Option<NaiveDateTime>,
    pub updated_at: NaiveDateTime,
}

fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// 演示用户
pub fn demo_actors() -> Vec<Actor> {
    vec![
        Actor::new(1, UserRole::Engineer, "user_1").with_name("John Engineer"),
        Actor::new(2, UserRole::Supervisor, "user_2").with_name("Jane Supervisor"),
        Actor::new(3, UserRole::Admin, "user_3").with_name("Admin User"),
    ]
}

/// 演示变更（均由 1 号工程师创建）
pub fn demo_changes() -> Vec<DemoChange> {
    vec![
        DemoChange {
            draft: ProcessChangeDraft {
                status: ChangeStatus::Proposed,
                title: "Change ETCH chemical formula".to_string(),
                process_area: ProcessArea::Etch,
                change_owner: 1,
                proposal_date: day(2023, 11, 1),
                target_date: day(2023, 12, 15),
                age_of_change: 0,
                age_of_change_override: None,
                reason: "Current chemical formula is causing inconsistent etch rates across wafers."
                    .to_string(),
                change_overview: "Replace current Buffered Oxide Etch (BOE) with a new formulation \
                                  that has shown better uniformity in lab tests.\n\n\
                                  The new formula has a 7:1 ratio instead of the current 6:1 ratio."
                    .to_string(),
                general_comments: String::new(),
                attachments: vec![upload_path(1, "etch_test_results.pdf")],
                spec_updated: false,
                created_at: day(2023, 11, 1),
            },
            acceptance_date: None,
            updated_at: day(2023, 11, 1),
        },
        DemoChange {
            draft: ProcessChangeDraft {
                status: ChangeStatus::Open,
                title: "Update Diffusion temperature profile".to_string(),
                process_area: ProcessArea::Diffusion,
                change_owner: 1,
                proposal_date: day(2023, 10, 15),
                target_date: day(2023, 12, 1),
                age_of_change: 0,
                age_of_change_override: None,
                reason: "Current temperature profile is causing excessive dopant diffusion."
                    .to_string(),
                change_overview: "Modify the temperature ramp rate from 10°C/min to 5°C/min.\n\
                                  Reduce max temperature from 1050°C to 1025°C.\n\
                                  Extend soak time from 30 minutes to 35 minutes."
                    .to_string(),
                general_comments:
                    "Reviewed initial proposal. Please include simulation results for the new profile."
                        .to_string(),
                attachments: vec![],
                spec_updated: true,
                created_at: day(2023, 10, 15),
            },
            acceptance_date: None,
            updated_at: day(2023, 10, 25),
        },
        DemoChange {
            draft: ProcessChangeDraft {
                status: ChangeStatus::Accepted,
                title: "New saw blade for wafer dicing".to_string(),
                process_area: ProcessArea::Saw,
                change_owner: 1,
                proposal_date: day(2023, 9, 5),
                target_date: day(2023, 10, 1),
                age_of_change: 0,
                age_of_change_override: None,
                reason: "Current blades are causing excessive chipping on wafer edges.".to_string(),
                change_overview: "Replace the current 2.0mm diamond blade with a new 1.8mm \
                                  resin-bond blade from Vendor XYZ. Tests show 35% reduction in \
                                  edge chipping."
                    .to_string(),
                general_comments: "Approved after successful test runs. Please monitor closely \
                                   during initial implementation."
                    .to_string(),
                attachments: vec![
                    upload_path(3, "blade_test_report.pdf"),
                    upload_path(3, "vendor_specs.pdf"),
                ],
                spec_updated: true,
                created_at: day(2023, 9, 5),
            },
            acceptance_date: Some(day(2023, 9, 20)),
            updated_at: day(2023, 9, 20),
        },
    ]
}

/// 写入演示变更，返回入库后的记录
pub fn seed_store(store: &dyn ProcessChangeStore) -> RepositoryResult<Vec<ProcessChange>> {
    let mut seeded = Vec::new();

    for demo in demo_changes() {
        let created = store.create(demo.draft)?;

        let mut patch = ProcessChangePatch::new();
        patch.acceptance_date = demo.acceptance_date;
        let record = if patch.is_empty() && demo.updated_at == created.updated_at {
            created
        } else {
            store
                .update(created.id, &patch, demo.updated_at)?
                .ok_or_else(|| RepositoryError::NotFound {
                    entity: "ProcessChange".to_string(),
                    id: created.id.to_string(),
                })?
        };

        tracing::debug!(change_id = record.id, title = %record.title, "演示变更已写入");
        seeded.push(record);
    }

    Ok(seeded)
}

/// 仅当存储为空时写入演示数据，返回写入条数
pub fn seed_if_empty(store: &dyn ProcessChangeStore) -> RepositoryResult<usize> {
    if store.count()? > 0 {
        return Ok(0);
    }
    Ok(seed_store(store)?.len())
}
