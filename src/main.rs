// ==========================================
// 制造工艺变更跟踪系统 - 命令行入口
// ==========================================
// 启动流程: 初始化日志 → 按环境变量装配 AppState → 空库写入演示数据 → 输出看板汇总
// ==========================================

use anyhow::{anyhow, Context, Result};

use process_change_tracker::app::AppState;
use process_change_tracker::domain::ProcessChangeFilter;
use process_change_tracker::{logging, seed};

fn main() -> Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", process_change_tracker::APP_NAME);
    tracing::info!("系统版本: {}", process_change_tracker::VERSION);
    tracing::info!("==================================================");

    let state = AppState::from_env().map_err(|e| anyhow!(e))?;
    tracing::info!(backend = %state.backend, db_path = ?state.db_path, "AppState初始化成功");

    let store = state.process_change_api.store();
    let seeded = seed::seed_if_empty(store.as_ref()).context("写入演示数据失败")?;
    if seeded > 0 {
        tracing::info!("已写入{}条演示变更", seeded);
    }

    let viewer = seed::demo_actors()
        .into_iter()
        .last()
        .ok_or_else(|| anyhow!("缺少演示用户"))?;
    let summary = state
        .dashboard_api
        .summary(&viewer, &ProcessChangeFilter::all())
        .context("生成看板汇总失败")?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
