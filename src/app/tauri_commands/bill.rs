use crate::app::state::AppState;

use super::common::{map_api_error, parse_date, resolve_actor};

// ==========================================
// 磅单相关命令
// ==========================================

/// 分页列出磅单
#[tauri::command(rename_all = "snake_case")]
pub async fn list_bills(
    state: tauri::State<'_, AppState>,
    limit: i64,
    offset: i64,
) -> Result<String, String> {
    let bill_api = state.bill_api.clone();
    let result = tauri::async_runtime::spawn_blocking(move || {
        let _perf = crate::perf::PerfGuard::new("ipc.list_bills");
        bill_api.list_bills(limit, offset)
    })
    .await
    .map_err(|e| format!("任务执行失败: {}", e))?
    .map_err(map_api_error)?;

    serde_json::to_string(&result).map_err(|e| format!("序列化失败: {}", e))
}

/// 按磅单号/车牌/客户检索
#[tauri::command(rename_all = "snake_case")]
pub async fn search_bills(
    state: tauri::State<'_, AppState>,
    query: String,
) -> Result<String, String> {
    let bill_api = state.bill_api.clone();
    let result = tauri::async_runtime::spawn_blocking(move || {
        let _perf = crate::perf::PerfGuard::new("ipc.search_bills");
        bill_api.search_bills(&query)
    })
    .await
    .map_err(|e| format!("任务执行失败: {}", e))?
    .map_err(map_api_error)?;

    serde_json::to_string(&result).map_err(|e| format!("序列化失败: {}", e))
}

/// 查询磅单详情
#[tauri::command(rename_all = "snake_case")]
pub async fn get_bill(
    state: tauri::State<'_, AppState>,
    bill_id: String,
) -> Result<String, String> {
    let result = state.bill_api.get_bill(&bill_id).map_err(map_api_error)?;
    serde_json::to_string(&result).map_err(|e| format!("序列化失败: {}", e))
}

/// 当日驾驶舱汇总
#[tauri::command(rename_all = "snake_case")]
pub async fn get_daily_summary(state: tauri::State<'_, AppState>) -> Result<String, String> {
    let bill_api = state.bill_api.clone();
    let result = tauri::async_runtime::spawn_blocking(move || {
        let _perf = crate::perf::PerfGuard::new("ipc.get_daily_summary");
        bill_api.daily_summary()
    })
    .await
    .map_err(|e| format!("任务执行失败: {}", e))?
    .map_err(map_api_error)?;

    serde_json::to_string(&result).map_err(|e| format!("序列化失败: {}", e))
}

/// 标记磅单打印完成 (CLOSED → PRINTED, 幂等)
#[tauri::command(rename_all = "snake_case")]
pub async fn mark_bill_printed(
    state: tauri::State<'_, AppState>,
    bill_id: String,
    actor: Option<String>,
) -> Result<String, String> {
    let weighment_api = state.weighment_api.clone();
    let actor = resolve_actor(actor);
    let result = tauri::async_runtime::spawn_blocking(move || {
        let _perf = crate::perf::PerfGuard::new("ipc.mark_bill_printed");
        weighment_api.mark_printed(&bill_id, &actor)
    })
    .await
    .map_err(|e| format!("任务执行失败: {}", e))?
    .map_err(map_api_error)?;

    serde_json::to_string(&result).map_err(|e| format!("序列化失败: {}", e))
}

/// 导出日期范围内的磅单台账 CSV
#[tauri::command(rename_all = "snake_case")]
pub async fn export_bill_register(
    state: tauri::State<'_, AppState>,
    from_date: String,
    to_date: String,
    output_path: String,
) -> Result<String, String> {
    let from = parse_date(&from_date)?;
    let to = parse_date(&to_date)?;

    let bill_api = state.bill_api.clone();
    let count = tauri::async_runtime::spawn_blocking(move || {
        let _perf = crate::perf::PerfGuard::new("ipc.export_bill_register");
        bill_api.export_register(from, to, &output_path)
    })
    .await
    .map_err(|e| format!("任务执行失败: {}", e))?
    .map_err(map_api_error)?;

    serde_json::to_string(&serde_json::json!({
        "exported": count,
        "message": crate::i18n::t("export.done"),
    }))
    .map_err(|e| format!("序列化失败: {}", e))
}
