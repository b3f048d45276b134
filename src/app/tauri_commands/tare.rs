use crate::app::state::AppState;

use super::common::map_api_error;

// ==========================================
// 存皮相关命令
// ==========================================

/// 查询车辆存皮状态 (记录 + 有效期)
#[tauri::command(rename_all = "snake_case")]
pub async fn get_tare_info(
    state: tauri::State<'_, AppState>,
    vehicle_no: String,
) -> Result<String, String> {
    let result = state
        .tare_api
        .get_tare_info(&vehicle_no)
        .await
        .map_err(map_api_error)?;
    serde_json::to_string(&result).map_err(|e| format!("序列化失败: {}", e))
}

/// 列出所有存皮记录
#[tauri::command(rename_all = "snake_case")]
pub async fn list_stored_tares(state: tauri::State<'_, AppState>) -> Result<String, String> {
    let tare_api = state.tare_api.clone();
    let result = tauri::async_runtime::spawn_blocking(move || {
        let _perf = crate::perf::PerfGuard::new("ipc.list_stored_tares");
        tare_api.list_tares()
    })
    .await
    .map_err(|e| format!("任务执行失败: {}", e))?
    .map_err(map_api_error)?;

    serde_json::to_string(&result).map_err(|e| format!("序列化失败: {}", e))
}
