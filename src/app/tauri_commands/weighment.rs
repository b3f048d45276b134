use crate::app::state::AppState;
use crate::domain::types::VehicleStatus;

use super::common::{map_api_error, resolve_actor};

// ==========================================
// 过磅相关命令
// ==========================================

/// 读取仪表当前读数 (界面轮询)
#[tauri::command(rename_all = "snake_case")]
pub async fn get_weight_reading(state: tauri::State<'_, AppState>) -> Result<String, String> {
    let reading = state
        .weighment_api
        .read_weight()
        .await
        .map_err(map_api_error)?;
    serde_json::to_string(&reading).map_err(|e| format!("序列化失败: {}", e))
}

/// 预览下一个流水号
#[tauri::command(rename_all = "snake_case")]
pub async fn peek_serial_no(state: tauri::State<'_, AppState>) -> Result<String, String> {
    state
        .weighment_api
        .peek_serial()
        .await
        .map_err(map_api_error)
}

/// 两程首程开票
#[tauri::command(rename_all = "snake_case")]
pub async fn new_two_trip(
    state: tauri::State<'_, AppState>,
    vehicle_no: String,
    party_name: String,
    product_name: String,
    vehicle_status: String,
    charges: Option<f64>,
    actor: Option<String>,
) -> Result<String, String> {
    let vehicle_status = VehicleStatus::from_db_str(&vehicle_status)
        .ok_or_else(|| format!("无效的车辆状态: {}", vehicle_status))?;

    let outcome = state
        .weighment_api
        .new_two_trip(
            vehicle_no,
            party_name,
            product_name,
            vehicle_status,
            charges,
            &resolve_actor(actor),
        )
        .await
        .map_err(map_api_error)?;

    serde_json::to_string(&outcome).map_err(|e| format!("序列化失败: {}", e))
}

/// 一次性过磅结算
#[tauri::command(rename_all = "snake_case")]
pub async fn new_one_time(
    state: tauri::State<'_, AppState>,
    vehicle_no: String,
    party_name: String,
    product_name: String,
    charges: Option<f64>,
    actor: Option<String>,
) -> Result<String, String> {
    let outcome = state
        .weighment_api
        .new_one_time(
            vehicle_no,
            party_name,
            product_name,
            charges,
            &resolve_actor(actor),
        )
        .await
        .map_err(map_api_error)?;

    serde_json::to_string(&outcome).map_err(|e| format!("序列化失败: {}", e))
}

/// 两程第二程闭票
#[tauri::command(rename_all = "snake_case")]
pub async fn close_ticket(
    state: tauri::State<'_, AppState>,
    ticket_id: String,
    charges_override: Option<f64>,
    actor: Option<String>,
) -> Result<String, String> {
    let outcome = state
        .weighment_api
        .close_ticket(ticket_id, charges_override, &resolve_actor(actor))
        .await
        .map_err(map_api_error)?;

    serde_json::to_string(&outcome).map_err(|e| format!("序列化失败: {}", e))
}

/// 存皮流程 (子模式按数据可用性自动解析)
#[tauri::command(rename_all = "snake_case")]
pub async fn stored_tare(
    state: tauri::State<'_, AppState>,
    vehicle_no: String,
    party_name: Option<String>,
    product_name: Option<String>,
    charges: Option<f64>,
    refresh_requested: Option<bool>,
    actor: Option<String>,
) -> Result<String, String> {
    let outcome = state
        .weighment_api
        .stored_tare(
            vehicle_no,
            party_name,
            product_name,
            charges,
            refresh_requested.unwrap_or(false),
            &resolve_actor(actor),
        )
        .await
        .map_err(map_api_error)?;

    serde_json::to_string(&outcome).map_err(|e| format!("序列化失败: {}", e))
}

/// 列出开放票据 (等待第二程)
#[tauri::command(rename_all = "snake_case")]
pub async fn list_open_tickets(state: tauri::State<'_, AppState>) -> Result<String, String> {
    let weighment_api = state.weighment_api.clone();
    let result = tauri::async_runtime::spawn_blocking(move || {
        let _perf = crate::perf::PerfGuard::new("ipc.list_open_tickets");
        weighment_api.list_open_tickets()
    })
    .await
    .map_err(|e| format!("任务执行失败: {}", e))?
    .map_err(map_api_error)?;

    serde_json::to_string(&result).map_err(|e| format!("序列化失败: {}", e))
}
