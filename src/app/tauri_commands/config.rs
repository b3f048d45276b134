use crate::app::state::AppState;

use super::common::{map_api_error, resolve_actor};

// ==========================================
// 配置相关命令
// ==========================================

/// 读取系统设置快照
#[tauri::command(rename_all = "snake_case")]
pub async fn get_settings(state: tauri::State<'_, AppState>) -> Result<String, String> {
    let result = state
        .config_api
        .get_settings()
        .await
        .map_err(map_api_error)?;
    serde_json::to_string(&result).map_err(|e| format!("序列化失败: {}", e))
}

/// 更新单项设置
#[tauri::command(rename_all = "snake_case")]
pub async fn update_setting(
    state: tauri::State<'_, AppState>,
    key: String,
    value: String,
    actor: Option<String>,
) -> Result<String, String> {
    state
        .config_api
        .update_setting(&key, &value, &resolve_actor(actor))
        .map_err(map_api_error)?;

    Ok(crate::i18n::t("common.success"))
}
