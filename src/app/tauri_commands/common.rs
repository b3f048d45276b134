use crate::api::error::ApiError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// 公共工具：错误映射、日期解析
// ==========================================

/// 错误响应（返回给前端）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 错误消息
    pub message: String,
}

/// 将ApiError转换为JSON字符串（Tauri要求）
pub(super) fn map_api_error(err: ApiError) -> String {
    let error_response = ErrorResponse {
        code: match &err {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::UnstableWeight => "UNSTABLE_WEIGHT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::TicketAlreadyClosed(_) => "TICKET_ALREADY_CLOSED",
            ApiError::SerialCollision(_) => "SERIAL_COLLISION",
            ApiError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            ApiError::TareNotValid(_) => "TARE_NOT_VALID",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::LedgerInconsistency(_) => "LEDGER_INCONSISTENCY",
            ApiError::ConfigError(_) => "CONFIG_ERROR",
            ApiError::ExportError(_) => "EXPORT_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::Other(_) => "OTHER_ERROR",
        }
        .to_string(),
        message: err.to_string(),
    };

    serde_json::to_string(&error_response).unwrap_or_else(|_| err.to_string())
}

/// 解析日期字符串
pub(super) fn parse_date(date_str: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|e| format!("日期格式错误（应为YYYY-MM-DD）: {}", e))
}

/// 操作员缺省值 (单操作员磅房)
pub(super) fn resolve_actor(actor: Option<String>) -> String {
    actor
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| "operator".to_string())
}
