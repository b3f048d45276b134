// ==========================================
// 地磅称重计费系统 - 操作日志领域模型
// ==========================================
// 红线: 所有状态变更写入必须记录
// 用途: 审计追踪(谁在什么时间做了哪一笔过磅操作)
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,               // 日志ID (uuid)
    pub action_type: String,             // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,        // 操作时间戳
    pub actor: String,                   // 操作员
    pub vehicle_no: Option<String>,      // 关联车牌
    pub ref_no: Option<String>,          // 关联票号/磅单号
    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)
    pub detail: Option<String>,          // 详细描述
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    NewTwoTrip,     // 两程首程开票
    NewOneTime,     // 一次性过磅结算
    CloseTicket,    // 两程第二程闭票
    StoreTare,      // 存皮/刷新皮重
    StoredTareBill, // 存皮出单
    MarkPrinted,    // 打印完成
    ConfigUpdate,   // 配置变更
}

impl ActionType {
    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ActionType::NewTwoTrip => "NEW_TWO_TRIP",
            ActionType::NewOneTime => "NEW_ONE_TIME",
            ActionType::CloseTicket => "CLOSE_TICKET",
            ActionType::StoreTare => "STORE_TARE",
            ActionType::StoredTareBill => "STORED_TARE_BILL",
            ActionType::MarkPrinted => "MARK_PRINTED",
            ActionType::ConfigUpdate => "CONFIG_UPDATE",
        }
    }
}
