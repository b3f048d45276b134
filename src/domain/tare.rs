// ==========================================
// 地磅称重计费系统 - 存皮领域模型
// ==========================================
// StoredTare: 按车牌缓存的空车皮重, 有效期窗口内免去第二次过磅
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// StoredTare - 存皮记录
// ==========================================
// 约束: vehicle_no 唯一; 刷新皮重时保留原始 stored_at 锚点,
// 只更新 tare_weight_kg / updated_at
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTare {
    pub vehicle_no: String,        // 车牌号 (唯一键)
    pub tare_weight_kg: f64,       // 皮重 (kg)
    pub stored_at: NaiveDateTime,  // 首次存皮时间 (有效期锚点)
    pub updated_at: NaiveDateTime, // 最近刷新时间
}

// ==========================================
// TareExpiryInfo - 存皮有效期信息
// ==========================================
// 用途: 操作员界面展示; 判定阈值与 get_valid 完全一致
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TareExpiryInfo {
    pub is_expired: bool,          // 是否已过期
    pub days_remaining: i64,       // 剩余整天数 (过期后为 0)
    pub hours_remaining: i64,      // 剩余小时数 (不足一天的部分, 过期后为 0)
    pub expiry_date: NaiveDate,    // 到期日
}
