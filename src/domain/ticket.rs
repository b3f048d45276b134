// ==========================================
// 地磅称重计费系统 - 过磅票据领域模型
// ==========================================
// Ticket: 两程流程中尚未闭合的那一半过磅记录
// 红线: 票据只在对应磅单为 OPEN 时存在, 闭合后从台账移除且不再修改
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{VehicleStatus, WeightType};

// ==========================================
// Ticket - 过磅票据(未闭合)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: String,                // 票据ID (不透明主键, uuid)
    pub ticket_no: String,                // 票号 (操作员可见的流水号, 开放票据间唯一)
    pub vehicle_no: String,               // 车牌号
    pub party_name: String,               // 客户名称
    pub product_name: String,             // 货物名称
    pub vehicle_status: VehicleStatus,    // 进磅车辆状态 (LOAD/EMPTY)
    pub gross_weight_kg: Option<f64>,     // 毛重 (kg)
    pub tare_weight_kg: Option<f64>,      // 皮重 (kg)
    pub first_weight_type: WeightType,    // 首次称重类型 (GROSS/TARE)
    pub charges: f64,                     // 过磅费 (>= 0)
    pub front_image: Option<String>,      // 车头抓拍
    pub rear_image: Option<String>,       // 车尾抓拍
    pub created_at: NaiveDateTime,        // 创建时间
}

impl Ticket {
    /// 创建时刻已记录的那一侧重量
    ///
    /// 不变式: 创建时 gross/tare 恰有一侧非空
    pub fn recorded_weight_kg(&self) -> Option<f64> {
        match self.first_weight_type {
            WeightType::Gross => self.gross_weight_kg,
            WeightType::Tare => self.tare_weight_kg,
            // 一次性流程不产生票据
            WeightType::OneTime => None,
        }
    }

    /// 校验"恰有一侧重量"的创建不变式
    pub fn has_exactly_one_weight(&self) -> bool {
        self.gross_weight_kg.is_some() != self.tare_weight_kg.is_some()
    }
}
