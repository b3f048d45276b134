// ==========================================
// 地磅称重计费系统 - 磅单领域模型
// ==========================================
// Bill: 计费记录
// 生命周期: OPEN (两程首程) 或直接 CLOSED (一次性/存皮) → CLOSED → PRINTED
// 红线: net = gross - tare 必须按两侧重量重算, 不允许陈旧存值
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{BillStatus, WeightType};

// ==========================================
// Bill - 磅单
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub bill_id: String,                  // 磅单ID (不透明主键, uuid)
    pub bill_no: String,                  // 磅单号 (两程流程 = 票号, 否则独立流水号)
    pub ticket_no: String,                // 关联票号
    pub vehicle_no: String,               // 车牌号
    pub party_name: String,               // 客户名称
    pub product_name: String,             // 货物名称
    pub gross_weight_kg: Option<f64>,     // 毛重 (kg)
    pub tare_weight_kg: Option<f64>,      // 皮重 (kg)
    pub net_weight_kg: Option<f64>,       // 净重 (kg), 两侧齐全时 = gross - tare
    pub charges: f64,                     // 过磅费
    pub front_image: Option<String>,      // 车头抓拍
    pub rear_image: Option<String>,       // 车尾抓拍
    pub status: BillStatus,               // 状态 (OPEN/CLOSED/PRINTED)
    pub first_weight_type: WeightType,    // 首次称重类型 (GROSS/TARE/ONE_TIME)
    pub created_at: NaiveDateTime,        // 创建时间
    pub updated_at: NaiveDateTime,        // 更新时间
    pub closed_at: Option<NaiveDateTime>, // 结算时间
    pub printed_at: Option<NaiveDateTime>,// 打印时间
}

impl Bill {
    /// 按两侧重量计算净重
    ///
    /// 任意一侧缺失时为 None; 不钳制负值(第二次读数异常时原样呈现)
    pub fn computed_net_kg(&self) -> Option<f64> {
        match (self.gross_weight_kg, self.tare_weight_kg) {
            (Some(gross), Some(tare)) => Some(gross - tare),
            _ => None,
        }
    }

    /// 重算净重并写回 net_weight_kg
    pub fn recompute_net(&mut self) {
        self.net_weight_kg = self.computed_net_kg();
    }

    /// 是否仍在等待第二次过磅
    pub fn is_open(&self) -> bool {
        self.status == BillStatus::Open
    }

    /// 是否已结算(含已打印)
    pub fn is_settled(&self) -> bool {
        self.status >= BillStatus::Closed
    }
}
