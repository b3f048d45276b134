// ==========================================
// 地磅称重计费系统 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 磅单状态 (Bill Status)
// ==========================================
// 状态单向流转: OPEN → CLOSED → PRINTED
// 顺序派生 Ord, 用于前向性校验
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillStatus {
    Open,    // 开放(等待第二次过磅)
    Closed,  // 已结算(重量齐全)
    Printed, // 已打印(票据已出)
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillStatus::Open => write!(f, "OPEN"),
            BillStatus::Closed => write!(f, "CLOSED"),
            BillStatus::Printed => write!(f, "PRINTED"),
        }
    }
}

impl BillStatus {
    /// 从数据库字符串解析状态
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "OPEN" => Some(BillStatus::Open),
            "CLOSED" => Some(BillStatus::Closed),
            "PRINTED" => Some(BillStatus::Printed),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            BillStatus::Open => "OPEN",
            BillStatus::Closed => "CLOSED",
            BillStatus::Printed => "PRINTED",
        }
    }

    /// 判断目标状态是否为合法的前向转换
    ///
    /// 不允许原地转换之外的回退或跳级 (OPEN → PRINTED 非法)
    pub fn can_advance_to(&self, next: BillStatus) -> bool {
        matches!(
            (self, next),
            (BillStatus::Open, BillStatus::Closed) | (BillStatus::Closed, BillStatus::Printed)
        )
    }
}

// ==========================================
// 首次称重类型 (Weight Type)
// ==========================================
// 两程流程记录先称的是毛重还是皮重;
// 一次性流程固定为 ONE_TIME (皮重记 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeightType {
    Gross,   // 先称毛重(重车先进)
    Tare,    // 先称皮重(空车先进)
    OneTime, // 一次性称重
}

impl fmt::Display for WeightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightType::Gross => write!(f, "GROSS"),
            WeightType::Tare => write!(f, "TARE"),
            WeightType::OneTime => write!(f, "ONE_TIME"),
        }
    }
}

impl WeightType {
    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GROSS" => Some(WeightType::Gross),
            "TARE" => Some(WeightType::Tare),
            "ONE_TIME" => Some(WeightType::OneTime),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            WeightType::Gross => "GROSS",
            WeightType::Tare => "TARE",
            WeightType::OneTime => "ONE_TIME",
        }
    }
}

// ==========================================
// 车辆状态 (Vehicle Status)
// ==========================================
// 进磅时车辆是重车还是空车, 决定票据先记哪一侧重量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Load,  // 重车(载货)
    Empty, // 空车
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleStatus::Load => write!(f, "LOAD"),
            VehicleStatus::Empty => write!(f, "EMPTY"),
        }
    }
}

impl VehicleStatus {
    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LOAD" => Some(VehicleStatus::Load),
            "EMPTY" => Some(VehicleStatus::Empty),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            VehicleStatus::Load => "LOAD",
            VehicleStatus::Empty => "EMPTY",
        }
    }

    /// 进磅车辆状态对应的首次称重类型
    ///
    /// 重车先称毛重, 空车先称皮重
    pub fn first_weight_type(&self) -> WeightType {
        match self {
            VehicleStatus::Load => WeightType::Gross,
            VehicleStatus::Empty => WeightType::Tare,
        }
    }
}

// ==========================================
// 抓拍图像 (Captured Images)
// ==========================================
// 前后摄像头抓拍的编码图像串, 抓拍失败时对应字段为 None
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapturedImages {
    pub front_image: Option<String>, // 车头图像(编码串)
    pub rear_image: Option<String>,  // 车尾图像(编码串)
}

impl CapturedImages {
    /// 两路均未抓到
    pub fn is_empty(&self) -> bool {
        self.front_image.is_none() && self.rear_image.is_none()
    }
}
