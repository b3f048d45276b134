// ==========================================
// 地磅称重计费系统 - 外部采集端口
// ==========================================
// 职责: 定义称重仪表与抓拍摄像头的采集接口
// 说明: 硬件来源(串口仪表/模拟器)不在本层关心范围;
//       引擎只消费采集结果, 不直接触碰端口
// ==========================================

use crate::domain::types::CapturedImages;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;

/// 采集端口错误 (装箱透传)
pub type HardwareError = Box<dyn Error + Send + Sync>;

// ==========================================
// WeightReading - 称重读数
// ==========================================
// stable 为 false 时 weight_kg 无业务意义, 引擎拒绝取数
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeightReading {
    pub weight_kg: f64, // 当前读数 (kg)
    pub stable: bool,   // 是否稳定
}

// ==========================================
// WeightIndicator - 称重仪表端口
// ==========================================
#[async_trait]
pub trait WeightIndicator: Send + Sync {
    /// 读取当前称重读数
    async fn read(&self) -> Result<WeightReading, HardwareError>;
}

// ==========================================
// CameraPort - 抓拍摄像头端口
// ==========================================
// 抓拍失败不阻断过磅: 调用方降级为无图磅单
#[async_trait]
pub trait CameraPort: Send + Sync {
    /// 抓拍车头/车尾图像
    async fn capture(&self) -> Result<CapturedImages, HardwareError>;
}

// ==========================================
// SimulatedIndicator - 模拟仪表
// ==========================================
// 用途: 演示与测试环境, 返回固定读数
pub struct SimulatedIndicator {
    reading: WeightReading,
}

impl SimulatedIndicator {
    /// 创建返回固定读数的模拟仪表
    pub fn new(weight_kg: f64, stable: bool) -> Self {
        Self {
            reading: WeightReading { weight_kg, stable },
        }
    }
}

#[async_trait]
impl WeightIndicator for SimulatedIndicator {
    async fn read(&self) -> Result<WeightReading, HardwareError> {
        Ok(self.reading)
    }
}

// ==========================================
// NoCamera - 空摄像头
// ==========================================
// 用途: 未接摄像头的磅房, 始终返回无图
pub struct NoCamera;

#[async_trait]
impl CameraPort for NoCamera {
    async fn capture(&self) -> Result<CapturedImages, HardwareError> {
        Ok(CapturedImages::default())
    }
}
