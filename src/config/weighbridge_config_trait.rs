// ==========================================
// 地磅称重计费系统 - 过磅配置读取 Trait
// ==========================================
// 职责: 定义引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

/// 配置读取错误 (装箱透传)
pub type ConfigError = Box<dyn Error + Send + Sync>;

// ==========================================
// WeighbridgeConfigReader Trait
// ==========================================
// 用途: 引擎所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait WeighbridgeConfigReader: Send + Sync {
    // ===== 流水号配置 =====

    /// 流水号前缀
    ///
    /// # 默认值
    /// - "TK"
    async fn get_serial_prefix(&self) -> Result<String, ConfigError>;

    /// 流水号补零宽度
    ///
    /// # 默认值
    /// - 3 (如 TK-2026-007)
    async fn get_serial_pad_width(&self) -> Result<usize, ConfigError>;

    /// 每年计数起始值
    ///
    /// # 默认值
    /// - 1
    async fn get_serial_counter_start(&self) -> Result<i64, ConfigError>;

    // ===== 存皮配置 =====

    /// 存皮有效期（天）
    ///
    /// 判定与展示共用同一阈值, 边界含当天整点 (now - stored_at <= 窗口)
    ///
    /// # 默认值
    /// - 30
    async fn get_tare_validity_days(&self) -> Result<i64, ConfigError>;

    // ===== 计费配置 =====

    /// 默认过磅费
    ///
    /// # 默认值
    /// - 0.0
    async fn get_default_charges(&self) -> Result<f64, ConfigError>;
}
