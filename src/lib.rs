// ==========================================
// 地磅称重计费系统 - 核心库
// ==========================================
// 技术栈: Tauri + Rust + SQLite
// 系统定位: 磅房过磅票据/磅单生命周期引擎
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 外部采集端口 - 仪表/摄像头
pub mod hardware;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/schema 统一）
pub mod db;

// 日志系统
pub mod logging;

// 性能统计
pub mod perf;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 导出层 - 台账报表
pub mod export;

// 应用层 - Tauri 集成
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{BillStatus, CapturedImages, VehicleStatus, WeightType};

// 领域实体
pub use domain::{ActionLog, ActionType, Bill, StoredTare, TareExpiryInfo, Ticket};

// 引擎
pub use engine::{
    SerialConfig, SerialNumberGenerator, WeighmentCommand, WeighmentEngine, WeighmentOutcome,
};

// 采集端口
pub use hardware::{CameraPort, WeightIndicator, WeightReading};

// API
pub use api::{BillApi, ConfigApi, TareApi, WeighmentApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "地磅称重计费系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

// ==========================================
// 预编译检查
// ==========================================

// 确保编译时所有模块可见
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
