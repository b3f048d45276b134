// ==========================================
// 地磅称重计费系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务不变式
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod bill;
pub mod tare;
pub mod ticket;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use bill::Bill;
pub use tare::{StoredTare, TareExpiryInfo};
pub use ticket::Ticket;
pub use types::{BillStatus, CapturedImages, VehicleStatus, WeightType};
