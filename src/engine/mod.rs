// ==========================================
// 地磅称重计费系统 - 引擎层
// ==========================================
// 职责: 实现过磅业务规则
// 红线: Engine 不拼 SQL; 校验不过不触库; 失败带原因上抛
// ==========================================

pub mod error;
pub mod serial;
pub mod tare_policy;
pub mod weighment;

// 重导出核心引擎
pub use error::{EngineError, EngineResult};
pub use serial::{IssuedSerial, SerialConfig, SerialNumberGenerator};
pub use weighment::{WeighmentCommand, WeighmentEngine, WeighmentOutcome};
