// ==========================================
// 地磅称重计费系统 - API 层
// ==========================================
// 职责: 面向前端的业务接口, 校验输入、编排引擎、转换错误
// ==========================================

pub mod bill_api;
pub mod config_api;
pub mod error;
pub mod tare_api;
pub mod weighment_api;

// 重导出核心 API
pub use bill_api::{BillApi, DashboardSummary};
pub use config_api::{ConfigApi, WeighbridgeSettings};
pub use error::{ApiError, ApiResult};
pub use tare_api::{TareApi, TareInfoView};
pub use weighment_api::WeighmentApi;
