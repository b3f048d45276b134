// ==========================================
// 地磅称重计费系统 - 数据仓储层
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod bill_repo;
pub mod error;
pub mod serial_repo;
pub mod tare_repo;
pub mod ticket_repo;
pub mod weighment_uow;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use bill_repo::{BillRepository, DailyBillSummary};
pub use error::{RepositoryError, RepositoryResult};
pub use serial_repo::{SerialState, SerialStateRepository};
pub use tare_repo::StoredTareRepository;
pub use ticket_repo::TicketRepository;
pub use weighment_uow::WeighmentUnitOfWork;

use chrono::NaiveDateTime;

/// 时间戳统一存储格式
pub(crate) const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 格式化时间戳为存储字符串
pub(crate) fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

/// 解析存储的时间戳列
pub(crate) fn parse_ts_col(idx: usize, s: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TS_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// 枚举列解析失败的统一错误
pub(crate) fn invalid_enum_col(idx: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("无法解析枚举值: {}", value).into(),
    )
}
