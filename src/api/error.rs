// ==========================================
// 地磅称重计费系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换引擎/仓储错误为用户友好的错误消息
// 约束: 所有错误信息必须包含显式原因 (可解释性)
// ==========================================

use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 校验错误 (无副作用)
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("重量未稳定, 请等待读数稳定后再取数")]
    UnstableWeight,

    // ==========================================
    // 完整性错误 (界面状态过期, 建议刷新后重试)
    // ==========================================
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("票据已被闭合: {0}")]
    TicketAlreadyClosed(String),

    #[error("流水号冲突: {0}")]
    SerialCollision(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("存皮记录缺失或已过期: {0}")]
    TareNotValid(String),

    // ==========================================
    // 数据访问错误 (操作未提交)
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ==========================================
    // 台账不一致 (已回滚, 更高严重级别)
    // ==========================================
    #[error("台账不一致(已回滚): {0}")]
    LedgerInconsistency(String),

    // ==========================================
    // 其他
    // ==========================================
    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("报表导出失败: {0}")]
    ExportError(String),

    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(msg) => ApiError::InvalidInput(msg),
            EngineError::UnstableWeight => ApiError::UnstableWeight,
            EngineError::TicketNotFound(msg) => ApiError::TicketAlreadyClosed(msg),
            EngineError::BillNotFound(msg) => ApiError::NotFound(format!("磅单: {}", msg)),
            EngineError::SerialCollision(msg) => ApiError::SerialCollision(msg),
            EngineError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            EngineError::TareNotValid(msg) => ApiError::TareNotValid(msg),
            EngineError::Persistence(e) => ApiError::DatabaseError(e.to_string()),
            EngineError::InconsistentLedger(msg) => ApiError::LedgerInconsistency(msg),
            EngineError::Config(msg) => ApiError::ConfigError(msg),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} (id={})", entity, id))
            }
            RepositoryError::InconsistentCommit(msg) => ApiError::LedgerInconsistency(msg),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
