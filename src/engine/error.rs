// ==========================================
// 地磅称重计费系统 - 引擎层错误类型
// ==========================================
// 错误分级:
// - 校验错误: 任何状态变更之前拒绝, 无副作用
// - 完整性错误: 界面状态已过期或数据损坏, 调用方应刷新台账后重试
// - 持久化错误: 操作视为未提交, 附带底层原因
// - 台账不一致: 多步提交半途失败(已回滚), 以更高严重级别上报
// 红线: 引擎绝不静默重试; 所有失败带原因上抛
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 校验错误 (无副作用) =====
    #[error("校验失败: {0}")]
    Validation(String),

    #[error("重量未稳定, 拒绝取数")]
    UnstableWeight,

    // ===== 完整性错误 (界面状态过期/数据损坏) =====
    #[error("票据不存在或已闭合: {0}")]
    TicketNotFound(String),

    #[error("磅单不存在: {0}")]
    BillNotFound(String),

    #[error("流水号冲突: {0}")]
    SerialCollision(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("存皮记录缺失或已过期: {0}")]
    TareNotValid(String),

    // ===== 持久化错误 (操作未提交) =====
    #[error("持久化失败: {0}")]
    Persistence(#[source] RepositoryError),

    // ===== 台账不一致 (已回滚, 更高严重级别) =====
    #[error("台账不一致(已回滚): {0}")]
    InconsistentLedger(String),

    // ===== 配置错误 =====
    #[error("配置读取失败: {0}")]
    Config(String),
}

impl EngineError {
    /// 是否属于"无副作用即被拒绝"的校验错误
    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::Validation(_) | EngineError::UnstableWeight)
    }

    /// 是否属于完整性错误 (调用方应刷新台账视图后重试)
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            EngineError::TicketNotFound(_)
                | EngineError::BillNotFound(_)
                | EngineError::SerialCollision(_)
                | EngineError::InvalidStateTransition { .. }
                | EngineError::TareNotValid(_)
        )
    }
}

// 仓储错误按语义归类: 不一致/唯一冲突单列, 其余视为持久化失败
impl From<RepositoryError> for EngineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::InconsistentCommit(msg) => EngineError::InconsistentLedger(msg),
            RepositoryError::UniqueConstraintViolation(msg) => EngineError::SerialCollision(msg),
            other => EngineError::Persistence(other),
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
