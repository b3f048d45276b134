// ==========================================
// 地磅称重计费系统 - 流水号生成器
// ==========================================
// 号型: PREFIX-YYYY-NNN (前缀与补零宽度可配置)
// 语义: peek(签出未提交) 与 commit(随操作事务落库) 分离 ——
//       操作中止不消耗号段; 跨年自动重置到配置起始值
// 容错: 持久化状态损坏/不可解析时按当年重置处理, 不让调用方失败
// ==========================================

use crate::engine::error::EngineResult;
use crate::repository::error::RepositoryError;
use crate::repository::serial_repo::{SerialState, SerialStateRepository};
use chrono::{Datelike, NaiveDateTime};
use std::sync::Arc;
use tracing::warn;

// ==========================================
// SerialConfig - 流水号配置
// ==========================================
#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub prefix: String,     // 前缀 (如 "TK")
    pub pad_width: usize,   // 补零宽度 (如 3 → 007)
    pub counter_start: i64, // 每年起始序号 (默认 1)
}

// ==========================================
// IssuedSerial - 已签出(未提交)的流水号
// ==========================================
// state 为提交后应落库的新计数器状态, 由工作单元随记录一并写入
#[derive(Debug, Clone)]
pub struct IssuedSerial {
    pub serial_no: String,
    pub state: SerialState,
}

// ==========================================
// SerialNumberGenerator - 流水号生成器
// ==========================================
pub struct SerialNumberGenerator {
    repo: Arc<SerialStateRepository>,
}

impl SerialNumberGenerator {
    /// 创建新的流水号生成器
    pub fn new(repo: Arc<SerialStateRepository>) -> Self {
        Self { repo }
    }

    /// 预览下一个将签发的流水号 (只读, 无副作用)
    pub fn peek(&self, config: &SerialConfig, now: NaiveDateTime) -> EngineResult<String> {
        let issued = self.issue(config, now)?;
        Ok(issued.serial_no)
    }

    /// 签出下一个流水号及提交后的计数器状态 (不落库)
    ///
    /// 调用方把 state 交给工作单元, 在消费流水号的同一事务内提交;
    /// 操作中止时丢弃即可, 号段不被烧掉
    pub fn issue(&self, config: &SerialConfig, now: NaiveDateTime) -> EngineResult<IssuedSerial> {
        let year = now.year();
        let state = self.effective_state(config, year)?;

        let next = state.counter + 1;
        let serial_no = format!(
            "{}-{}-{:0width$}",
            config.prefix,
            year,
            next,
            width = config.pad_width
        );

        Ok(IssuedSerial {
            serial_no,
            state: SerialState { year, counter: next },
        })
    }

    /// 读取生效的计数器状态
    ///
    /// - 无状态/跨年: 回到 counter_start - 1 (下一号即起始值)
    /// - 状态损坏(计数低于起始值、行不可解析): 告警后按当年重置
    /// - 连接/锁故障: 原样上抛 (这不是状态损坏)
    fn effective_state(&self, config: &SerialConfig, year: i32) -> EngineResult<SerialState> {
        let reset = SerialState {
            year,
            counter: config.counter_start - 1,
        };

        let loaded = match self.repo.load() {
            Ok(v) => v,
            Err(e @ RepositoryError::LockError(_))
            | Err(e @ RepositoryError::DatabaseConnectionError(_)) => return Err(e.into()),
            Err(e) => {
                warn!("流水号状态不可解析, 按当年重置处理: {}", e);
                return Ok(reset);
            }
        };

        match loaded {
            Some(state) if state.year == year => {
                if state.counter < config.counter_start - 1 {
                    warn!(
                        "流水号计数异常(低于起始值), 按当年重置处理: counter={}",
                        state.counter
                    );
                    Ok(reset)
                } else {
                    Ok(state)
                }
            }
            // 跨年或首次使用: 重置计数
            _ => Ok(reset),
        }
    }
}
