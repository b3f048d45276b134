// ==========================================
// 地磅称重计费系统 - 流水号状态仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// 存储: serial_state 单行表 (id 恒为 1)
// 说明: 计数器的提交发生在消费流水号的同一事务内
//       (见 weighment_uow), 本仓储只提供读取与维护入口
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::fmt_ts;
use rusqlite::{params, Connection, Transaction};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

// ==========================================
// SerialState - 流水号计数器状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialState {
    pub year: i32,    // 计数所属年份 (跨年重置)
    pub counter: i64, // 已签发的最后一个序号
}

// ==========================================
// SerialStateRepository - 流水号状态仓储
// ==========================================
pub struct SerialStateRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SerialStateRepository {
    /// 创建新的流水号状态仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取持久化的计数器状态
    ///
    /// # 返回
    /// - Ok(Some(state)): 正常状态
    /// - Ok(None): 尚无状态 (首次使用)
    /// - Err(...): 状态行损坏/不可解析 (调用方按重置处理, 不得让操作失败)
    pub fn load(&self) -> RepositoryResult<Option<SerialState>> {
        let conn = self.get_conn()?;
        match conn.query_row(
            "SELECT year, counter FROM serial_state WHERE id = 1",
            [],
            |row| {
                Ok(SerialState {
                    year: row.get(0)?,
                    counter: row.get(1)?,
                })
            },
        ) {
            Ok(state) => Ok(Some(state)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 覆写计数器状态 (维护入口, 正常流转走事务内提交)
    pub fn save(&self, state: SerialState, now: chrono::NaiveDateTime) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        exec_write_state(&conn, state, now)?;
        Ok(())
    }
}

// ==========================================
// 事务内复用的底层操作 (供工作单元调用)
// ==========================================

pub(crate) fn write_state_tx(
    tx: &Transaction<'_>,
    state: SerialState,
    now: chrono::NaiveDateTime,
) -> rusqlite::Result<()> {
    exec_write_state(tx, state, now)
}

fn exec_write_state(
    conn: &Connection,
    state: SerialState,
    now: chrono::NaiveDateTime,
) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO serial_state (id, year, counter, updated_at)
        VALUES (1, ?1, ?2, ?3)
        ON CONFLICT(id) DO UPDATE SET
            year = excluded.year,
            counter = excluded.counter,
            updated_at = excluded.updated_at
        "#,
        params![state.year, state.counter, fmt_ts(&now)],
    )?;
    Ok(())
}
