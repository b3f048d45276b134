// ==========================================
// 地磅称重计费系统 - 操作日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// 红线: 所有状态变更写入必须记录
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{fmt_ts, parse_ts_col};
use rusqlite::{params, Connection, Row, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// ActionLogRepository - 操作日志仓储
// ==========================================
pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    /// 创建新的操作日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入操作日志
    ///
    /// # 返回
    /// - Ok(action_id): 成功插入,返回action_id
    /// - Err(...): 数据库错误
    pub fn insert(&self, log: &ActionLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        exec_insert_log(&conn, log)?;
        Ok(log.action_id.clone())
    }

    /// 查询最近的操作日志 (审计界面)
    pub fn list_recent(&self, limit: i64) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT action_id, action_type, action_ts, actor, vehicle_no, ref_no, \
                    payload_json, detail \
             FROM action_log ORDER BY action_ts DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], map_log_row)?;

        let mut logs = Vec::new();
        for row in rows {
            logs.push(row?);
        }
        Ok(logs)
    }
}

// ==========================================
// 事务内复用的底层操作 (供工作单元调用)
// ==========================================

pub(crate) fn insert_log_tx(tx: &Transaction<'_>, log: &ActionLog) -> rusqlite::Result<()> {
    exec_insert_log(tx, log)
}

fn exec_insert_log(conn: &Connection, log: &ActionLog) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO action_log (
            action_id, action_type, action_ts, actor,
            vehicle_no, ref_no, payload_json, detail
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            log.action_id,
            log.action_type,
            fmt_ts(&log.action_ts),
            log.actor,
            log.vehicle_no,
            log.ref_no,
            log.payload_json.as_ref().map(|v| v.to_string()),
            log.detail,
        ],
    )?;
    Ok(())
}

/// 行映射: action_log → ActionLog
fn map_log_row(row: &Row<'_>) -> rusqlite::Result<ActionLog> {
    let action_ts_str: String = row.get(2)?;
    let payload_str: Option<String> = row.get(6)?;

    Ok(ActionLog {
        action_id: row.get(0)?,
        action_type: row.get(1)?,
        action_ts: parse_ts_col(2, &action_ts_str)?,
        actor: row.get(3)?,
        vehicle_no: row.get(4)?,
        ref_no: row.get(5)?,
        payload_json: payload_str.and_then(|s| serde_json::from_str(&s).ok()),
        detail: row.get(7)?,
    })
}
