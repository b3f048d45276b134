// ==========================================
// 地磅称重计费系统 - 过磅工作单元
// ==========================================
// 职责: 把一次过磅操作涉及的多表写入收拢到单个事务
//       (票据 + 磅单 + 流水号计数 + 审计日志 同进退)
// 红线: 不允许部分落库; 任何一半失败整体回滚
// 说明: 流水号在此处随记录一起提交 —— 操作中止不消耗号段
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::domain::bill::Bill;
use crate::domain::tare::StoredTare;
use crate::domain::ticket::Ticket;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::serial_repo::SerialState;
use crate::repository::{action_log_repo, bill_repo, serial_repo, tare_repo, ticket_repo};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

// ==========================================
// WeighmentUnitOfWork - 过磅工作单元
// ==========================================
pub struct WeighmentUnitOfWork {
    conn: Arc<Mutex<Connection>>,
}

impl WeighmentUnitOfWork {
    /// 创建新的过磅工作单元
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 提交两程首程: 开放票据 + OPEN 磅单 + 流水号 + 日志
    pub fn commit_open_weighment(
        &self,
        ticket: &Ticket,
        bill: &Bill,
        serial: SerialState,
        log: &ActionLog,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        ticket_repo::insert_ticket_tx(&tx, ticket)?;
        bill_repo::insert_bill_tx(&tx, bill)?;
        serial_repo::write_state_tx(&tx, serial, log.action_ts)?;
        action_log_repo::insert_log_tx(&tx, log)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 提交直接闭合的磅单 (一次性过磅 / 存皮出单): CLOSED 磅单 + 流水号 + 日志
    pub fn commit_closed_bill(
        &self,
        bill: &Bill,
        serial: SerialState,
        log: &ActionLog,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        bill_repo::insert_bill_tx(&tx, bill)?;
        serial_repo::write_state_tx(&tx, serial, log.action_ts)?;
        action_log_repo::insert_log_tx(&tx, log)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 提交两程第二程: 条件删除票据 + 闭合 OPEN 磅单 + 日志
    ///
    /// 两程第二程不消耗新流水号 (磅单沿用票号)
    ///
    /// # 错误语义
    /// - NotFound(Ticket): 票据已不存在 (多半被并发闭合), 可恢复 —— 调用方
    ///   应刷新台账视图后重试
    /// - InconsistentCommit: 票据删成但对应 OPEN 磅单缺失, 属台账损坏;
    ///   事务已回滚, 以更高严重级别上报
    pub fn commit_close_ticket(
        &self,
        ticket_id: &str,
        closed_bill: &Bill,
        log: &ActionLog,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        // 先摘票据, 再闭磅单: 避免已结算行程在两本台账里同时出现
        let deleted = ticket_repo::delete_ticket_tx(&tx, ticket_id)?;
        if deleted == 0 {
            // 事务随 drop 回滚
            return Err(RepositoryError::NotFound {
                entity: "Ticket".to_string(),
                id: ticket_id.to_string(),
            });
        }

        let closed = bill_repo::close_open_bill_tx(&tx, closed_bill)?;
        if closed == 0 {
            return Err(RepositoryError::InconsistentCommit(format!(
                "票据已摘除但未找到对应的 OPEN 磅单: bill_no={}",
                closed_bill.bill_no
            )));
        }

        action_log_repo::insert_log_tx(&tx, log)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 提交存皮/刷新皮重: upsert 存皮 + 日志
    pub fn commit_store_tare(
        &self,
        vehicle_no: &str,
        tare_weight_kg: f64,
        log: &ActionLog,
    ) -> RepositoryResult<StoredTare> {
        {
            let mut conn = self.get_conn()?;
            let tx = conn.transaction()?;

            tare_repo::upsert_tare_tx(&tx, vehicle_no, tare_weight_kg, log.action_ts)?;
            action_log_repo::insert_log_tx(&tx, log)?;

            tx.commit()
                .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        }

        // 读回结果 (stored_at 可能保留自既有记录)
        let conn = self.get_conn()?;
        let tare = conn.query_row(
            "SELECT vehicle_no, tare_weight_kg, stored_at, updated_at \
             FROM stored_tare WHERE vehicle_no = ?1",
            rusqlite::params![vehicle_no],
            |row| {
                let stored_at_str: String = row.get(2)?;
                let updated_at_str: String = row.get(3)?;
                Ok(StoredTare {
                    vehicle_no: row.get(0)?,
                    tare_weight_kg: row.get(1)?,
                    stored_at: crate::repository::parse_ts_col(2, &stored_at_str)?,
                    updated_at: crate::repository::parse_ts_col(3, &updated_at_str)?,
                })
            },
        )?;
        Ok(tare)
    }
}
