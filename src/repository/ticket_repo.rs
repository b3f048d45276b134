// ==========================================
// 地磅称重计费系统 - 开放票据台账
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// 约束: ticket_no 在开放票据间唯一 (UNIQUE 约束兜底,
//       冲突只可能源于流水号生成器被误用, 视为数据完整性错误)
// ==========================================

use crate::domain::ticket::Ticket;
use crate::domain::types::{VehicleStatus, WeightType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{fmt_ts, invalid_enum_col, parse_ts_col};
use rusqlite::{params, Connection, Row, Transaction};
use std::sync::{Arc, Mutex};

const TICKET_COLUMNS: &str = "ticket_id, ticket_no, vehicle_no, party_name, product_name, \
     vehicle_status, gross_weight_kg, tare_weight_kg, first_weight_type, \
     charges, front_image, rear_image, created_at";

// ==========================================
// TicketRepository - 开放票据台账
// ==========================================
pub struct TicketRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TicketRepository {
    /// 创建新的票据台账仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 列出所有开放票据 (按创建时间倒序)
    pub fn list(&self) -> RepositoryResult<Vec<Ticket>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM weighment_ticket ORDER BY created_at DESC",
            TICKET_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], map_ticket_row)?;

        let mut tickets = Vec::new();
        for row in rows {
            tickets.push(row?);
        }
        Ok(tickets)
    }

    /// 按票据ID查询
    pub fn get_by_id(&self, ticket_id: &str) -> RepositoryResult<Option<Ticket>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM weighment_ticket WHERE ticket_id = ?1",
            TICKET_COLUMNS
        );
        match conn.query_row(&sql, params![ticket_id], map_ticket_row) {
            Ok(ticket) => Ok(Some(ticket)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按票号查询 (操作员界面使用票号检索)
    pub fn find_by_ticket_no(&self, ticket_no: &str) -> RepositoryResult<Option<Ticket>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM weighment_ticket WHERE ticket_no = ?1",
            TICKET_COLUMNS
        );
        match conn.query_row(&sql, params![ticket_no], map_ticket_row) {
            Ok(ticket) => Ok(Some(ticket)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按车牌查询开放票据
    pub fn find_by_vehicle(&self, vehicle_no: &str) -> RepositoryResult<Vec<Ticket>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM weighment_ticket WHERE vehicle_no = ?1 ORDER BY created_at DESC",
            TICKET_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![vehicle_no], map_ticket_row)?;

        let mut tickets = Vec::new();
        for row in rows {
            tickets.push(row?);
        }
        Ok(tickets)
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入开放票据
    pub fn insert(&self, ticket: &Ticket) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        exec_insert_ticket(&conn, ticket)?;
        Ok(())
    }

    /// 按ID删除票据
    ///
    /// # 返回
    /// - Ok(true): 已删除
    /// - Ok(false): 票据不存在 (可能已被并发闭合)
    pub fn delete_by_id(&self, ticket_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM weighment_ticket WHERE ticket_id = ?1",
            params![ticket_id],
        )?;
        Ok(rows > 0)
    }
}

// ==========================================
// 事务内复用的底层操作 (供工作单元调用)
// ==========================================

pub(crate) fn insert_ticket_tx(tx: &Transaction<'_>, ticket: &Ticket) -> rusqlite::Result<()> {
    exec_insert_ticket(tx, ticket)
}

/// 条件删除: 仅当票据仍存在时删除, 返回删除行数
pub(crate) fn delete_ticket_tx(tx: &Transaction<'_>, ticket_id: &str) -> rusqlite::Result<usize> {
    tx.execute(
        "DELETE FROM weighment_ticket WHERE ticket_id = ?1",
        params![ticket_id],
    )
}

fn exec_insert_ticket(conn: &Connection, ticket: &Ticket) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO weighment_ticket (
            ticket_id, ticket_no, vehicle_no, party_name, product_name,
            vehicle_status, gross_weight_kg, tare_weight_kg, first_weight_type,
            charges, front_image, rear_image, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            ticket.ticket_id,
            ticket.ticket_no,
            ticket.vehicle_no,
            ticket.party_name,
            ticket.product_name,
            ticket.vehicle_status.to_db_str(),
            ticket.gross_weight_kg,
            ticket.tare_weight_kg,
            ticket.first_weight_type.to_db_str(),
            ticket.charges,
            ticket.front_image,
            ticket.rear_image,
            fmt_ts(&ticket.created_at),
        ],
    )?;
    Ok(())
}

/// 行映射: weighment_ticket → Ticket
fn map_ticket_row(row: &Row<'_>) -> rusqlite::Result<Ticket> {
    let vehicle_status_str: String = row.get(5)?;
    let first_weight_type_str: String = row.get(8)?;
    let created_at_str: String = row.get(12)?;

    Ok(Ticket {
        ticket_id: row.get(0)?,
        ticket_no: row.get(1)?,
        vehicle_no: row.get(2)?,
        party_name: row.get(3)?,
        product_name: row.get(4)?,
        vehicle_status: VehicleStatus::from_db_str(&vehicle_status_str)
            .ok_or_else(|| invalid_enum_col(5, &vehicle_status_str))?,
        gross_weight_kg: row.get(6)?,
        tare_weight_kg: row.get(7)?,
        first_weight_type: WeightType::from_db_str(&first_weight_type_str)
            .ok_or_else(|| invalid_enum_col(8, &first_weight_type_str))?,
        charges: row.get(9)?,
        front_image: row.get(10)?,
        rear_image: row.get(11)?,
        created_at: parse_ts_col(12, &created_at_str)?,
    })
}
