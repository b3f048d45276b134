// ==========================================
// 地磅称重计费系统 - 磅单台账
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// 约束: 状态只允许前向流转 (OPEN → CLOSED → PRINTED),
//       非前向转换在台账层防御性拒绝
// 约束: net_weight_kg 一律按 gross - tare 重算后落库, 不存陈旧值
// ==========================================

use crate::domain::bill::Bill;
use crate::domain::types::{BillStatus, WeightType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{fmt_ts, invalid_enum_col, parse_ts_col};
use rusqlite::{params, Connection, Row, Transaction};
use std::sync::{Arc, Mutex};

const BILL_COLUMNS: &str = "bill_id, bill_no, ticket_no, vehicle_no, party_name, product_name, \
     gross_weight_kg, tare_weight_kg, net_weight_kg, charges, front_image, rear_image, \
     status, first_weight_type, created_at, updated_at, closed_at, printed_at";

// ==========================================
// DailyBillSummary - 当日磅单汇总
// ==========================================
// 用途: 操作员首页驾驶舱
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DailyBillSummary {
    pub bill_count: i64,      // 已结算磅单数
    pub total_net_kg: f64,    // 净重合计 (kg)
    pub total_charges: f64,   // 过磅费合计
}

// ==========================================
// BillRepository - 磅单台账
// ==========================================
pub struct BillRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BillRepository {
    /// 创建新的磅单台账仓储
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

    /// 列出磅单 (按创建时间倒序, 分页)
    pub fn list(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<Bill>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM weighment_bill ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
            BILL_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit, offset], map_bill_row)?;

        let mut bills = Vec::new();
        for row in rows {
            bills.push(row?);
        }
        Ok(bills)
    }

    /// 按磅单号/车牌/客户名称模糊检索 (不区分大小写)
    pub fn search(&self, query: &str) -> RepositoryResult<Vec<Bill>> {
        let conn = self.get_conn()?;
        let pattern = format!("%{}%", query.trim().to_lowercase());
        let sql = format!(
            r#"SELECT {} FROM weighment_bill
               WHERE LOWER(bill_no) LIKE ?1
                  OR LOWER(vehicle_no) LIKE ?1
                  OR LOWER(party_name) LIKE ?1
               ORDER BY created_at DESC"#,
            BILL_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![pattern], map_bill_row)?;

        let mut bills = Vec::new();
        for row in rows {
            bills.push(row?);
        }
        Ok(bills)
    }

    /// 按磅单ID查询
    pub fn get_by_id(&self, bill_id: &str) -> RepositoryResult<Option<Bill>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM weighment_bill WHERE bill_id = ?1", BILL_COLUMNS);
        match conn.query_row(&sql, params![bill_id], map_bill_row) {
            Ok(bill) => Ok(Some(bill)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按磅单号查询 (同号多条时取最新一条)
    pub fn find_by_bill_no(&self, bill_no: &str) -> RepositoryResult<Option<Bill>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM weighment_bill WHERE bill_no = ?1 ORDER BY created_at DESC LIMIT 1",
            BILL_COLUMNS
        );
        match conn.query_row(&sql, params![bill_no], map_bill_row) {
            Ok(bill) => Ok(Some(bill)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按日期范围列出磅单 (报表导出用, 含当日)
    pub fn list_by_date_range(
        &self,
        from: chrono::NaiveDate,
        to: chrono::NaiveDate,
    ) -> RepositoryResult<Vec<Bill>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"SELECT {} FROM weighment_bill
               WHERE date(created_at) >= ?1 AND date(created_at) <= ?2
               ORDER BY created_at ASC"#,
            BILL_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![from.format("%Y-%m-%d").to_string(), to.format("%Y-%m-%d").to_string()],
            map_bill_row,
        )?;

        let mut bills = Vec::new();
        for row in rows {
            bills.push(row?);
        }
        Ok(bills)
    }

    /// 当日已结算磅单汇总 (驾驶舱)
    pub fn daily_summary(&self, date: chrono::NaiveDate) -> RepositoryResult<DailyBillSummary> {
        let conn = self.get_conn()?;
        let summary = conn.query_row(
            r#"SELECT COUNT(*),
                      COALESCE(SUM(net_weight_kg), 0),
                      COALESCE(SUM(charges), 0)
               FROM weighment_bill
               WHERE date(created_at) = ?1 AND status != 'OPEN'"#,
            params![date.format("%Y-%m-%d").to_string()],
            |row| {
                Ok(DailyBillSummary {
                    bill_count: row.get(0)?,
                    total_net_kg: row.get(1)?,
                    total_charges: row.get(2)?,
                })
            },
        )?;
        Ok(summary)
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入磅单
    pub fn insert(&self, bill: &Bill) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        exec_insert_bill(&conn, bill)?;
        Ok(())
    }

    /// 状态流转 (防御性: 只接受前向转换)
    ///
    /// # 返回
    /// - Ok(Bill): 转换后的磅单
    /// - Err(FieldValueError): 非前向转换被拒绝
    pub fn update_status(
        &self,
        bill_id: &str,
        next: BillStatus,
        now: chrono::NaiveDateTime,
    ) -> RepositoryResult<Bill> {
        let current = self.get_by_id(bill_id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "Bill".to_string(),
            id: bill_id.to_string(),
        })?;

        if !current.status.can_advance_to(next) {
            return Err(RepositoryError::FieldValueError {
                field: "status".to_string(),
                message: format!("非法状态转换: {} → {}", current.status, next),
            });
        }

        let conn = self.get_conn()?;
        // CAS: 仅当状态仍为读取到的值时更新, 避免读-改-写竞态
        let rows = conn.execute(
            r#"UPDATE weighment_bill
               SET status = ?1,
                   updated_at = ?2,
                   closed_at = CASE WHEN ?1 = 'CLOSED' THEN ?2 ELSE closed_at END,
                   printed_at = CASE WHEN ?1 = 'PRINTED' THEN ?2 ELSE printed_at END
               WHERE bill_id = ?3 AND status = ?4"#,
            params![next.to_db_str(), fmt_ts(&now), bill_id, current.status.to_db_str()],
        )?;
        drop(conn);

        if rows == 0 {
            return Err(RepositoryError::DatabaseTransactionError(format!(
                "磅单状态已被并发修改: bill_id={}",
                bill_id
            )));
        }

        self.get_by_id(bill_id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "Bill".to_string(),
            id: bill_id.to_string(),
        })
    }

    /// CAS 打印标记: 仅当状态为 CLOSED 时置为 PRINTED 并写 printed_at
    ///
    /// # 返回
    /// - Ok(rows): 受影响行数 (0 表示状态不是 CLOSED, 由调用方判定语义)
    pub fn cas_mark_printed(
        &self,
        bill_id: &str,
        now: chrono::NaiveDateTime,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"UPDATE weighment_bill
               SET status = 'PRINTED', printed_at = ?1, updated_at = ?1
               WHERE bill_id = ?2 AND status = 'CLOSED'"#,
            params![fmt_ts(&now), bill_id],
        )?;
        Ok(rows)
    }
}

// ==========================================
// 事务内复用的底层操作 (供工作单元调用)
// ==========================================

pub(crate) fn insert_bill_tx(tx: &Transaction<'_>, bill: &Bill) -> rusqlite::Result<()> {
    exec_insert_bill(tx, bill)
}

/// 闭合开放磅单: 填入第二侧重量并转 CLOSED, 返回受影响行数
///
/// 条件更新 (bill_no + status='OPEN'), 行数为 0 说明开放磅单不存在
pub(crate) fn close_open_bill_tx(tx: &Transaction<'_>, bill: &Bill) -> rusqlite::Result<usize> {
    tx.execute(
        r#"UPDATE weighment_bill
           SET gross_weight_kg = ?1,
               tare_weight_kg = ?2,
               net_weight_kg = ?3,
               charges = ?4,
               front_image = COALESCE(?5, front_image),
               rear_image = COALESCE(?6, rear_image),
               status = 'CLOSED',
               updated_at = ?7,
               closed_at = ?8
           WHERE bill_no = ?9 AND status = 'OPEN'"#,
        params![
            bill.gross_weight_kg,
            bill.tare_weight_kg,
            bill.computed_net_kg(),
            bill.charges,
            bill.front_image,
            bill.rear_image,
            fmt_ts(&bill.updated_at),
            bill.closed_at.map(|ts| fmt_ts(&ts)),
            bill.bill_no,
        ],
    )
}

fn exec_insert_bill(conn: &Connection, bill: &Bill) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO weighment_bill (
            bill_id, bill_no, ticket_no, vehicle_no, party_name, product_name,
            gross_weight_kg, tare_weight_kg, net_weight_kg, charges,
            front_image, rear_image, status, first_weight_type,
            created_at, updated_at, closed_at, printed_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            bill.bill_id,
            bill.bill_no,
            bill.ticket_no,
            bill.vehicle_no,
            bill.party_name,
            bill.product_name,
            bill.gross_weight_kg,
            bill.tare_weight_kg,
            // 落库前重算, 杜绝陈旧净重
            bill.computed_net_kg(),
            bill.charges,
            bill.front_image,
            bill.rear_image,
            bill.status.to_db_str(),
            bill.first_weight_type.to_db_str(),
            fmt_ts(&bill.created_at),
            fmt_ts(&bill.updated_at),
            bill.closed_at.map(|ts| fmt_ts(&ts)),
            bill.printed_at.map(|ts| fmt_ts(&ts)),
        ],
    )?;
    Ok(())
}

/// 行映射: weighment_bill → Bill
fn map_bill_row(row: &Row<'_>) -> rusqlite::Result<Bill> {
    let status_str: String = row.get(12)?;
    let first_weight_type_str: String = row.get(13)?;
    let created_at_str: String = row.get(14)?;
    let updated_at_str: String = row.get(15)?;
    let closed_at_str: Option<String> = row.get(16)?;
    let printed_at_str: Option<String> = row.get(17)?;

    Ok(Bill {
        bill_id: row.get(0)?,
        bill_no: row.get(1)?,
        ticket_no: row.get(2)?,
        vehicle_no: row.get(3)?,
        party_name: row.get(4)?,
        product_name: row.get(5)?,
        gross_weight_kg: row.get(6)?,
        tare_weight_kg: row.get(7)?,
        net_weight_kg: row.get(8)?,
        charges: row.get(9)?,
        front_image: row.get(10)?,
        rear_image: row.get(11)?,
        status: BillStatus::from_db_str(&status_str)
            .ok_or_else(|| invalid_enum_col(12, &status_str))?,
        first_weight_type: WeightType::from_db_str(&first_weight_type_str)
            .ok_or_else(|| invalid_enum_col(13, &first_weight_type_str))?,
        created_at: parse_ts_col(14, &created_at_str)?,
        updated_at: parse_ts_col(15, &updated_at_str)?,
        closed_at: closed_at_str.as_deref().map(|s| parse_ts_col(16, s)).transpose()?,
        printed_at: printed_at_str.as_deref().map(|s| parse_ts_col(17, s)).transpose()?,
    })
}
