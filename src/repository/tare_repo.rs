// ==========================================
// 地磅称重计费系统 - 存皮仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// 约束: vehicle_no 唯一; 刷新时保留原始 stored_at 锚点
//       (有效期锚定首次存皮, 而非最近一次刷新)
// ==========================================

use crate::domain::tare::StoredTare;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{fmt_ts, parse_ts_col};
use rusqlite::{params, Connection, Row, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// StoredTareRepository - 存皮仓储
// ==========================================
pub struct StoredTareRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StoredTareRepository {
    /// 创建新的存皮仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按车牌查询存皮记录
    ///
    /// 无记录返回 None, 不视为错误 (调用方回退到两程流程)
    pub fn get_by_vehicle(&self, vehicle_no: &str) -> RepositoryResult<Option<StoredTare>> {
        let conn = self.get_conn()?;
        match conn.query_row(
            "SELECT vehicle_no, tare_weight_kg, stored_at, updated_at \
             FROM stored_tare WHERE vehicle_no = ?1",
            params![vehicle_no],
            map_tare_row,
        ) {
            Ok(tare) => Ok(Some(tare)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 列出所有存皮记录 (按刷新时间倒序)
    pub fn list(&self) -> RepositoryResult<Vec<StoredTare>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT vehicle_no, tare_weight_kg, stored_at, updated_at \
             FROM stored_tare ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map([], map_tare_row)?;

        let mut tares = Vec::new();
        for row in rows {
            tares.push(row?);
        }
        Ok(tares)
    }

    /// 按车牌 upsert 皮重
    ///
    /// 已有记录时保留其 stored_at (过期存皮可重新称重"续期",
    /// 但计费历史锚点不随刷新漂移), 仅刷新 tare_weight_kg / updated_at
    pub fn upsert(
        &self,
        vehicle_no: &str,
        tare_weight_kg: f64,
        now: chrono::NaiveDateTime,
    ) -> RepositoryResult<StoredTare> {
        {
            let conn = self.get_conn()?;
            exec_upsert_tare(&conn, vehicle_no, tare_weight_kg, now)?;
        }
        self.get_by_vehicle(vehicle_no)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "StoredTare".to_string(),
                id: vehicle_no.to_string(),
            })
    }
}

// ==========================================
// 事务内复用的底层操作 (供工作单元调用)
// ==========================================

pub(crate) fn upsert_tare_tx(
    tx: &Transaction<'_>,
    vehicle_no: &str,
    tare_weight_kg: f64,
    now: chrono::NaiveDateTime,
) -> rusqlite::Result<()> {
    exec_upsert_tare(tx, vehicle_no, tare_weight_kg, now)
}

fn exec_upsert_tare(
    conn: &Connection,
    vehicle_no: &str,
    tare_weight_kg: f64,
    now: chrono::NaiveDateTime,
) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO stored_tare (vehicle_no, tare_weight_kg, stored_at, updated_at)
        VALUES (?1, ?2, ?3, ?3)
        ON CONFLICT(vehicle_no) DO UPDATE SET
            tare_weight_kg = excluded.tare_weight_kg,
            updated_at = excluded.updated_at
        "#,
        params![vehicle_no, tare_weight_kg, fmt_ts(&now)],
    )?;
    Ok(())
}

/// 行映射: stored_tare → StoredTare
fn map_tare_row(row: &Row<'_>) -> rusqlite::Result<StoredTare> {
    let stored_at_str: String = row.get(2)?;
    let updated_at_str: String = row.get(3)?;

    Ok(StoredTare {
        vehicle_no: row.get(0)?,
        tare_weight_kg: row.get(1)?,
        stored_at: parse_ts_col(2, &stored_at_str)?,
        updated_at: parse_ts_col(3, &updated_at_str)?,
    })
}
