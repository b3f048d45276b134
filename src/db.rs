// ==========================================
// 地磅称重计费系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少多窗口访问时的偶发 busy 错误
// - 建库 schema 由后端持有并执行 (前端只透传查询)
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 版本号用于提示/告警（不做自动迁移），避免静默在旧库上运行导致隐性错误
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等）
///
/// 表清单:
/// - weighment_ticket: 开放票据台账 (两程流程未闭合的那一半)
/// - weighment_bill:   磅单台账 (计费记录与状态)
/// - stored_tare:      按车牌缓存的空车皮重
/// - serial_state:     流水号计数器 (单行)
/// - config_scope/config_kv: 系统配置
/// - action_log:       操作审计日志
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS weighment_ticket (
            ticket_id TEXT PRIMARY KEY,
            ticket_no TEXT NOT NULL UNIQUE,
            vehicle_no TEXT NOT NULL,
            party_name TEXT NOT NULL,
            product_name TEXT NOT NULL,
            vehicle_status TEXT NOT NULL,
            gross_weight_kg REAL,
            tare_weight_kg REAL,
            first_weight_type TEXT NOT NULL,
            charges REAL NOT NULL DEFAULT 0,
            front_image TEXT,
            rear_image TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_ticket_vehicle
            ON weighment_ticket (vehicle_no);

        CREATE TABLE IF NOT EXISTS weighment_bill (
            bill_id TEXT PRIMARY KEY,
            bill_no TEXT NOT NULL,
            ticket_no TEXT NOT NULL,
            vehicle_no TEXT NOT NULL,
            party_name TEXT NOT NULL,
            product_name TEXT NOT NULL,
            gross_weight_kg REAL,
            tare_weight_kg REAL,
            net_weight_kg REAL,
            charges REAL NOT NULL DEFAULT 0,
            front_image TEXT,
            rear_image TEXT,
            status TEXT NOT NULL,
            first_weight_type TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            closed_at TEXT,
            printed_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_bill_vehicle
            ON weighment_bill (vehicle_no);
        CREATE INDEX IF NOT EXISTS idx_bill_status
            ON weighment_bill (status);
        CREATE INDEX IF NOT EXISTS idx_bill_created_at
            ON weighment_bill (created_at);

        CREATE TABLE IF NOT EXISTS stored_tare (
            vehicle_no TEXT PRIMARY KEY,
            tare_weight_kg REAL NOT NULL,
            stored_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS serial_state (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            year INTEGER NOT NULL,
            counter INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS action_log (
            action_id TEXT PRIMARY KEY,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            actor TEXT NOT NULL,
            vehicle_no TEXT,
            ref_no TEXT,
            payload_json TEXT,
            detail TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_action_log_ts
            ON action_log (action_ts);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
