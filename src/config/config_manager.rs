// ==========================================
// 地磅称重计费系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 说明: 取代原实现的环境级可变全局状态 —— 配置以显式对象
//       注入引擎, 读写经由持久化端口
// ==========================================

use crate::config::weighbridge_config_trait::{ConfigError, WeighbridgeConfigReader};
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// 配置键全集
// ==========================================
pub mod config_keys {
    /// 流水号前缀
    pub const SERIAL_PREFIX: &str = "serial/prefix";
    /// 流水号补零宽度
    pub const SERIAL_PAD_WIDTH: &str = "serial/pad_width";
    /// 每年计数起始值
    pub const SERIAL_COUNTER_START: &str = "serial/counter_start";
    /// 存皮有效期（天）
    pub const TARE_VALIDITY_DAYS: &str = "tare/validity_days";
    /// 默认过磅费
    pub const DEFAULT_CHARGES: &str = "charges/default";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入配置值（scope_id='global'）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 审计日志附带当时生效的配置
    pub fn snapshot_json(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global'")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut map = serde_json::Map::new();
        for row in rows {
            let (key, value) = row?;
            map.insert(key, json!(value));
        }

        Ok(serde_json::Value::Object(map).to_string())
    }

    /// 解析数值配置, 解析失败时回落默认值并告警
    fn parse_or_default<T: std::str::FromStr>(&self, key: &str, raw: &str, default: T) -> T {
        match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!("配置值不可解析, 使用默认值: key={}, value={}", key, raw);
                default
            }
        }
    }
}

// ==========================================
// WeighbridgeConfigReader 实现
// ==========================================
#[async_trait]
impl WeighbridgeConfigReader for ConfigManager {
    async fn get_serial_prefix(&self) -> Result<String, ConfigError> {
        self.get_config_or_default(config_keys::SERIAL_PREFIX, "TK")
            .map_err(|e| -> ConfigError { e.to_string().into() })
    }

    async fn get_serial_pad_width(&self) -> Result<usize, ConfigError> {
        let raw = self
            .get_config_or_default(config_keys::SERIAL_PAD_WIDTH, "3")
            .map_err(|e| -> ConfigError { e.to_string().into() })?;
        Ok(self.parse_or_default(config_keys::SERIAL_PAD_WIDTH, &raw, 3))
    }

    async fn get_serial_counter_start(&self) -> Result<i64, ConfigError> {
        let raw = self
            .get_config_or_default(config_keys::SERIAL_COUNTER_START, "1")
            .map_err(|e| -> ConfigError { e.to_string().into() })?;
        Ok(self.parse_or_default(config_keys::SERIAL_COUNTER_START, &raw, 1))
    }

    async fn get_tare_validity_days(&self) -> Result<i64, ConfigError> {
        let raw = self
            .get_config_or_default(config_keys::TARE_VALIDITY_DAYS, "30")
            .map_err(|e| -> ConfigError { e.to_string().into() })?;
        Ok(self.parse_or_default(config_keys::TARE_VALIDITY_DAYS, &raw, 30))
    }

    async fn get_default_charges(&self) -> Result<f64, ConfigError> {
        let raw = self
            .get_config_or_default(config_keys::DEFAULT_CHARGES, "0")
            .map_err(|e| -> ConfigError { e.to_string().into() })?;
        Ok(self.parse_or_default(config_keys::DEFAULT_CHARGES, &raw, 0.0))
    }
}
