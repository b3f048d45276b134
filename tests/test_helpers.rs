// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、引擎装配、时间构造等功能
// ==========================================

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use tempfile::NamedTempFile;

use truckore::config::ConfigManager;
use truckore::domain::types::CapturedImages;
use truckore::engine::{SerialNumberGenerator, WeighmentEngine};
use truckore::hardware::{HardwareError, WeightIndicator, WeightReading};
use truckore::repository::{
    ActionLogRepository, BillRepository, SerialStateRepository, StoredTareRepository,
    TicketRepository, WeighmentUnitOfWork,
};

/// 测试上下文: 临时库 + 全套仓储 + 引擎
pub struct TestContext {
    // 临时数据库文件（需要保持存活）
    pub _temp_file: NamedTempFile,
    pub db_path: String,
    pub conn: Arc<Mutex<Connection>>,
    pub config: Arc<ConfigManager>,
    pub ticket_repo: Arc<TicketRepository>,
    pub bill_repo: Arc<BillRepository>,
    pub tare_repo: Arc<StoredTareRepository>,
    pub serial_repo: Arc<SerialStateRepository>,
    pub action_log_repo: Arc<ActionLogRepository>,
    pub engine: Arc<WeighmentEngine<ConfigManager>>,
}

/// 创建临时测试数据库并装配引擎
pub fn create_test_context() -> TestContext {
    let temp_file = NamedTempFile::new().expect("创建临时文件失败");
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = truckore::db::open_sqlite_connection(&db_path).expect("打开测试库失败");
    truckore::db::init_schema(&conn).expect("初始化schema失败");
    let conn = Arc::new(Mutex::new(conn));

    let config = Arc::new(ConfigManager::from_connection(conn.clone()).expect("创建配置失败"));
    let ticket_repo = Arc::new(TicketRepository::new(conn.clone()));
    let bill_repo = Arc::new(BillRepository::new(conn.clone()));
    let tare_repo = Arc::new(StoredTareRepository::new(conn.clone()));
    let serial_repo = Arc::new(SerialStateRepository::new(conn.clone()));
    let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));
    let uow = Arc::new(WeighmentUnitOfWork::new(conn.clone()));

    let serial = SerialNumberGenerator::new(serial_repo.clone());
    let engine = Arc::new(WeighmentEngine::new(
        config.clone(),
        ticket_repo.clone(),
        bill_repo.clone(),
        tare_repo.clone(),
        action_log_repo.clone(),
        serial,
        uow,
    ));

    TestContext {
        _temp_file: temp_file,
        db_path,
        conn,
        config,
        ticket_repo,
        bill_repo,
        tare_repo,
        serial_repo,
        action_log_repo,
        engine,
    }
}

/// 写入测试配置项 (global scope)
pub fn set_config(ctx: &TestContext, key: &str, value: &str) {
    ctx.config.set_config_value(key, value).expect("写入配置失败");
}

/// 稳定读数
pub fn stable(weight_kg: f64) -> WeightReading {
    WeightReading {
        weight_kg,
        stable: true,
    }
}

/// 未稳定读数
pub fn unstable(weight_kg: f64) -> WeightReading {
    WeightReading {
        weight_kg,
        stable: false,
    }
}

/// 无抓拍
pub fn no_images() -> CapturedImages {
    CapturedImages::default()
}

/// 构造时间戳
pub fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

// ==========================================
// ScriptedIndicator - 可改读数的测试仪表
// ==========================================
// 用途: API 层端到端测试 (同一端口先后给出不同读数)
pub struct ScriptedIndicator {
    reading: Mutex<WeightReading>,
}

impl ScriptedIndicator {
    pub fn new(weight_kg: f64) -> Self {
        Self {
            reading: Mutex::new(WeightReading {
                weight_kg,
                stable: true,
            }),
        }
    }

    /// 改写当前读数
    pub fn set(&self, weight_kg: f64, stable: bool) {
        *self.reading.lock().unwrap() = WeightReading { weight_kg, stable };
    }
}

#[async_trait]
impl WeightIndicator for ScriptedIndicator {
    async fn read(&self) -> Result<WeightReading, HardwareError> {
        Ok(*self.reading.lock().unwrap())
    }
}
