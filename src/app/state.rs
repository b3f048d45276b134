// ==========================================
// 地磅称重计费系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::api::{BillApi, ConfigApi, TareApi, WeighmentApi};
use crate::config::ConfigManager;
use crate::engine::{SerialNumberGenerator, WeighmentEngine};
use crate::hardware::{CameraPort, NoCamera, SimulatedIndicator, WeightIndicator};
use crate::repository::{
    ActionLogRepository, BillRepository, SerialStateRepository, StoredTareRepository,
    TicketRepository, WeighmentUnitOfWork,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
/// 在Tauri应用中作为全局状态管理
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 过磅API
    pub weighment_api: Arc<WeighmentApi>,

    /// 磅单API
    pub bill_api: Arc<BillApi>,

    /// 存皮API
    pub tare_api: Arc<TareApi>,

    /// 配置API
    pub config_api: Arc<ConfigApi>,

    /// 操作日志仓储（用于审计追踪）
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例 (未接硬件: 模拟仪表 + 无摄像头)
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 默认仪表读数恒为"未稳定", 防止无硬件环境误出单;
    /// 接入真实仪表/摄像头请使用 with_ports
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::with_ports(
            db_path,
            Arc::new(SimulatedIndicator::new(0.0, false)),
            Arc::new(NoCamera),
        )
    }

    /// 创建AppState实例并注入采集端口
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享连接并初始化 schema
    /// 2. 初始化所有Repository
    /// 3. 初始化引擎与API实例
    pub fn with_ports(
        db_path: String,
        indicator: Arc<dyn WeightIndicator>,
        camera: Arc<dyn CameraPort>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let mut conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;

        // 建库 schema 由后端持有并执行（幂等）
        crate::db::init_schema(&conn).map_err(|e| format!("无法初始化schema: {}", e))?;

        match crate::db::read_schema_version(&conn) {
            Ok(Some(v)) if v != crate::db::CURRENT_SCHEMA_VERSION => {
                tracing::warn!(
                    "schema_version 与代码期望不一致: db={}, expected={}",
                    v,
                    crate::db::CURRENT_SCHEMA_VERSION
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("读取 schema_version 失败(将继续启动): {}", e),
        }

        crate::perf::install_sqlite_tracing(&mut conn);
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let ticket_repo = Arc::new(TicketRepository::new(conn.clone()));
        let bill_repo = Arc::new(BillRepository::new(conn.clone()));
        let tare_repo = Arc::new(StoredTareRepository::new(conn.clone()));
        let serial_repo = Arc::new(SerialStateRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));
        let uow = Arc::new(WeighmentUnitOfWork::new(conn.clone()));

        // ==========================================
        // 初始化配置与引擎
        // ==========================================
        let config = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let serial = SerialNumberGenerator::new(serial_repo);
        let engine = Arc::new(WeighmentEngine::new(
            config.clone(),
            ticket_repo.clone(),
            bill_repo.clone(),
            tare_repo.clone(),
            action_log_repo.clone(),
            serial,
            uow,
        ));

        // ==========================================
        // 初始化API层
        // ==========================================
        let weighment_api = Arc::new(WeighmentApi::new(
            engine.clone(),
            config.clone(),
            ticket_repo.clone(),
            indicator,
            camera,
        ));
        let bill_api = Arc::new(BillApi::new(bill_repo, ticket_repo));
        let tare_api = Arc::new(TareApi::new(engine, tare_repo));
        let config_api = Arc::new(ConfigApi::new(config, action_log_repo.clone()));

        tracing::info!("AppState初始化成功");

        Ok(Self {
            db_path,
            weighment_api,
            bill_api,
            tare_api,
            config_api,
            action_log_repo,
        })
    }
}

/// 获取默认数据库路径
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("TRUCKORE_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    // 使用用户数据目录; 先给一个默认回退值, 后续如果能拿到 data_dir 再覆盖
    let mut path = PathBuf::from("./truckore_data.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("truckore-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("truckore");
        }

        let _ = std::fs::create_dir_all(&path);
        path = path.join("truckore_data.db");
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    // 注意：AppState::new() 的测试需要真实的数据库文件
    // 这些测试应该在集成测试中进行
}
