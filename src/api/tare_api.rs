// ==========================================
// 地磅称重计费系统 - 存皮 API
// ==========================================
// 职责: 存皮记录与有效期信息查询
// ==========================================

use std::sync::Arc;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiResult;
use crate::config::ConfigManager;
use crate::domain::tare::{StoredTare, TareExpiryInfo};
use crate::engine::weighment::WeighmentEngine;
use crate::repository::StoredTareRepository;

// ==========================================
// TareInfoView - 存皮展示视图
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TareInfoView {
    pub tare: StoredTare,      // 存皮记录
    pub expiry: TareExpiryInfo, // 有效期信息 (阈值与出单判定一致)
}

// ==========================================
// TareApi - 存皮 API
// ==========================================
pub struct TareApi {
    engine: Arc<WeighmentEngine<ConfigManager>>,
    tare_repo: Arc<StoredTareRepository>,
}

impl TareApi {
    /// 创建新的 TareApi 实例
    pub fn new(
        engine: Arc<WeighmentEngine<ConfigManager>>,
        tare_repo: Arc<StoredTareRepository>,
    ) -> Self {
        Self { engine, tare_repo }
    }

    /// 查询车辆的存皮状态 (无记录返回 None, 调用方回退两程流程)
    pub async fn get_tare_info(&self, vehicle_no: &str) -> ApiResult<Option<TareInfoView>> {
        let now = Local::now().naive_local();
        let status = self.engine.stored_tare_status(vehicle_no, now).await?;
        Ok(status.map(|(tare, expiry)| TareInfoView { tare, expiry }))
    }

    /// 列出所有存皮记录
    pub fn list_tares(&self) -> ApiResult<Vec<StoredTare>> {
        Ok(self.tare_repo.list()?)
    }
}
