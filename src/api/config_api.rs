// ==========================================
// 地磅称重计费系统 - 配置 API
// ==========================================
// 职责: 系统设置读写 (流水号/存皮窗口/默认计费)
// 红线: 配置变更写入审计日志
// ==========================================

use std::sync::Arc;

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::config::{config_keys, ConfigManager, WeighbridgeConfigReader};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::repository::ActionLogRepository;

// ==========================================
// WeighbridgeSettings - 设置快照
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeighbridgeSettings {
    pub serial_prefix: String,    // 流水号前缀
    pub serial_pad_width: usize,  // 流水号补零宽度
    pub serial_counter_start: i64,// 每年计数起始值
    pub tare_validity_days: i64,  // 存皮有效期 (天)
    pub default_charges: f64,     // 默认过磅费
}

// ==========================================
// ConfigApi - 配置 API
// ==========================================
pub struct ConfigApi {
    config: Arc<ConfigManager>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl ConfigApi {
    /// 创建新的 ConfigApi 实例
    pub fn new(config: Arc<ConfigManager>, action_log_repo: Arc<ActionLogRepository>) -> Self {
        Self {
            config,
            action_log_repo,
        }
    }

    /// 读取当前设置快照
    pub async fn get_settings(&self) -> ApiResult<WeighbridgeSettings> {
        let (serial_prefix, serial_pad_width, serial_counter_start, tare_validity_days, default_charges) =
            futures::try_join!(
                self.config.get_serial_prefix(),
                self.config.get_serial_pad_width(),
                self.config.get_serial_counter_start(),
                self.config.get_tare_validity_days(),
                self.config.get_default_charges(),
            )
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        Ok(WeighbridgeSettings {
            serial_prefix,
            serial_pad_width,
            serial_counter_start,
            tare_validity_days,
            default_charges,
        })
    }

    /// 更新单项设置
    ///
    /// 只接受白名单内的配置键; 数值键做格式校验
    pub fn update_setting(&self, key: &str, value: &str, actor: &str) -> ApiResult<()> {
        let value = value.trim();
        match key {
            config_keys::SERIAL_PREFIX => {
                if value.is_empty() {
                    return Err(ApiError::InvalidInput("流水号前缀不能为空".to_string()));
                }
            }
            config_keys::SERIAL_PAD_WIDTH => {
                value
                    .parse::<usize>()
                    .map_err(|_| ApiError::InvalidInput("补零宽度必须为非负整数".to_string()))?;
            }
            config_keys::SERIAL_COUNTER_START => {
                let start = value
                    .parse::<i64>()
                    .map_err(|_| ApiError::InvalidInput("计数起始值必须为整数".to_string()))?;
                if start < 1 {
                    return Err(ApiError::InvalidInput("计数起始值必须 >= 1".to_string()));
                }
            }
            config_keys::TARE_VALIDITY_DAYS => {
                let days = value
                    .parse::<i64>()
                    .map_err(|_| ApiError::InvalidInput("存皮有效期必须为整数天".to_string()))?;
                if days < 1 {
                    return Err(ApiError::InvalidInput("存皮有效期必须 >= 1 天".to_string()));
                }
            }
            config_keys::DEFAULT_CHARGES => {
                let charges = value
                    .parse::<f64>()
                    .map_err(|_| ApiError::InvalidInput("默认过磅费必须为数值".to_string()))?;
                if !charges.is_finite() || charges < 0.0 {
                    return Err(ApiError::InvalidInput("默认过磅费必须为非负数值".to_string()));
                }
            }
            other => {
                return Err(ApiError::InvalidInput(format!("未知配置键: {}", other)));
            }
        }

        self.config
            .set_config_value(key, value)
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let log = ActionLog {
            action_id: Uuid::new_v4().to_string(),
            action_type: ActionType::ConfigUpdate.to_db_str().to_string(),
            action_ts: Local::now().naive_local(),
            actor: actor.to_string(),
            vehicle_no: None,
            ref_no: None,
            payload_json: Some(json!({ "key": key, "value": value })),
            detail: None,
        };
        self.action_log_repo.insert(&log)?;

        Ok(())
    }
}
