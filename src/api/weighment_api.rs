// ==========================================
// 地磅称重计费系统 - 过磅 API
// ==========================================
// 职责: 面向前端的过磅操作入口
//       1. 读取仪表读数、抓拍图像 (抓拍失败降级为无图)
//       2. 解析存皮子模式 (按数据可用性, 不靠显式标志)
//       3. 调用引擎执行并转换错误
// ==========================================

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tracing::warn;

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, WeighbridgeConfigReader};
use crate::domain::ticket::Ticket;
use crate::domain::types::{CapturedImages, VehicleStatus};
use crate::engine::weighment::{WeighmentCommand, WeighmentEngine, WeighmentOutcome};
use crate::hardware::{CameraPort, WeightIndicator, WeightReading};
use crate::repository::TicketRepository;

// ==========================================
// WeighmentApi - 过磅 API
// ==========================================
pub struct WeighmentApi {
    engine: Arc<WeighmentEngine<ConfigManager>>,
    config: Arc<ConfigManager>,
    ticket_repo: Arc<TicketRepository>,
    indicator: Arc<dyn WeightIndicator>,
    camera: Arc<dyn CameraPort>,
}

impl WeighmentApi {
    /// 创建新的 WeighmentApi 实例
    pub fn new(
        engine: Arc<WeighmentEngine<ConfigManager>>,
        config: Arc<ConfigManager>,
        ticket_repo: Arc<TicketRepository>,
        indicator: Arc<dyn WeightIndicator>,
        camera: Arc<dyn CameraPort>,
    ) -> Self {
        Self {
            engine,
            config,
            ticket_repo,
            indicator,
            camera,
        }
    }

    // ==========================================
    // 采集
    // ==========================================

    /// 读取仪表当前读数 (界面轮询用)
    pub async fn read_weight(&self) -> ApiResult<WeightReading> {
        self.indicator
            .read()
            .await
            .map_err(|e| ApiError::InternalError(format!("仪表读取失败: {}", e)))
    }

    /// 抓拍图像, 失败降级为无图 (不阻断过磅)
    async fn capture_images(&self) -> CapturedImages {
        match self.camera.capture().await {
            Ok(images) => images,
            Err(e) => {
                warn!("抓拍失败, 本单无图: {}", e);
                CapturedImages::default()
            }
        }
    }

    async fn resolve_charges(&self, charges: Option<f64>) -> ApiResult<f64> {
        match charges {
            Some(c) => Ok(c),
            None => self
                .config
                .get_default_charges()
                .await
                .map_err(|e| ApiError::ConfigError(e.to_string())),
        }
    }

    fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }

    // ==========================================
    // 过磅操作
    // ==========================================

    /// 两程首程开票
    pub async fn new_two_trip(
        &self,
        vehicle_no: String,
        party_name: String,
        product_name: String,
        vehicle_status: VehicleStatus,
        charges: Option<f64>,
        actor: &str,
    ) -> ApiResult<WeighmentOutcome> {
        let reading = self.read_weight().await?;
        let images = self.capture_images().await;
        let charges = self.resolve_charges(charges).await?;

        let outcome = self
            .engine
            .execute(
                WeighmentCommand::NewTwoTrip {
                    vehicle_no,
                    party_name,
                    product_name,
                    vehicle_status,
                    charges,
                },
                reading,
                images,
                actor,
                Self::now(),
            )
            .await?;
        Ok(outcome)
    }

    /// 一次性过磅结算
    pub async fn new_one_time(
        &self,
        vehicle_no: String,
        party_name: String,
        product_name: String,
        charges: Option<f64>,
        actor: &str,
    ) -> ApiResult<WeighmentOutcome> {
        let reading = self.read_weight().await?;
        let images = self.capture_images().await;
        let charges = self.resolve_charges(charges).await?;

        let outcome = self
            .engine
            .execute(
                WeighmentCommand::NewOneTime {
                    vehicle_no,
                    party_name,
                    product_name,
                    charges,
                },
                reading,
                images,
                actor,
                Self::now(),
            )
            .await?;
        Ok(outcome)
    }

    /// 两程第二程闭票
    pub async fn close_ticket(
        &self,
        ticket_id: String,
        charges_override: Option<f64>,
        actor: &str,
    ) -> ApiResult<WeighmentOutcome> {
        let reading = self.read_weight().await?;
        let images = self.capture_images().await;

        let outcome = self
            .engine
            .execute(
                WeighmentCommand::CloseTicket {
                    ticket_id,
                    charges_override,
                },
                reading,
                images,
                actor,
                Self::now(),
            )
            .await?;
        Ok(outcome)
    }

    /// 存皮流程 (子模式按数据可用性解析)
    ///
    /// - 操作员显式要求刷新, 或该车无有效存皮 → 存皮/刷新模式
    /// - 有有效存皮且客户/货物齐全 → 存皮出单模式
    /// - 有有效存皮但客户/货物缺失 → 视为再次称空车, 走刷新模式
    pub async fn stored_tare(
        &self,
        vehicle_no: String,
        party_name: Option<String>,
        product_name: Option<String>,
        charges: Option<f64>,
        refresh_requested: bool,
        actor: &str,
    ) -> ApiResult<WeighmentOutcome> {
        let reading = self.read_weight().await?;
        let now = Self::now();

        let has_valid = self.engine.has_valid_tare(&vehicle_no, now).await?;
        let billing_fields = match (party_name, product_name) {
            (Some(p), Some(g)) if !p.trim().is_empty() && !g.trim().is_empty() => Some((p, g)),
            _ => None,
        };

        let command = if refresh_requested || !has_valid || billing_fields.is_none() {
            WeighmentCommand::StoreTare { vehicle_no }
        } else {
            let (party_name, product_name) = billing_fields.unwrap();
            WeighmentCommand::StoredTareBill {
                vehicle_no,
                party_name,
                product_name,
                charges: self.resolve_charges(charges).await?,
            }
        };

        let images = match command {
            // 纯存皮不留图
            WeighmentCommand::StoreTare { .. } => CapturedImages::default(),
            _ => self.capture_images().await,
        };

        let outcome = self
            .engine
            .execute(command, reading, images, actor, now)
            .await?;
        Ok(outcome)
    }

    /// 标记磅单打印完成
    pub fn mark_printed(&self, bill_id: &str, actor: &str) -> ApiResult<crate::domain::bill::Bill> {
        Ok(self.engine.mark_printed(bill_id, actor, Self::now())?)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 列出开放票据 (等待第二程)
    pub fn list_open_tickets(&self) -> ApiResult<Vec<Ticket>> {
        Ok(self.ticket_repo.list()?)
    }

    /// 预览下一个流水号 (界面展示)
    pub async fn peek_serial(&self) -> ApiResult<String> {
        Ok(self.engine.peek_serial(Self::now()).await?)
    }
}
