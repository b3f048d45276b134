// ==========================================
// 地磅称重计费系统 - 过磅引擎
// ==========================================
// 职责: 把一次稳定读数 + 操作指令变成票据/磅单/存皮的状态变更
// 红线: 校验不过不触库; 多表写入走工作单元单事务;
//       引擎不静默重试, 失败原样上抛
// 红线: Engine 不拼 SQL, 数据访问全部经由仓储/工作单元
// ==========================================

use crate::config::weighbridge_config_trait::WeighbridgeConfigReader;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::bill::Bill;
use crate::domain::tare::{StoredTare, TareExpiryInfo};
use crate::domain::ticket::Ticket;
use crate::domain::types::{BillStatus, CapturedImages, VehicleStatus, WeightType};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::serial::{IssuedSerial, SerialConfig, SerialNumberGenerator};
use crate::engine::tare_policy;
use crate::hardware::WeightReading;
use crate::repository::{
    ActionLogRepository, BillRepository, RepositoryError, StoredTareRepository, TicketRepository,
    WeighmentUnitOfWork,
};
use chrono::NaiveDateTime;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

// ==========================================
// WeighmentCommand - 过磅指令
// ==========================================
// 每个 (操作类型 × 子模式) 组合一个构造子, 各自只携带所需字段
// (取代原实现里按需判空的一堆可选字段)
#[derive(Debug, Clone)]
pub enum WeighmentCommand {
    /// 两程首程: 开票 + OPEN 磅单
    NewTwoTrip {
        vehicle_no: String,
        party_name: String,
        product_name: String,
        vehicle_status: VehicleStatus,
        charges: f64,
    },

    /// 一次性过磅: 皮重记 0, 直接出 CLOSED 磅单
    NewOneTime {
        vehicle_no: String,
        party_name: String,
        product_name: String,
        charges: f64,
    },

    /// 两程第二程: 闭合指定票据
    CloseTicket {
        ticket_id: String,
        charges_override: Option<f64>,
    },

    /// 存皮/刷新皮重: 只更新存皮台账
    StoreTare { vehicle_no: String },

    /// 存皮出单: 以有效存皮为皮重直接出 CLOSED 磅单
    StoredTareBill {
        vehicle_no: String,
        party_name: String,
        product_name: String,
        charges: f64,
    },
}

impl WeighmentCommand {
    /// 指令对应的审计操作类型
    fn action_type(&self) -> ActionType {
        match self {
            WeighmentCommand::NewTwoTrip { .. } => ActionType::NewTwoTrip,
            WeighmentCommand::NewOneTime { .. } => ActionType::NewOneTime,
            WeighmentCommand::CloseTicket { .. } => ActionType::CloseTicket,
            WeighmentCommand::StoreTare { .. } => ActionType::StoreTare,
            WeighmentCommand::StoredTareBill { .. } => ActionType::StoredTareBill,
        }
    }
}

// ==========================================
// WeighmentOutcome - 过磅结果
// ==========================================
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeighmentOutcome {
    /// 两程首程: 票据已开, 磅单 OPEN (可先打临时联)
    TicketOpened { ticket: Ticket, bill: Bill },

    /// 磅单已闭合 (一次性 / 第二程 / 存皮出单)
    BillClosed { bill: Bill },

    /// 存皮已记录/刷新
    TareStored { tare: StoredTare },
}

// ==========================================
// WeighmentEngine - 过磅引擎
// ==========================================
pub struct WeighmentEngine<C>
where
    C: WeighbridgeConfigReader,
{
    config: Arc<C>,
    ticket_repo: Arc<TicketRepository>,
    bill_repo: Arc<BillRepository>,
    tare_repo: Arc<StoredTareRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    serial: SerialNumberGenerator,
    uow: Arc<WeighmentUnitOfWork>,
}

impl<C> WeighmentEngine<C>
where
    C: WeighbridgeConfigReader,
{
    /// 创建新的过磅引擎
    pub fn new(
        config: Arc<C>,
        ticket_repo: Arc<TicketRepository>,
        bill_repo: Arc<BillRepository>,
        tare_repo: Arc<StoredTareRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        serial: SerialNumberGenerator,
        uow: Arc<WeighmentUnitOfWork>,
    ) -> Self {
        Self {
            config,
            ticket_repo,
            bill_repo,
            tare_repo,
            action_log_repo,
            serial,
            uow,
        }
    }

    // ==========================================
    // 主入口
    // ==========================================

    /// 执行一次过磅操作
    ///
    /// # 参数
    /// - command: 过磅指令 (操作类型 × 子模式)
    /// - reading: 称重读数 (stable=false 一律拒绝)
    /// - images: 抓拍图像 (可为空, 不阻断)
    /// - actor: 操作员
    /// - now: 当前时刻 (显式注入, 便于测试)
    pub async fn execute(
        &self,
        command: WeighmentCommand,
        reading: WeightReading,
        images: CapturedImages,
        actor: &str,
        now: NaiveDateTime,
    ) -> EngineResult<WeighmentOutcome> {
        match command {
            WeighmentCommand::NewTwoTrip {
                vehicle_no,
                party_name,
                product_name,
                vehicle_status,
                charges,
            } => {
                self.new_two_trip(
                    &vehicle_no,
                    &party_name,
                    &product_name,
                    vehicle_status,
                    charges,
                    reading,
                    images,
                    actor,
                    now,
                )
                .await
            }
            WeighmentCommand::NewOneTime {
                vehicle_no,
                party_name,
                product_name,
                charges,
            } => {
                self.new_one_time(
                    &vehicle_no,
                    &party_name,
                    &product_name,
                    charges,
                    reading,
                    images,
                    actor,
                    now,
                )
                .await
            }
            WeighmentCommand::CloseTicket {
                ticket_id,
                charges_override,
            } => {
                self.close_ticket(&ticket_id, charges_override, reading, images, actor, now)
                    .await
            }
            WeighmentCommand::StoreTare { vehicle_no } => {
                self.store_tare(&vehicle_no, reading, actor, now).await
            }
            WeighmentCommand::StoredTareBill {
                vehicle_no,
                party_name,
                product_name,
                charges,
            } => {
                self.stored_tare_bill(
                    &vehicle_no,
                    &party_name,
                    &product_name,
                    charges,
                    reading,
                    images,
                    actor,
                    now,
                )
                .await
            }
        }
    }

    // ==========================================
    // 两程首程
    // ==========================================

    #[allow(clippy::too_many_arguments)]
    async fn new_two_trip(
        &self,
        vehicle_no: &str,
        party_name: &str,
        product_name: &str,
        vehicle_status: VehicleStatus,
        charges: f64,
        reading: WeightReading,
        images: CapturedImages,
        actor: &str,
        now: NaiveDateTime,
    ) -> EngineResult<WeighmentOutcome> {
        let vehicle_no = require_field("vehicle_no", vehicle_no)?;
        let party_name = require_field("party_name", party_name)?;
        let product_name = require_field("product_name", product_name)?;
        let charges = require_charges(charges)?;
        let live = require_stable(reading)?;

        let issued = self.issue_serial(now).await?;
        let first_weight_type = vehicle_status.first_weight_type();

        // 车辆状态决定先记哪一侧: 重车记毛重, 空车记皮重
        let (gross, tare) = match first_weight_type {
            WeightType::Gross => (Some(live), None),
            _ => (None, Some(live)),
        };

        let ticket = Ticket {
            ticket_id: Uuid::new_v4().to_string(),
            ticket_no: issued.serial_no.clone(),
            vehicle_no: vehicle_no.clone(),
            party_name: party_name.clone(),
            product_name: product_name.clone(),
            vehicle_status,
            gross_weight_kg: gross,
            tare_weight_kg: tare,
            first_weight_type,
            charges,
            front_image: images.front_image.clone(),
            rear_image: images.rear_image.clone(),
            created_at: now,
        };

        let mut bill = Bill {
            bill_id: Uuid::new_v4().to_string(),
            bill_no: issued.serial_no.clone(),
            ticket_no: issued.serial_no.clone(),
            vehicle_no: vehicle_no.clone(),
            party_name,
            product_name,
            gross_weight_kg: gross,
            tare_weight_kg: tare,
            net_weight_kg: None,
            charges,
            front_image: images.front_image,
            rear_image: images.rear_image,
            status: BillStatus::Open,
            first_weight_type,
            created_at: now,
            updated_at: now,
            closed_at: None,
            printed_at: None,
        };
        bill.recompute_net();

        let log = self.build_log(
            ActionType::NewTwoTrip,
            actor,
            Some(&vehicle_no),
            Some(&issued.serial_no),
            json!({
                "vehicle_status": vehicle_status.to_db_str(),
                "weight_kg": live,
                "charges": charges,
            }),
            now,
        );

        self.uow
            .commit_open_weighment(&ticket, &bill, issued.state, &log)?;

        info!(
            ticket_no = %ticket.ticket_no,
            vehicle_no = %ticket.vehicle_no,
            first_weight_type = %first_weight_type,
            weight_kg = live,
            "两程首程开票完成"
        );

        Ok(WeighmentOutcome::TicketOpened { ticket, bill })
    }

    // ==========================================
    // 一次性过磅
    // ==========================================

    #[allow(clippy::too_many_arguments)]
    async fn new_one_time(
        &self,
        vehicle_no: &str,
        party_name: &str,
        product_name: &str,
        charges: f64,
        reading: WeightReading,
        images: CapturedImages,
        actor: &str,
        now: NaiveDateTime,
    ) -> EngineResult<WeighmentOutcome> {
        let vehicle_no = require_field("vehicle_no", vehicle_no)?;
        let party_name = require_field("party_name", party_name)?;
        let product_name = require_field("product_name", product_name)?;
        let charges = require_charges(charges)?;
        let live = require_stable(reading)?;

        let issued = self.issue_serial(now).await?;

        // 无回程: 皮重固定记 0, 净重 = 读数
        let mut bill = Bill {
            bill_id: Uuid::new_v4().to_string(),
            bill_no: issued.serial_no.clone(),
            ticket_no: issued.serial_no.clone(),
            vehicle_no: vehicle_no.clone(),
            party_name,
            product_name,
            gross_weight_kg: Some(live),
            tare_weight_kg: Some(0.0),
            net_weight_kg: None,
            charges,
            front_image: images.front_image,
            rear_image: images.rear_image,
            status: BillStatus::Closed,
            first_weight_type: WeightType::OneTime,
            created_at: now,
            updated_at: now,
            closed_at: Some(now),
            printed_at: None,
        };
        bill.recompute_net();

        let log = self.build_log(
            ActionType::NewOneTime,
            actor,
            Some(&vehicle_no),
            Some(&issued.serial_no),
            json!({ "weight_kg": live, "charges": charges }),
            now,
        );

        self.uow.commit_closed_bill(&bill, issued.state, &log)?;

        info!(
            bill_no = %bill.bill_no,
            vehicle_no = %bill.vehicle_no,
            net_kg = live,
            "一次性过磅结算完成"
        );

        Ok(WeighmentOutcome::BillClosed { bill })
    }

    // ==========================================
    // 两程第二程
    // ==========================================

    async fn close_ticket(
        &self,
        ticket_id: &str,
        charges_override: Option<f64>,
        reading: WeightReading,
        images: CapturedImages,
        actor: &str,
        now: NaiveDateTime,
    ) -> EngineResult<WeighmentOutcome> {
        let live = require_stable(reading)?;

        let ticket = self
            .ticket_repo
            .get_by_id(ticket_id)?
            .ok_or_else(|| EngineError::TicketNotFound(ticket_id.to_string()))?;

        let charges = match charges_override {
            Some(c) => require_charges(c)?,
            None => ticket.charges,
        };

        // 首程记了哪一侧, 第二程补另一侧
        let (gross, tare) = match ticket.first_weight_type {
            WeightType::Gross => {
                let first = ticket.gross_weight_kg.ok_or_else(|| {
                    EngineError::InconsistentLedger(format!(
                        "票据首程毛重缺失: ticket_no={}",
                        ticket.ticket_no
                    ))
                })?;
                (first, live)
            }
            WeightType::Tare => {
                let first = ticket.tare_weight_kg.ok_or_else(|| {
                    EngineError::InconsistentLedger(format!(
                        "票据首程皮重缺失: ticket_no={}",
                        ticket.ticket_no
                    ))
                })?;
                (live, first)
            }
            WeightType::OneTime => {
                return Err(EngineError::InconsistentLedger(format!(
                    "票据携带非法首称类型: ticket_no={}",
                    ticket.ticket_no
                )))
            }
        };

        // 闭合负载: 磅单沿用票号, 不消耗新流水号;
        // 图像为空时保留首程抓拍 (条件更新 COALESCE 兜底)
        let mut closed_bill = Bill {
            bill_id: String::new(), // 由已存在的 OPEN 磅单持有
            bill_no: ticket.ticket_no.clone(),
            ticket_no: ticket.ticket_no.clone(),
            vehicle_no: ticket.vehicle_no.clone(),
            party_name: ticket.party_name.clone(),
            product_name: ticket.product_name.clone(),
            gross_weight_kg: Some(gross),
            tare_weight_kg: Some(tare),
            net_weight_kg: None,
            charges,
            front_image: images.front_image,
            rear_image: images.rear_image,
            status: BillStatus::Closed,
            first_weight_type: ticket.first_weight_type,
            created_at: ticket.created_at,
            updated_at: now,
            closed_at: Some(now),
            printed_at: None,
        };
        closed_bill.recompute_net();

        let log = self.build_log(
            ActionType::CloseTicket,
            actor,
            Some(&ticket.vehicle_no),
            Some(&ticket.ticket_no),
            json!({
                "ticket_id": ticket.ticket_id,
                "second_weight_kg": live,
                "net_kg": closed_bill.net_weight_kg,
            }),
            now,
        );

        self.uow
            .commit_close_ticket(&ticket.ticket_id, &closed_bill, &log)
            .map_err(|e| match e {
                RepositoryError::NotFound { .. } => {
                    // 读取与提交之间被并发闭合: 可恢复, 提示刷新台账
                    EngineError::TicketNotFound(format!(
                        "票据已被闭合: ticket_no={}",
                        ticket.ticket_no
                    ))
                }
                other => other.into(),
            })?;

        // 回读闭合后的磅单 (created_at/bill_id 以台账为准)
        let bill = self
            .bill_repo
            .find_by_bill_no(&ticket.ticket_no)?
            .ok_or_else(|| {
                EngineError::InconsistentLedger(format!(
                    "闭合提交后未读到磅单: bill_no={}",
                    ticket.ticket_no
                ))
            })?;

        info!(
            bill_no = %bill.bill_no,
            vehicle_no = %bill.vehicle_no,
            net_kg = ?bill.net_weight_kg,
            "两程第二程闭票完成"
        );

        Ok(WeighmentOutcome::BillClosed { bill })
    }

    // ==========================================
    // 存皮: 记录/刷新
    // ==========================================

    async fn store_tare(
        &self,
        vehicle_no: &str,
        reading: WeightReading,
        actor: &str,
        now: NaiveDateTime,
    ) -> EngineResult<WeighmentOutcome> {
        let vehicle_no = require_field("vehicle_no", vehicle_no)?;
        let live = require_stable(reading)?;

        let log = self.build_log(
            ActionType::StoreTare,
            actor,
            Some(&vehicle_no),
            None,
            json!({ "tare_weight_kg": live }),
            now,
        );

        let tare = self.uow.commit_store_tare(&vehicle_no, live, &log)?;

        info!(
            vehicle_no = %tare.vehicle_no,
            tare_kg = tare.tare_weight_kg,
            "存皮已记录"
        );

        Ok(WeighmentOutcome::TareStored { tare })
    }

    // ==========================================
    // 存皮出单
    // ==========================================

    #[allow(clippy::too_many_arguments)]
    async fn stored_tare_bill(
        &self,
        vehicle_no: &str,
        party_name: &str,
        product_name: &str,
        charges: f64,
        reading: WeightReading,
        images: CapturedImages,
        actor: &str,
        now: NaiveDateTime,
    ) -> EngineResult<WeighmentOutcome> {
        let vehicle_no = require_field("vehicle_no", vehicle_no)?;
        let party_name = require_field("party_name", party_name)?;
        let product_name = require_field("product_name", product_name)?;
        let charges = require_charges(charges)?;
        let live = require_stable(reading)?;

        let validity_days = self
            .config
            .get_tare_validity_days()
            .await
            .map_err(|e| EngineError::Config(e.to_string()))?;

        let tare = self
            .tare_repo
            .get_by_vehicle(&vehicle_no)?
            .filter(|t| tare_policy::is_within_window(t.stored_at, now, validity_days))
            .ok_or_else(|| EngineError::TareNotValid(vehicle_no.clone()))?;

        let issued = self.issue_serial(now).await?;

        let mut bill = Bill {
            bill_id: Uuid::new_v4().to_string(),
            bill_no: issued.serial_no.clone(),
            ticket_no: issued.serial_no.clone(),
            vehicle_no: vehicle_no.clone(),
            party_name,
            product_name,
            gross_weight_kg: Some(live),
            tare_weight_kg: Some(tare.tare_weight_kg),
            net_weight_kg: None,
            charges,
            front_image: images.front_image,
            rear_image: images.rear_image,
            status: BillStatus::Closed,
            first_weight_type: WeightType::Gross,
            created_at: now,
            updated_at: now,
            closed_at: Some(now),
            printed_at: None,
        };
        bill.recompute_net();

        let log = self.build_log(
            ActionType::StoredTareBill,
            actor,
            Some(&vehicle_no),
            Some(&issued.serial_no),
            json!({
                "gross_weight_kg": live,
                "stored_tare_kg": tare.tare_weight_kg,
                "net_kg": bill.net_weight_kg,
            }),
            now,
        );

        self.uow.commit_closed_bill(&bill, issued.state, &log)?;

        info!(
            bill_no = %bill.bill_no,
            vehicle_no = %bill.vehicle_no,
            net_kg = ?bill.net_weight_kg,
            "存皮出单完成"
        );

        Ok(WeighmentOutcome::BillClosed { bill })
    }

    // ==========================================
    // 打印完成标记
    // ==========================================

    /// 标记磅单打印完成 (CLOSED → PRINTED)
    ///
    /// 幂等: 已是 PRINTED 时原样返回, printed_at 不变;
    /// OPEN 磅单不允许直接跳到 PRINTED
    pub fn mark_printed(
        &self,
        bill_id: &str,
        actor: &str,
        now: NaiveDateTime,
    ) -> EngineResult<Bill> {
        let bill = self
            .bill_repo
            .get_by_id(bill_id)?
            .ok_or_else(|| EngineError::BillNotFound(bill_id.to_string()))?;

        match bill.status {
            BillStatus::Printed => return Ok(bill),
            BillStatus::Open => {
                return Err(EngineError::InvalidStateTransition {
                    from: bill.status.to_string(),
                    to: BillStatus::Printed.to_string(),
                })
            }
            BillStatus::Closed => {}
        }

        let rows = self.bill_repo.cas_mark_printed(bill_id, now)?;
        if rows == 0 {
            // CAS 落空: 重读判定是并发已打印(幂等成功)还是状态异常
            let current = self
                .bill_repo
                .get_by_id(bill_id)?
                .ok_or_else(|| EngineError::BillNotFound(bill_id.to_string()))?;
            if current.status == BillStatus::Printed {
                return Ok(current);
            }
            return Err(EngineError::InvalidStateTransition {
                from: current.status.to_string(),
                to: BillStatus::Printed.to_string(),
            });
        }

        let printed = self
            .bill_repo
            .get_by_id(bill_id)?
            .ok_or_else(|| EngineError::BillNotFound(bill_id.to_string()))?;

        let log = self.build_log(
            ActionType::MarkPrinted,
            actor,
            Some(&printed.vehicle_no),
            Some(&printed.bill_no),
            json!({ "bill_id": bill_id }),
            now,
        );
        // 打印标记本身是单语句提交; 日志写失败只告警, 不回退状态
        if let Err(e) = self.action_log_repo.insert(&log) {
            warn!("打印标记日志写入失败: {}", e);
        }

        Ok(printed)
    }

    // ==========================================
    // 查询辅助
    // ==========================================

    /// 预览下一个流水号 (界面展示用, 不消耗号段)
    pub async fn peek_serial(&self, now: NaiveDateTime) -> EngineResult<String> {
        let config = self.serial_config().await?;
        self.serial.peek(&config, now)
    }

    /// 查询车辆的存皮状态 (记录 + 有效期信息)
    ///
    /// 无存皮记录返回 None (调用方回退到两程流程)
    pub async fn stored_tare_status(
        &self,
        vehicle_no: &str,
        now: NaiveDateTime,
    ) -> EngineResult<Option<(StoredTare, TareExpiryInfo)>> {
        let validity_days = self
            .config
            .get_tare_validity_days()
            .await
            .map_err(|e| EngineError::Config(e.to_string()))?;

        let tare = match self.tare_repo.get_by_vehicle(vehicle_no)? {
            Some(t) => t,
            None => return Ok(None),
        };

        let info = tare_policy::expiry_info(&tare, now, validity_days);
        Ok(Some((tare, info)))
    }

    /// 车辆当前是否持有有效存皮
    pub async fn has_valid_tare(&self, vehicle_no: &str, now: NaiveDateTime) -> EngineResult<bool> {
        Ok(self
            .stored_tare_status(vehicle_no, now)
            .await?
            .map(|(_, info)| !info.is_expired)
            .unwrap_or(false))
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    async fn serial_config(&self) -> EngineResult<SerialConfig> {
        Ok(SerialConfig {
            prefix: self
                .config
                .get_serial_prefix()
                .await
                .map_err(|e| EngineError::Config(e.to_string()))?,
            pad_width: self
                .config
                .get_serial_pad_width()
                .await
                .map_err(|e| EngineError::Config(e.to_string()))?,
            counter_start: self
                .config
                .get_serial_counter_start()
                .await
                .map_err(|e| EngineError::Config(e.to_string()))?,
        })
    }

    async fn issue_serial(&self, now: NaiveDateTime) -> EngineResult<IssuedSerial> {
        let config = self.serial_config().await?;
        self.serial.issue(&config, now)
    }

    fn build_log(
        &self,
        action_type: ActionType,
        actor: &str,
        vehicle_no: Option<&str>,
        ref_no: Option<&str>,
        payload: serde_json::Value,
        now: NaiveDateTime,
    ) -> ActionLog {
        ActionLog {
            action_id: Uuid::new_v4().to_string(),
            action_type: action_type.to_db_str().to_string(),
            action_ts: now,
            actor: actor.to_string(),
            vehicle_no: vehicle_no.map(|s| s.to_string()),
            ref_no: ref_no.map(|s| s.to_string()),
            payload_json: Some(payload),
            detail: None,
        }
    }
}

// ==========================================
// 校验辅助 (不过不触库)
// ==========================================

fn require_field(name: &str, value: &str) -> EngineResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!("必填字段为空: {}", name)));
    }
    Ok(trimmed.to_string())
}

fn require_stable(reading: WeightReading) -> EngineResult<f64> {
    if !reading.stable {
        return Err(EngineError::UnstableWeight);
    }
    Ok(reading.weight_kg)
}

fn require_charges(charges: f64) -> EngineResult<f64> {
    if !charges.is_finite() || charges < 0.0 {
        return Err(EngineError::Validation(format!(
            "过磅费必须为非负数值: {}",
            charges
        )));
    }
    Ok(charges)
}
