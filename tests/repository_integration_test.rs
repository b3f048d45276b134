// ==========================================
// Repository 层集成测试
// ==========================================
// 测试目标: 台账 CRUD、唯一约束、状态前向性、存皮锚点、工作单元原子性
// ==========================================

mod test_helpers;

use test_helpers::*;
use truckore::domain::action_log::{ActionLog, ActionType};
use truckore::domain::bill::Bill;
use truckore::domain::ticket::Ticket;
use truckore::domain::types::{BillStatus, VehicleStatus, WeightType};
use truckore::repository::RepositoryError;
use uuid::Uuid;

fn sample_ticket(ticket_no: &str, vehicle_no: &str) -> Ticket {
    Ticket {
        ticket_id: Uuid::new_v4().to_string(),
        ticket_no: ticket_no.to_string(),
        vehicle_no: vehicle_no.to_string(),
        party_name: "ABC".to_string(),
        product_name: "Steel".to_string(),
        vehicle_status: VehicleStatus::Load,
        gross_weight_kg: Some(15000.0),
        tare_weight_kg: None,
        first_weight_type: WeightType::Gross,
        charges: 150.0,
        front_image: None,
        rear_image: None,
        created_at: ts(2026, 8, 6, 9, 0),
    }
}

fn sample_bill(bill_no: &str, vehicle_no: &str, party: &str, status: BillStatus) -> Bill {
    let created = ts(2026, 8, 6, 9, 0);
    Bill {
        bill_id: Uuid::new_v4().to_string(),
        bill_no: bill_no.to_string(),
        ticket_no: bill_no.to_string(),
        vehicle_no: vehicle_no.to_string(),
        party_name: party.to_string(),
        product_name: "Steel".to_string(),
        gross_weight_kg: Some(15000.0),
        tare_weight_kg: if status == BillStatus::Open { None } else { Some(5000.0) },
        net_weight_kg: None,
        charges: 150.0,
        front_image: None,
        rear_image: None,
        status,
        first_weight_type: WeightType::Gross,
        created_at: created,
        updated_at: created,
        closed_at: (status != BillStatus::Open).then_some(created),
        printed_at: None,
    }
}

// ==========================================
// 票据台账
// ==========================================

#[test]
fn test_ticket_crud_roundtrip() {
    let ctx = create_test_context();

    let ticket = sample_ticket("TK-2026-001", "KA01AB1234");
    ctx.ticket_repo.insert(&ticket).unwrap();

    let loaded = ctx.ticket_repo.get_by_id(&ticket.ticket_id).unwrap().unwrap();
    assert_eq!(loaded.ticket_no, "TK-2026-001");
    assert_eq!(loaded.gross_weight_kg, Some(15000.0));
    assert_eq!(loaded.tare_weight_kg, None);
    assert_eq!(loaded.first_weight_type, WeightType::Gross);
    assert_eq!(loaded.created_at, ticket.created_at);

    assert_eq!(ctx.ticket_repo.list().unwrap().len(), 1);
    assert!(ctx.ticket_repo.delete_by_id(&ticket.ticket_id).unwrap());
    assert!(ctx.ticket_repo.list().unwrap().is_empty());
    // 再删一次: 不存在, 返回 false 而非报错
    assert!(!ctx.ticket_repo.delete_by_id(&ticket.ticket_id).unwrap());
}

#[test]
fn test_duplicate_ticket_no_is_fatal_integrity_error() {
    let ctx = create_test_context();

    ctx.ticket_repo
        .insert(&sample_ticket("TK-2026-001", "KA01AB1234"))
        .unwrap();

    // 同票号第二张: 唯一约束拒绝, 不允许静默覆盖
    let err = ctx
        .ticket_repo
        .insert(&sample_ticket("TK-2026-001", "MH12CD5678"))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));

    // 原票据未被覆盖
    let tickets = ctx.ticket_repo.list().unwrap();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].vehicle_no, "KA01AB1234");
}

// ==========================================
// 磅单台账
// ==========================================

#[test]
fn test_bill_search_is_case_insensitive() {
    let ctx = create_test_context();

    ctx.bill_repo
        .insert(&sample_bill("TK-2026-001", "KA01AB1234", "Acme Steels", BillStatus::Closed))
        .unwrap();
    ctx.bill_repo
        .insert(&sample_bill("TK-2026-002", "MH12CD5678", "Bharat Cement", BillStatus::Closed))
        .unwrap();

    // 车牌小写检索
    let hits = ctx.bill_repo.search("ka01ab").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].bill_no, "TK-2026-001");

    // 客户名大小写混合
    let hits = ctx.bill_repo.search("aCmE").unwrap();
    assert_eq!(hits.len(), 1);

    // 磅单号
    let hits = ctx.bill_repo.search("tk-2026-002").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].vehicle_no, "MH12CD5678");

    // 未命中
    assert!(ctx.bill_repo.search("nothing").unwrap().is_empty());
}

#[test]
fn test_bill_status_forward_only_in_ledger() {
    let ctx = create_test_context();

    let open = sample_bill("TK-2026-001", "KA01AB1234", "ABC", BillStatus::Open);
    ctx.bill_repo.insert(&open).unwrap();

    // OPEN → PRINTED 跳级: 拒绝
    let err = ctx
        .bill_repo
        .update_status(&open.bill_id, BillStatus::Printed, ts(2026, 8, 6, 10, 0))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::FieldValueError { .. }));

    // OPEN → CLOSED: 允许, closed_at 落下
    let closed = ctx
        .bill_repo
        .update_status(&open.bill_id, BillStatus::Closed, ts(2026, 8, 6, 10, 0))
        .unwrap();
    assert_eq!(closed.status, BillStatus::Closed);
    assert!(closed.closed_at.is_some());

    // CLOSED → OPEN 回退: 拒绝
    let err = ctx
        .bill_repo
        .update_status(&open.bill_id, BillStatus::Open, ts(2026, 8, 6, 10, 5))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::FieldValueError { .. }));

    // CLOSED → PRINTED: 允许
    let printed = ctx
        .bill_repo
        .update_status(&open.bill_id, BillStatus::Printed, ts(2026, 8, 6, 10, 10))
        .unwrap();
    assert_eq!(printed.status, BillStatus::Printed);
    assert!(printed.printed_at.is_some());
}

#[test]
fn test_insert_recomputes_stale_net() {
    let ctx = create_test_context();

    // 携带陈旧净重入库: 落库值必须按 gross - tare 重算
    let mut bill = sample_bill("TK-2026-009", "KA01AB1234", "ABC", BillStatus::Closed);
    bill.net_weight_kg = Some(999.0);
    ctx.bill_repo.insert(&bill).unwrap();

    let loaded = ctx.bill_repo.get_by_id(&bill.bill_id).unwrap().unwrap();
    assert_eq!(loaded.net_weight_kg, Some(10000.0));
}

#[test]
fn test_daily_summary_excludes_open_bills() {
    let ctx = create_test_context();

    ctx.bill_repo
        .insert(&sample_bill("TK-2026-001", "KA01AB1234", "ABC", BillStatus::Closed))
        .unwrap();
    ctx.bill_repo
        .insert(&sample_bill("TK-2026-002", "MH12CD5678", "XYZ", BillStatus::Closed))
        .unwrap();
    ctx.bill_repo
        .insert(&sample_bill("TK-2026-003", "TN09GH3456", "PQR", BillStatus::Open))
        .unwrap();

    let summary = ctx
        .bill_repo
        .daily_summary(chrono::NaiveDate::from_ymd_opt(2026, 8, 6).unwrap())
        .unwrap();
    assert_eq!(summary.bill_count, 2);
    assert_eq!(summary.total_net_kg, 20000.0);
    assert_eq!(summary.total_charges, 300.0);
}

// ==========================================
// 存皮台账
// ==========================================

#[test]
fn test_tare_upsert_preserves_original_anchor() {
    let ctx = create_test_context();

    let first = ctx
        .tare_repo
        .upsert("GJ01XY9012", 5000.0, ts(2026, 8, 1, 9, 0))
        .unwrap();
    assert_eq!(first.stored_at, ts(2026, 8, 1, 9, 0));

    // 刷新皮重: stored_at 锚点保留, 重量与 updated_at 刷新
    let refreshed = ctx
        .tare_repo
        .upsert("GJ01XY9012", 5150.0, ts(2026, 8, 5, 14, 0))
        .unwrap();
    assert_eq!(refreshed.tare_weight_kg, 5150.0);
    assert_eq!(refreshed.stored_at, ts(2026, 8, 1, 9, 0));
    assert_eq!(refreshed.updated_at, ts(2026, 8, 5, 14, 0));

    // 不存在的车牌: None 不是错误
    assert!(ctx.tare_repo.get_by_vehicle("NO-SUCH").unwrap().is_none());
}

// ==========================================
// 工作单元原子性
// ==========================================

fn audit_log(action_type: ActionType, when: chrono::NaiveDateTime) -> ActionLog {
    ActionLog {
        action_id: Uuid::new_v4().to_string(),
        action_type: action_type.to_db_str().to_string(),
        action_ts: when,
        actor: "tester".to_string(),
        vehicle_no: None,
        ref_no: None,
        payload_json: None,
        detail: None,
    }
}

#[test]
fn test_uow_conditional_close_reports_missing_ticket() {
    let ctx = create_test_context();
    let uow = truckore::repository::WeighmentUnitOfWork::new(ctx.conn.clone());

    let closed_bill = sample_bill("TK-2026-001", "KA01AB1234", "ABC", BillStatus::Closed);
    let err = uow
        .commit_close_ticket("ghost-ticket", &closed_bill, &audit_log(ActionType::CloseTicket, ts(2026, 8, 6, 10, 0)))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[test]
fn test_uow_rolls_back_when_open_bill_missing() {
    let ctx = create_test_context();
    let uow = truckore::repository::WeighmentUnitOfWork::new(ctx.conn.clone());

    // 票据在场, 但没有对应的 OPEN 磅单 (人为制造台账损坏)
    let ticket = sample_ticket("TK-2026-001", "KA01AB1234");
    ctx.ticket_repo.insert(&ticket).unwrap();

    let closed_bill = sample_bill("TK-2026-001", "KA01AB1234", "ABC", BillStatus::Closed);
    let err = uow
        .commit_close_ticket(
            &ticket.ticket_id,
            &closed_bill,
            &audit_log(ActionType::CloseTicket, ts(2026, 8, 6, 10, 0)),
        )
        .unwrap_err();
    assert!(matches!(err, RepositoryError::InconsistentCommit(_)));

    // 整体回滚: 票据仍在台账里, 没有"半闭合"状态
    assert!(ctx
        .ticket_repo
        .get_by_id(&ticket.ticket_id)
        .unwrap()
        .is_some());
}

#[test]
fn test_uow_open_weighment_writes_all_or_nothing() {
    let ctx = create_test_context();
    let uow = truckore::repository::WeighmentUnitOfWork::new(ctx.conn.clone());

    let ticket = sample_ticket("TK-2026-001", "KA01AB1234");
    let bill = sample_bill("TK-2026-001", "KA01AB1234", "ABC", BillStatus::Open);
    uow.commit_open_weighment(
        &ticket,
        &bill,
        truckore::repository::SerialState {
            year: 2026,
            counter: 1,
        },
        &audit_log(ActionType::NewTwoTrip, ts(2026, 8, 6, 9, 0)),
    )
    .unwrap();

    assert!(ctx.ticket_repo.get_by_id(&ticket.ticket_id).unwrap().is_some());
    assert!(ctx.bill_repo.get_by_id(&bill.bill_id).unwrap().is_some());
    assert_eq!(
        ctx.serial_repo.load().unwrap(),
        Some(truckore::repository::SerialState {
            year: 2026,
            counter: 1
        })
    );
    assert_eq!(ctx.action_log_repo.list_recent(10).unwrap().len(), 1);

    // 重复提交同票号: 唯一约束拒绝, 且不会留下第二张磅单
    let dup_ticket = sample_ticket("TK-2026-001", "MH12CD5678");
    let dup_bill = sample_bill("TK-2026-001", "MH12CD5678", "XYZ", BillStatus::Open);
    let err = uow
        .commit_open_weighment(
            &dup_ticket,
            &dup_bill,
            truckore::repository::SerialState {
                year: 2026,
                counter: 2,
            },
            &audit_log(ActionType::NewTwoTrip, ts(2026, 8, 6, 9, 30)),
        )
        .unwrap_err();
    assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    assert!(ctx.bill_repo.get_by_id(&dup_bill.bill_id).unwrap().is_none());
    // 计数器也未被推进
    assert_eq!(
        ctx.serial_repo.load().unwrap(),
        Some(truckore::repository::SerialState {
            year: 2026,
            counter: 1
        })
    );
}
