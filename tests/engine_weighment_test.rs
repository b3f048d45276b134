// ==========================================
// 过磅引擎集成测试
// ==========================================
// 测试目标: 验证三类操作 (New / Update / Stored-Tare) 的完整状态流转
// ==========================================

mod test_helpers;

use test_helpers::*;
use truckore::domain::types::{BillStatus, VehicleStatus, WeightType};
use truckore::engine::{EngineError, WeighmentCommand, WeighmentOutcome};
use truckore::logging;

// ==========================================
// 两程流程
// ==========================================

#[tokio::test]
async fn test_two_trip_gross_first_flow() {
    logging::init_test();
    let ctx = create_test_context();

    // 场景A: 重车首程
    let outcome = ctx
        .engine
        .execute(
            WeighmentCommand::NewTwoTrip {
                vehicle_no: "KA01AB1234".to_string(),
                party_name: "ABC".to_string(),
                product_name: "Steel".to_string(),
                vehicle_status: VehicleStatus::Load,
                charges: 150.0,
            },
            stable(15000.0),
            no_images(),
            "tester",
            ts(2026, 8, 6, 9, 0),
        )
        .await
        .expect("首程开票应该成功");

    let (ticket, bill) = match outcome {
        WeighmentOutcome::TicketOpened { ticket, bill } => (ticket, bill),
        other => panic!("期望 TicketOpened, 实际 {:?}", other),
    };

    assert_eq!(ticket.first_weight_type, WeightType::Gross);
    assert_eq!(ticket.gross_weight_kg, Some(15000.0));
    assert_eq!(ticket.tare_weight_kg, None);
    assert!(ticket.has_exactly_one_weight());
    assert_eq!(bill.status, BillStatus::Open);
    assert_eq!(bill.net_weight_kg, None);
    assert_eq!(bill.bill_no, ticket.ticket_no);

    // 台账应各有一条
    assert_eq!(ctx.ticket_repo.list().unwrap().len(), 1);
    let stored_bill = ctx.bill_repo.find_by_bill_no(&bill.bill_no).unwrap().unwrap();
    assert_eq!(stored_bill.status, BillStatus::Open);

    // 场景B: 第二程闭票
    let outcome = ctx
        .engine
        .execute(
            WeighmentCommand::CloseTicket {
                ticket_id: ticket.ticket_id.clone(),
                charges_override: None,
            },
            stable(5000.0),
            no_images(),
            "tester",
            ts(2026, 8, 6, 15, 30),
        )
        .await
        .expect("闭票应该成功");

    let closed = match outcome {
        WeighmentOutcome::BillClosed { bill } => bill,
        other => panic!("期望 BillClosed, 实际 {:?}", other),
    };

    assert_eq!(closed.status, BillStatus::Closed);
    assert_eq!(closed.gross_weight_kg, Some(15000.0));
    assert_eq!(closed.tare_weight_kg, Some(5000.0));
    assert_eq!(closed.net_weight_kg, Some(10000.0));
    assert_eq!(closed.charges, 150.0);
    assert!(closed.closed_at.is_some());

    // 票据应已从台账移除
    assert!(ctx.ticket_repo.list().unwrap().is_empty());
    assert!(ctx.ticket_repo.get_by_id(&ticket.ticket_id).unwrap().is_none());
}

#[tokio::test]
async fn test_two_trip_tare_first_flow() {
    let ctx = create_test_context();

    // 空车首程: 先记皮重
    let outcome = ctx
        .engine
        .execute(
            WeighmentCommand::NewTwoTrip {
                vehicle_no: "MH12CD5678".to_string(),
                party_name: "XYZ Traders".to_string(),
                product_name: "Cement".to_string(),
                vehicle_status: VehicleStatus::Empty,
                charges: 100.0,
            },
            stable(4200.0),
            no_images(),
            "tester",
            ts(2026, 8, 6, 8, 0),
        )
        .await
        .unwrap();

    let ticket = match outcome {
        WeighmentOutcome::TicketOpened { ticket, .. } => ticket,
        other => panic!("期望 TicketOpened, 实际 {:?}", other),
    };
    assert_eq!(ticket.first_weight_type, WeightType::Tare);
    assert_eq!(ticket.tare_weight_kg, Some(4200.0));
    assert_eq!(ticket.gross_weight_kg, None);

    // 第二程: 重车回磅, net = live - tare
    let outcome = ctx
        .engine
        .execute(
            WeighmentCommand::CloseTicket {
                ticket_id: ticket.ticket_id,
                charges_override: None,
            },
            stable(16200.0),
            no_images(),
            "tester",
            ts(2026, 8, 6, 13, 0),
        )
        .await
        .unwrap();

    let closed = match outcome {
        WeighmentOutcome::BillClosed { bill } => bill,
        other => panic!("期望 BillClosed, 实际 {:?}", other),
    };
    assert_eq!(closed.gross_weight_kg, Some(16200.0));
    assert_eq!(closed.tare_weight_kg, Some(4200.0));
    assert_eq!(closed.net_weight_kg, Some(12000.0));
}

#[tokio::test]
async fn test_close_with_inconsistent_reading_yields_negative_net() {
    let ctx = create_test_context();

    let outcome = ctx
        .engine
        .execute(
            WeighmentCommand::NewTwoTrip {
                vehicle_no: "KA05EF0001".to_string(),
                party_name: "ABC".to_string(),
                product_name: "Scrap".to_string(),
                vehicle_status: VehicleStatus::Load,
                charges: 0.0,
            },
            stable(4000.0),
            no_images(),
            "tester",
            ts(2026, 8, 6, 9, 0),
        )
        .await
        .unwrap();
    let ticket = match outcome {
        WeighmentOutcome::TicketOpened { ticket, .. } => ticket,
        other => panic!("期望 TicketOpened, 实际 {:?}", other),
    };

    // 第二次读数高于首程毛重: 引擎不钳制, 负净重原样呈现
    let outcome = ctx
        .engine
        .execute(
            WeighmentCommand::CloseTicket {
                ticket_id: ticket.ticket_id,
                charges_override: None,
            },
            stable(5000.0),
            no_images(),
            "tester",
            ts(2026, 8, 6, 10, 0),
        )
        .await
        .unwrap();
    let closed = match outcome {
        WeighmentOutcome::BillClosed { bill } => bill,
        other => panic!("期望 BillClosed, 实际 {:?}", other),
    };
    assert_eq!(closed.net_weight_kg, Some(-1000.0));
}

// ==========================================
// 一次性流程
// ==========================================

#[tokio::test]
async fn test_one_time_flow() {
    let ctx = create_test_context();

    // 场景C: 一次性过磅, 皮重记 0
    let outcome = ctx
        .engine
        .execute(
            WeighmentCommand::NewOneTime {
                vehicle_no: "TN09GH3456".to_string(),
                party_name: "Walk-in".to_string(),
                product_name: "Sand".to_string(),
                charges: 80.0,
            },
            stable(8000.0),
            no_images(),
            "tester",
            ts(2026, 8, 6, 11, 0),
        )
        .await
        .unwrap();

    let bill = match outcome {
        WeighmentOutcome::BillClosed { bill } => bill,
        other => panic!("期望 BillClosed, 实际 {:?}", other),
    };
    assert_eq!(bill.status, BillStatus::Closed);
    assert_eq!(bill.first_weight_type, WeightType::OneTime);
    assert_eq!(bill.gross_weight_kg, Some(8000.0));
    assert_eq!(bill.tare_weight_kg, Some(0.0));
    assert_eq!(bill.net_weight_kg, Some(8000.0));
    assert!(bill.closed_at.is_some());

    // 一次性流程不产生票据
    assert!(ctx.ticket_repo.list().unwrap().is_empty());
}

// ==========================================
// 存皮流程
// ==========================================

#[tokio::test]
async fn test_stored_tare_store_then_bill() {
    let ctx = create_test_context();

    // 场景D-1: 存皮
    let outcome = ctx
        .engine
        .execute(
            WeighmentCommand::StoreTare {
                vehicle_no: "GJ01XY9012".to_string(),
            },
            stable(5000.0),
            no_images(),
            "tester",
            ts(2026, 8, 1, 9, 0),
        )
        .await
        .unwrap();

    let tare = match outcome {
        WeighmentOutcome::TareStored { tare } => tare,
        other => panic!("期望 TareStored, 实际 {:?}", other),
    };
    assert_eq!(tare.tare_weight_kg, 5000.0);

    // 场景D-2: 存皮出单 (有效期内)
    let outcome = ctx
        .engine
        .execute(
            WeighmentCommand::StoredTareBill {
                vehicle_no: "GJ01XY9012".to_string(),
                party_name: "Shuttle Co".to_string(),
                product_name: "Gravel".to_string(),
                charges: 120.0,
            },
            stable(17000.0),
            no_images(),
            "tester",
            ts(2026, 8, 6, 10, 0),
        )
        .await
        .unwrap();

    let bill = match outcome {
        WeighmentOutcome::BillClosed { bill } => bill,
        other => panic!("期望 BillClosed, 实际 {:?}", other),
    };
    assert_eq!(bill.status, BillStatus::Closed);
    assert_eq!(bill.first_weight_type, WeightType::Gross);
    assert_eq!(bill.gross_weight_kg, Some(17000.0));
    assert_eq!(bill.tare_weight_kg, Some(5000.0));
    assert_eq!(bill.net_weight_kg, Some(12000.0));
    assert!(ctx.ticket_repo.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_stored_tare_bill_rejects_expired_tare() {
    let ctx = create_test_context();
    // 收紧窗口到 2 天, 验证窗口可配置
    set_config(&ctx, "tare/validity_days", "2");

    ctx.engine
        .execute(
            WeighmentCommand::StoreTare {
                vehicle_no: "GJ05AB1111".to_string(),
            },
            stable(4800.0),
            no_images(),
            "tester",
            ts(2026, 8, 1, 9, 0),
        )
        .await
        .unwrap();

    // 边界内 (恰满 2 天): 允许出单
    assert!(ctx
        .engine
        .has_valid_tare("GJ05AB1111", ts(2026, 8, 3, 9, 0))
        .await
        .unwrap());

    // 超窗: 拒绝出单
    let err = ctx
        .engine
        .execute(
            WeighmentCommand::StoredTareBill {
                vehicle_no: "GJ05AB1111".to_string(),
                party_name: "Shuttle Co".to_string(),
                product_name: "Gravel".to_string(),
                charges: 0.0,
            },
            stable(15000.0),
            no_images(),
            "tester",
            ts(2026, 8, 3, 10, 0),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::TareNotValid(_)));
    assert!(err.is_integrity());
}

// ==========================================
// 校验与完整性
// ==========================================

#[tokio::test]
async fn test_validation_rejects_before_any_mutation() {
    let ctx = create_test_context();

    // 缺必填字段
    let err = ctx
        .engine
        .execute(
            WeighmentCommand::NewTwoTrip {
                vehicle_no: "  ".to_string(),
                party_name: "ABC".to_string(),
                product_name: "Steel".to_string(),
                vehicle_status: VehicleStatus::Load,
                charges: 0.0,
            },
            stable(15000.0),
            no_images(),
            "tester",
            ts(2026, 8, 6, 9, 0),
        )
        .await
        .unwrap_err();
    assert!(err.is_validation());

    // 读数未稳定
    let err = ctx
        .engine
        .execute(
            WeighmentCommand::NewOneTime {
                vehicle_no: "KA01AB1234".to_string(),
                party_name: "ABC".to_string(),
                product_name: "Steel".to_string(),
                charges: 0.0,
            },
            unstable(15000.0),
            no_images(),
            "tester",
            ts(2026, 8, 6, 9, 0),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnstableWeight));

    // 负过磅费
    let err = ctx
        .engine
        .execute(
            WeighmentCommand::NewOneTime {
                vehicle_no: "KA01AB1234".to_string(),
                party_name: "ABC".to_string(),
                product_name: "Steel".to_string(),
                charges: -1.0,
            },
            stable(15000.0),
            no_images(),
            "tester",
            ts(2026, 8, 6, 9, 0),
        )
        .await
        .unwrap_err();
    assert!(err.is_validation());

    // 全部被拒后: 台账零记录, 流水号未被消耗
    assert!(ctx.ticket_repo.list().unwrap().is_empty());
    assert!(ctx.bill_repo.list(10, 0).unwrap().is_empty());
    let next = ctx.engine.peek_serial(ts(2026, 8, 6, 9, 30)).await.unwrap();
    assert_eq!(next, "TK-2026-001");
}

#[tokio::test]
async fn test_close_unknown_ticket_is_integrity_error() {
    let ctx = create_test_context();

    let err = ctx
        .engine
        .execute(
            WeighmentCommand::CloseTicket {
                ticket_id: "no-such-ticket".to_string(),
                charges_override: None,
            },
            stable(5000.0),
            no_images(),
            "tester",
            ts(2026, 8, 6, 9, 0),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::TicketNotFound(_)));
    assert!(err.is_integrity());
}

#[tokio::test]
async fn test_double_close_reports_ticket_gone() {
    let ctx = create_test_context();

    let outcome = ctx
        .engine
        .execute(
            WeighmentCommand::NewTwoTrip {
                vehicle_no: "KA01AB1234".to_string(),
                party_name: "ABC".to_string(),
                product_name: "Steel".to_string(),
                vehicle_status: VehicleStatus::Load,
                charges: 0.0,
            },
            stable(15000.0),
            no_images(),
            "tester",
            ts(2026, 8, 6, 9, 0),
        )
        .await
        .unwrap();
    let ticket = match outcome {
        WeighmentOutcome::TicketOpened { ticket, .. } => ticket,
        other => panic!("期望 TicketOpened, 实际 {:?}", other),
    };

    ctx.engine
        .execute(
            WeighmentCommand::CloseTicket {
                ticket_id: ticket.ticket_id.clone(),
                charges_override: None,
            },
            stable(5000.0),
            no_images(),
            "tester",
            ts(2026, 8, 6, 10, 0),
        )
        .await
        .unwrap();

    // 第二次闭同一张票: 可恢复的完整性错误, 不是崩溃
    let err = ctx
        .engine
        .execute(
            WeighmentCommand::CloseTicket {
                ticket_id: ticket.ticket_id,
                charges_override: None,
            },
            stable(5100.0),
            no_images(),
            "tester",
            ts(2026, 8, 6, 10, 5),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::TicketNotFound(_)));
}

// ==========================================
// 打印标记
// ==========================================

#[tokio::test]
async fn test_mark_printed_idempotent() {
    let ctx = create_test_context();

    let outcome = ctx
        .engine
        .execute(
            WeighmentCommand::NewOneTime {
                vehicle_no: "KA01AB1234".to_string(),
                party_name: "ABC".to_string(),
                product_name: "Steel".to_string(),
                charges: 0.0,
            },
            stable(8000.0),
            no_images(),
            "tester",
            ts(2026, 8, 6, 11, 0),
        )
        .await
        .unwrap();
    let bill = match outcome {
        WeighmentOutcome::BillClosed { bill } => bill,
        other => panic!("期望 BillClosed, 实际 {:?}", other),
    };

    let printed = ctx
        .engine
        .mark_printed(&bill.bill_id, "tester", ts(2026, 8, 6, 11, 5))
        .unwrap();
    assert_eq!(printed.status, BillStatus::Printed);
    let first_printed_at = printed.printed_at.expect("printed_at 应已写入");

    // 幂等: 第二次调用不报错, printed_at 不变
    let again = ctx
        .engine
        .mark_printed(&bill.bill_id, "tester", ts(2026, 8, 6, 11, 30))
        .unwrap();
    assert_eq!(again.status, BillStatus::Printed);
    assert_eq!(again.printed_at, Some(first_printed_at));
}

#[tokio::test]
async fn test_mark_printed_rejects_open_bill() {
    let ctx = create_test_context();

    let outcome = ctx
        .engine
        .execute(
            WeighmentCommand::NewTwoTrip {
                vehicle_no: "KA01AB1234".to_string(),
                party_name: "ABC".to_string(),
                product_name: "Steel".to_string(),
                vehicle_status: VehicleStatus::Load,
                charges: 0.0,
            },
            stable(15000.0),
            no_images(),
            "tester",
            ts(2026, 8, 6, 9, 0),
        )
        .await
        .unwrap();
    let bill = match outcome {
        WeighmentOutcome::TicketOpened { bill, .. } => bill,
        other => panic!("期望 TicketOpened, 实际 {:?}", other),
    };

    // OPEN 不允许直接跳到 PRINTED
    let err = ctx
        .engine
        .mark_printed(&bill.bill_id, "tester", ts(2026, 8, 6, 9, 5))
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidStateTransition { .. }));
}
