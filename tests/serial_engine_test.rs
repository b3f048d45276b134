// ==========================================
// 流水号生成器集成测试
// ==========================================
// 测试目标: 年内严格递增、跨年重置、peek 无副作用、损坏回退
// ==========================================

mod test_helpers;

use test_helpers::*;
use truckore::engine::WeighmentCommand;
use truckore::repository::SerialState;

async fn run_one_time(ctx: &TestContext, weight: f64, when: chrono::NaiveDateTime) -> String {
    let outcome = ctx
        .engine
        .execute(
            WeighmentCommand::NewOneTime {
                vehicle_no: "KA01AB1234".to_string(),
                party_name: "ABC".to_string(),
                product_name: "Steel".to_string(),
                charges: 0.0,
            },
            stable(weight),
            no_images(),
            "tester",
            when,
        )
        .await
        .unwrap();
    match outcome {
        truckore::engine::WeighmentOutcome::BillClosed { bill } => bill.bill_no,
        other => panic!("期望 BillClosed, 实际 {:?}", other),
    }
}

#[tokio::test]
async fn test_committed_operations_get_strictly_increasing_serials() {
    let ctx = create_test_context();

    let first = run_one_time(&ctx, 8000.0, ts(2026, 8, 6, 9, 0)).await;
    let second = run_one_time(&ctx, 9000.0, ts(2026, 8, 6, 10, 0)).await;
    let third = run_one_time(&ctx, 9500.0, ts(2026, 8, 6, 11, 0)).await;

    assert_eq!(first, "TK-2026-001");
    assert_eq!(second, "TK-2026-002");
    assert_eq!(third, "TK-2026-003");
}

#[tokio::test]
async fn test_peek_has_no_side_effects() {
    let ctx = create_test_context();

    let peek1 = ctx.engine.peek_serial(ts(2026, 8, 6, 9, 0)).await.unwrap();
    let peek2 = ctx.engine.peek_serial(ts(2026, 8, 6, 9, 5)).await.unwrap();
    assert_eq!(peek1, peek2);
    assert_eq!(peek1, "TK-2026-001");

    // 预览过的号由下一次提交的操作实际取走
    let committed = run_one_time(&ctx, 8000.0, ts(2026, 8, 6, 9, 10)).await;
    assert_eq!(committed, peek1);
}

#[tokio::test]
async fn test_aborted_operation_does_not_burn_serial() {
    let ctx = create_test_context();

    // 校验失败的操作不消耗号段
    let _ = ctx
        .engine
        .execute(
            WeighmentCommand::NewOneTime {
                vehicle_no: String::new(),
                party_name: "ABC".to_string(),
                product_name: "Steel".to_string(),
                charges: 0.0,
            },
            stable(8000.0),
            no_images(),
            "tester",
            ts(2026, 8, 6, 9, 0),
        )
        .await
        .unwrap_err();

    let committed = run_one_time(&ctx, 8000.0, ts(2026, 8, 6, 9, 30)).await;
    assert_eq!(committed, "TK-2026-001");
}

#[tokio::test]
async fn test_new_year_resets_counter() {
    let ctx = create_test_context();

    // 去年已签到 042
    ctx.serial_repo
        .save(
            SerialState {
                year: 2025,
                counter: 42,
            },
            ts(2025, 12, 31, 23, 0),
        )
        .unwrap();

    let first_of_year = run_one_time(&ctx, 8000.0, ts(2026, 1, 2, 8, 0)).await;
    assert_eq!(first_of_year, "TK-2026-001");

    let next = run_one_time(&ctx, 9000.0, ts(2026, 1, 2, 9, 0)).await;
    assert_eq!(next, "TK-2026-002");
}

#[tokio::test]
async fn test_corrupt_state_falls_back_to_reset() {
    let ctx = create_test_context();

    // 人为写坏计数器行 (SQLite 动态类型允许塞入文本)
    {
        let conn = ctx.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO serial_state (id, year, counter, updated_at) \
             VALUES (1, 'garbage', 'not-a-number', '2026-08-06 09:00:00')",
            [],
        )
        .unwrap();
    }

    // 生成器按当年重置, 不让操作失败
    let committed = run_one_time(&ctx, 8000.0, ts(2026, 8, 6, 10, 0)).await;
    assert_eq!(committed, "TK-2026-001");
}

#[tokio::test]
async fn test_serial_format_follows_config() {
    let ctx = create_test_context();
    set_config(&ctx, "serial/prefix", "WB");
    set_config(&ctx, "serial/pad_width", "4");
    set_config(&ctx, "serial/counter_start", "100");

    let peek = ctx.engine.peek_serial(ts(2026, 8, 6, 9, 0)).await.unwrap();
    assert_eq!(peek, "WB-2026-0100");

    let committed = run_one_time(&ctx, 8000.0, ts(2026, 8, 6, 9, 10)).await;
    assert_eq!(committed, "WB-2026-0100");
    let next = run_one_time(&ctx, 8200.0, ts(2026, 8, 6, 9, 20)).await;
    assert_eq!(next, "WB-2026-0101");
}
