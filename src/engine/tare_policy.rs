// ==========================================
// 地磅称重计费系统 - 存皮有效期策略
// ==========================================
// 单一阈值: 判定(get_valid)与展示(expiry_info)共用同一窗口常量,
//           两处阈值不允许出现分叉
// 边界: now - stored_at <= 窗口 视为有效 (含边界)
// ==========================================

use crate::domain::tare::{StoredTare, TareExpiryInfo};
use chrono::{Duration, NaiveDateTime};

/// 判定存皮是否仍在有效期内 (含边界)
pub fn is_within_window(
    stored_at: NaiveDateTime,
    now: NaiveDateTime,
    validity_days: i64,
) -> bool {
    now - stored_at <= Duration::days(validity_days)
}

/// 计算存皮有效期信息 (操作员展示)
///
/// 与 is_within_window 共用同一阈值; is_expired 恰为其取反
pub fn expiry_info(tare: &StoredTare, now: NaiveDateTime, validity_days: i64) -> TareExpiryInfo {
    let expiry_moment = tare.stored_at + Duration::days(validity_days);
    let is_expired = !is_within_window(tare.stored_at, now, validity_days);

    let (days_remaining, hours_remaining) = if is_expired {
        (0, 0)
    } else {
        let remaining = expiry_moment - now;
        let days = remaining.num_days();
        let hours = (remaining - Duration::days(days)).num_hours();
        (days, hours)
    };

    TareExpiryInfo {
        is_expired,
        days_remaining,
        hours_remaining,
        expiry_date: expiry_moment.date(),
    }
}
