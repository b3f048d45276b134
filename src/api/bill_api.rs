// ==========================================
// 地磅称重计费系统 - 磅单 API
// ==========================================
// 职责: 磅单查询、检索、驾驶舱汇总、台账导出
// ==========================================

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::bill::Bill;
use crate::export::bill_register;
use crate::repository::{BillRepository, TicketRepository};

// ==========================================
// DashboardSummary - 驾驶舱汇总
// ==========================================
// 用途: 操作员首页 (当日结算量 + 待闭合票据数)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub date: NaiveDate,        // 汇总日期
    pub bill_count: i64,        // 当日已结算磅单数
    pub total_net_kg: f64,      // 当日净重合计 (kg)
    pub total_charges: f64,     // 当日过磅费合计
    pub open_ticket_count: i64, // 当前开放票据数
}

// ==========================================
// BillApi - 磅单 API
// ==========================================
pub struct BillApi {
    bill_repo: Arc<BillRepository>,
    ticket_repo: Arc<TicketRepository>,
}

impl BillApi {
    /// 创建新的 BillApi 实例
    pub fn new(bill_repo: Arc<BillRepository>, ticket_repo: Arc<TicketRepository>) -> Self {
        Self {
            bill_repo,
            ticket_repo,
        }
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 分页列出磅单
    pub fn list_bills(&self, limit: i64, offset: i64) -> ApiResult<Vec<Bill>> {
        if limit <= 0 {
            return Err(ApiError::InvalidInput("limit 必须为正数".to_string()));
        }
        Ok(self.bill_repo.list(limit, offset.max(0))?)
    }

    /// 按磅单号/车牌/客户名称检索 (不区分大小写)
    pub fn search_bills(&self, query: &str) -> ApiResult<Vec<Bill>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::InvalidInput("检索关键字不能为空".to_string()));
        }
        Ok(self.bill_repo.search(query)?)
    }

    /// 查询磅单详情
    pub fn get_bill(&self, bill_id: &str) -> ApiResult<Option<Bill>> {
        Ok(self.bill_repo.get_by_id(bill_id)?)
    }

    /// 当日驾驶舱汇总
    pub fn daily_summary(&self) -> ApiResult<DashboardSummary> {
        let date = Local::now().date_naive();
        let bills = self.bill_repo.daily_summary(date)?;
        let open_ticket_count = self.ticket_repo.list()?.len() as i64;

        Ok(DashboardSummary {
            date,
            bill_count: bills.bill_count,
            total_net_kg: bills.total_net_kg,
            total_charges: bills.total_charges,
            open_ticket_count,
        })
    }

    // ==========================================
    // 台账导出
    // ==========================================

    /// 导出日期范围内的磅单台账为 CSV
    ///
    /// # 返回
    /// - Ok(count): 导出的磅单行数
    pub fn export_register(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        output_path: &str,
    ) -> ApiResult<usize> {
        if from > to {
            return Err(ApiError::InvalidInput(format!(
                "日期范围无效: {} > {}",
                from, to
            )));
        }

        let bills = self.bill_repo.list_by_date_range(from, to)?;
        bill_register::export_to_path(output_path, &bills)
            .map_err(|e| ApiError::ExportError(e.to_string()))
    }
}
