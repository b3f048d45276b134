// ==========================================
// 地磅称重计费系统 - 磅单台账 CSV 导出
// ==========================================
// 职责: 把磅单列表写成对账用 CSV (交财务/客户)
// ==========================================

use std::io::Write;

use crate::domain::bill::Bill;

/// CSV 表头
const HEADER: [&str; 13] = [
    "bill_no",
    "ticket_no",
    "vehicle_no",
    "party_name",
    "product_name",
    "gross_weight_kg",
    "tare_weight_kg",
    "net_weight_kg",
    "charges",
    "status",
    "first_weight_type",
    "created_at",
    "closed_at",
];

/// 把磅单列表写入任意 Writer
///
/// # 返回
/// - Ok(count): 写出的数据行数
pub fn export_to_writer<W: Write>(writer: W, bills: &[Bill]) -> Result<usize, csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;

    for bill in bills {
        let record: [String; 13] = [
            bill.bill_no.clone(),
            bill.ticket_no.clone(),
            bill.vehicle_no.clone(),
            bill.party_name.clone(),
            bill.product_name.clone(),
            fmt_weight(bill.gross_weight_kg),
            fmt_weight(bill.tare_weight_kg),
            fmt_weight(bill.net_weight_kg),
            format!("{:.2}", bill.charges),
            bill.status.to_db_str().to_string(),
            bill.first_weight_type.to_db_str().to_string(),
            bill.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            bill.closed_at
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
        ];
        wtr.write_record(&record)?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(bills.len())
}

/// 把磅单列表写入指定路径
pub fn export_to_path(path: &str, bills: &[Bill]) -> Result<usize, csv::Error> {
    let file = std::fs::File::create(path).map_err(csv::Error::from)?;
    export_to_writer(file, bills)
}

fn fmt_weight(weight: Option<f64>) -> String {
    weight.map(|w| format!("{:.1}", w)).unwrap_or_default()
}
