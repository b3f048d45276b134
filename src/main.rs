// ==========================================
// 地磅称重计费系统 - Tauri 主入口
// ==========================================
// 技术栈: Tauri + Rust + SQLite
// ==========================================

// 禁止控制台窗口 (Windows)
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use truckore::app::get_default_db_path;

#[cfg(feature = "tauri-app")]
fn main() {
    use truckore::app::tauri_commands::*;
    use truckore::app::AppState;

    // 初始化日志系统
    truckore::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", truckore::APP_NAME);
    tracing::info!("系统版本: {}", truckore::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    // 创建AppState
    tracing::info!("正在初始化AppState...");
    let app_state = AppState::new(db_path).expect("无法初始化AppState");

    tracing::info!("AppState初始化成功");
    tracing::info!("启动Tauri应用...");

    // 启动Tauri应用
    tauri::Builder::default()
        .manage(app_state)
        .invoke_handler(tauri::generate_handler![
            // ==========================================
            // 过磅相关命令 (7个)
            // ==========================================
            get_weight_reading,
            peek_serial_no,
            new_two_trip,
            new_one_time,
            close_ticket,
            stored_tare,
            list_open_tickets,

            // ==========================================
            // 磅单相关命令 (6个)
            // ==========================================
            list_bills,
            search_bills,
            get_bill,
            get_daily_summary,
            mark_bill_printed,
            export_bill_register,

            // ==========================================
            // 存皮相关命令 (2个)
            // ==========================================
            get_tare_info,
            list_stored_tares,

            // ==========================================
            // 配置相关命令 (2个)
            // ==========================================
            get_settings,
            update_setting,
        ])
        .run(tauri::generate_context!())
        .expect("启动Tauri应用失败");

    tracing::info!("Tauri应用已退出");
}

#[cfg(not(feature = "tauri-app"))]
fn main() {
    println!("==================================================");
    println!("{}", truckore::APP_NAME);
    println!("系统版本: {}", truckore::VERSION);
    println!("==================================================");
    println!();
    println!("此可执行文件需要启用 tauri-app 特性");
    println!("使用: cargo run --features tauri-app");
    println!();
    println!("或者使用库模式:");
    println!("use truckore::app::AppState;");
    println!();
    println!("默认数据库路径: {}", get_default_db_path());
}
