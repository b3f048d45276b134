// ==========================================
// 地磅称重计费系统 - Tauri 命令（按域拆分）
// ==========================================
// 职责: Tauri 命令定义,连接前端与后端 API
// ==========================================

#![cfg(feature = "tauri-app")]

mod bill;
mod common;
mod config;
mod tare;
mod weighment;

pub use bill::*;
pub use config::*;
pub use tare::*;
pub use weighment::*;
