// ==========================================
// 集成测试辅助模块
// ==========================================
#![allow(dead_code)]

pub mod setup_builder;

pub use setup_builder::SetupBuilder;
