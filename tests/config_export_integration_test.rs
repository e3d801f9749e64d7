// ==========================================
// 配置加载 / 结果复核 / 透视表导出 集成测试
// ==========================================
// 场景: 配置文件 → 引擎运行 → 校验报告 → CSV 文件
// ==========================================

mod helpers;

use helpers::SetupBuilder;
use market_assign::config::config_keys;
use market_assign::domain::types::DataType;
use market_assign::exporter::export_pivot_csv_file;
use market_assign::{
    logging, AssignmentScheduler, AssignmentValidator, ConfigError, ConfigManager, ContainsMode,
    EngineConfig, EngineConfigReader, SetupObject,
};
use std::io::Write;
use tempfile::NamedTempFile;

// ==========================================
// 测试辅助函数
// ==========================================

fn create_test_setup() -> SetupObject {
    SetupBuilder::new(&["Email", "Products", "Tier"])
        .date("2025-03-18")
        .date("2025-03-17")
        .vendor(&["a@test.com", "handmade soap", "Gold"], &["yes", "yes"])
        .vendor(&["b@test.com", "resale", "Gold"], &["yes", ""])
        .vendor(&["c@test.com", "Handmade art", "Silver"], &["", "yes"])
        .priority(1, "Products", DataType::Contains, "handmade")
        .section("Hall", Some("Gold"), None, 1)
        .section("Yard", None, None, 1)
        .build()
}

fn write_config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

// ==========================================
// 配置文件
// ==========================================

#[test]
fn test_config_file_drives_engine_behavior() {
    logging::init_test();
    let file = write_config_file(
        r#"{"contains_mode": "RANKING_ONLY", "case_insensitive_match": true, "table_code_width": 3}"#,
    );
    let manager = ConfigManager::from_file(file.path()).unwrap();
    let config = EngineConfig::from_reader(&manager).unwrap();
    assert_eq!(config.contains_mode, ContainsMode::RankingOnly);

    let object = AssignmentScheduler::new(config).run(&create_test_setup()).unwrap();

    // RANKING_ONLY 下 b 仍可分配; 桌号宽度为 3
    assert!(object.assignments_for("b@test.com").count() > 0);
    assert!(object
        .vendor_assignments
        .iter()
        .all(|r| r.table_code.len() == r.section.len() + 3));
}

#[test]
fn test_default_config_filters_and_uses_two_digit_codes() {
    let object = AssignmentScheduler::default().run(&create_test_setup()).unwrap();

    assert_eq!(object.assignments_for("b@test.com").count(), 0);
    let codes: Vec<&str> = object.assignments_on("2025-03-18").map(|r| r.table_code.as_str()).collect();
    assert_eq!(codes, vec!["Hall01"]);
}

#[test]
fn test_case_sensitive_config_changes_contains_matching() {
    let mut manager = ConfigManager::new();
    manager.set(config_keys::CASE_INSENSITIVE_MATCH, "false");
    let config = EngineConfig::from_reader(&manager).unwrap();

    let object = AssignmentScheduler::new(config).run(&create_test_setup()).unwrap();
    // "Handmade art" 不再包含 "handmade"
    assert_eq!(object.assignments_for("c@test.com").count(), 0);
    assert_eq!(object.assignments_for("a@test.com").count(), 2);
}

#[test]
fn test_bad_config_file_is_rejected() {
    let file = write_config_file(r#"{"table_code_width": 9}"#);
    let manager = ConfigManager::from_file(file.path()).unwrap();
    assert!(matches!(
        manager.get_table_code_width(),
        Err(ConfigError::InvalidConfigValue { .. })
    ));

    let broken = write_config_file("not json");
    assert!(matches!(
        ConfigManager::from_file(broken.path()),
        Err(ConfigError::ConfigFile(_))
    ));
    assert!(ConfigManager::from_file("/no/such/engine_config.json").is_err());
}

// ==========================================
// 复核与导出
// ==========================================

#[test]
fn test_engine_output_passes_validation() {
    let setup = create_test_setup();
    let config = EngineConfig::default();
    let object = AssignmentScheduler::new(config).run(&setup).unwrap();

    let report = AssignmentValidator::new(&setup, config).unwrap().validate(&object);
    assert!(report.is_valid(), "{:?}", report.violations);
    assert_eq!(report.unassigned_vendors, vec!["b@test.com".to_string()]);
}

#[test]
fn test_pivot_csv_written_to_file() {
    let object = AssignmentScheduler::default().run(&create_test_setup()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pivot.csv");

    let rows = export_pivot_csv_file(&object, &path).unwrap();
    assert_eq!(rows, 2);

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    // 日期列按日历排序,与声明顺序无关
    assert_eq!(lines[0], "email,section,tier,location,table_choice,2025-03-17,2025-03-18");
    assert_eq!(lines[1], "a@test.com,Hall,Gold,,Full table,Hall01,Hall01");
    assert_eq!(lines[2], "c@test.com,Yard,,,Full table,Yard01,");
}

#[test]
fn test_setup_json_document_round_trip_through_engine() {
    let raw = serde_json::to_string(&create_test_setup()).unwrap();
    let setup: SetupObject = serde_json::from_str(&raw).unwrap();

    let object = market_assign::assign_setup(&setup).unwrap();
    let value = serde_json::to_value(&object).unwrap();

    assert_eq!(value["totalVendorsAssigned"], 3);
    assert_eq!(value["vendorAssignments"][0]["tableChoice"], "Full table");
    assert_eq!(value["assignmentStatistics"]["assignmentsPerSection"]["Hall"], 2);
    assert_eq!(value["assignmentStatistics"]["assignmentsPerTier"]["Unassigned"], 1);
}
