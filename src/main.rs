// ==========================================
// 市集摊位分配引擎 - 命令行入口
// ==========================================
// 用法:
//   market-assign <setup.json> [output.json] [--csv <pivot.csv>] [--config <engine_config.json>] [--json-log]
//
// 不给 output.json 时结果写到 stdout,日志始终写 stderr
// ==========================================

use anyhow::{bail, Context, Result};
use market_assign::exporter::export_pivot_csv_file;
use market_assign::{
    logging, AssignmentScheduler, AssignmentValidator, ConfigManager, EngineConfig, SetupObject,
};
use std::path::PathBuf;

const USAGE: &str = "用法: market-assign <setup.json> [output.json] [--csv <pivot.csv>] [--config <engine_config.json>] [--json-log]";

#[derive(Debug, Default)]
struct CliArgs {
    setup_path: PathBuf,
    output_path: Option<PathBuf>,
    csv_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    json_log: bool,
}

fn parse_args() -> Result<CliArgs> {
    let mut args = std::env::args().skip(1);
    let mut positional = Vec::new();
    let mut cli = CliArgs::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--csv" => {
                cli.csv_path = Some(args.next().context("--csv 缺少文件路径")?.into());
            }
            "--config" => {
                cli.config_path = Some(args.next().context("--config 缺少文件路径")?.into());
            }
            "--json-log" => cli.json_log = true,
            "-h" | "--help" => bail!("{}", USAGE),
            other if other.starts_with("--") => bail!("未知参数: {}\n{}", other, USAGE),
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    let mut positional = positional.into_iter();
    cli.setup_path = positional.next().context(USAGE)?;
    cli.output_path = positional.next();
    if let Some(extra) = positional.next() {
        bail!("多余的参数: {}\n{}", extra.display(), USAGE);
    }
    Ok(cli)
}

fn main() -> Result<()> {
    let cli = parse_args()?;

    if cli.json_log {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("==================================================");
    tracing::info!("{}", market_assign::APP_NAME);
    tracing::info!("系统版本: {}", market_assign::VERSION);
    tracing::info!("==================================================");

    // 引擎配置
    let manager = match &cli.config_path {
        Some(path) => ConfigManager::from_file(path)
            .with_context(|| format!("无法加载引擎配置: {}", path.display()))?,
        None => ConfigManager::new(),
    };
    tracing::info!(config = %manager.snapshot()?, "引擎配置");
    let config = EngineConfig::from_reader(&manager)?;

    // 市集配置
    let raw = std::fs::read_to_string(&cli.setup_path)
        .with_context(|| format!("无法读取市集配置: {}", cli.setup_path.display()))?;
    let setup: SetupObject = serde_json::from_str(&raw)
        .with_context(|| format!("市集配置 JSON 格式错误: {}", cli.setup_path.display()))?;

    let object = AssignmentScheduler::new(config)
        .run(&setup)
        .context("分配失败")?;

    // 复核结果
    let report = AssignmentValidator::new(&setup, config)?.validate(&object);
    for violation in &report.violations {
        tracing::warn!(%violation, "分配结果违规");
    }
    tracing::info!(
        unassigned = report.unassigned_vendors.len(),
        theoretical_max = ?report.theoretical_max,
        "分配结果复核完成"
    );

    let json = serde_json::to_string_pretty(&object)?;
    match &cli.output_path {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("无法写入结果: {}", path.display()))?;
            tracing::info!(path = %path.display(), "分配结果已写出");
        }
        None => println!("{}", json),
    }

    if let Some(path) = &cli.csv_path {
        export_pivot_csv_file(&object, path)?;
    }

    Ok(())
}
