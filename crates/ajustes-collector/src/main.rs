//! B3 정산 테이블 수집기 CLI.

use std::path::PathBuf;

use ajustes_collector::{menu, CollectorConfig, SettlementCollector, Verbosity};
use ajustes_core::{init_logging, parse_iso_date, LogConfig, LogFormat};
use anyhow::Context;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ajustes-collector")]
#[command(about = "B3 daily settlement (ajustes do pregão) collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML 설정 파일 경로
    #[arg(long, global = true, env = "AJUSTES_CONFIG")]
    config: Option<PathBuf>,

    /// 수집 시작일 (YYYY-MM-DD)
    #[arg(long, global = true)]
    start: Option<String>,

    /// 수집 종료일 (YYYY-MM-DD)
    #[arg(long, global = true)]
    end: Option<String>,

    /// 결과 파일 디렉토리
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// 결과 파일명 패턴 ({data} = YYYY-MM-DD)
    #[arg(long, global = true)]
    pattern: Option<String>,

    /// 워커 수 (기본값: 하드웨어 병렬성)
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// 일자별 로그 상세 수준 (silent, per-date, diagnostics)
    #[arg(long, global = true)]
    verbosity: Option<Verbosity>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// 로그 형식 (pretty, json, compact)
    #[arg(long, global = true, default_value = "compact")]
    log_format: LogFormat,

    /// 실행 결과를 JSON으로 출력
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 수집 대상 일자 다운로드
    Run {
        /// 워커 1개로 일자순 실행
        #[arg(long)]
        sequential: bool,
    },

    /// 수집 대상 일자 출력
    Pending,

    /// 설정 출력
    ShowConfig,

    /// 대화형 메뉴
    Menu,
}

impl Cli {
    /// 설정 파일/환경변수 위에 CLI 인자 적용
    fn resolve_config(&self) -> anyhow::Result<CollectorConfig> {
        let mut config = CollectorConfig::load(self.config.as_deref())?;

        if let Some(ref start) = self.start {
            config.start_date = parse_iso_date(start).context("--start")?;
        }
        if let Some(ref end) = self.end {
            config.end_date = parse_iso_date(end).context("--end")?;
        }
        if let Some(ref dir) = self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(ref pattern) = self.pattern {
            config.file_pattern = pattern.clone();
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(verbosity) = self.verbosity {
            config.verbosity = verbosity;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 로깅 초기화
    init_logging(LogConfig::new(&cli.log_level).with_format(cli.log_format))
        .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    let config = cli.resolve_config()?;
    tracing::debug!(
        start = %config.start_date,
        end = %config.end_date,
        output_dir = %config.output_dir.display(),
        workers = config.workers,
        "설정 로드 완료"
    );

    let mut collector = SettlementCollector::new(config)?;

    match cli.command {
        Commands::Run { sequential } => {
            tracing::info!(pending = collector.pending().len(), "정산 테이블 수집기 시작");
            let report = if sequential {
                collector.run_sequential().await?
            } else {
                collector.run_parallel().await?
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report.stats)?);
            }
        }
        Commands::Pending => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(collector.pending())?);
            } else {
                for date in collector.pending() {
                    println!("{}", date);
                }
            }
        }
        Commands::ShowConfig => {
            if cli.json {
                let value = serde_json::json!({
                    "config": collector.config(),
                    "pending": collector.pending().len(),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{}", collector.describe());
            }
        }
        Commands::Menu => {
            let stdin = std::io::stdin();
            menu::run_menu(&mut collector, stdin.lock(), std::io::stdout()).await?;
        }
    }

    Ok(())
}
