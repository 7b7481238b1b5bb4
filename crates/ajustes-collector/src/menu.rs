//! 대화형 메뉴.
//!
//! ```text
//! 0: 수집 기간 설정
//! 1: 병렬 수집
//! 2: 설정 출력
//! 3: 종료
//! 4: 단일 스레드 수집
//! ```

use std::io::{BufRead, Write};

use ajustes_core::parse_iso_date;
use chrono::NaiveDate;

use crate::collector::SettlementCollector;
use crate::error::Result;
use crate::modules::RunReport;

/// 메뉴 선택지
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    SetDateRange,
    RunParallel,
    ShowConfig,
    Exit,
    RunSequential,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "0" => Some(Self::SetDateRange),
            "1" => Some(Self::RunParallel),
            "2" => Some(Self::ShowConfig),
            "3" => Some(Self::Exit),
            "4" => Some(Self::RunSequential),
            _ => None,
        }
    }
}

const MENU_TEXT: &str = "\
==== 정산 테이블 수집기 ====
0: 수집 기간 설정
1: 병렬 수집
2: 설정 출력
3: 종료
4: 단일 스레드 수집
선택: ";

/// 입력이 끝나거나 종료를 선택할 때까지 메뉴 실행
pub async fn run_menu<R, W>(
    collector: &mut SettlementCollector,
    mut input: R,
    mut output: W,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    loop {
        write!(output, "{}", MENU_TEXT)?;
        output.flush()?;

        let Some(line) = read_line(&mut input)? else {
            break;
        };

        match MenuChoice::parse(&line) {
            Some(MenuChoice::SetDateRange) => {
                let Some(start) = prompt_date(&mut input, &mut output, "시작일 (YYYY-MM-DD): ")?
                else {
                    continue;
                };
                let Some(end) = prompt_date(&mut input, &mut output, "종료일 (YYYY-MM-DD): ")?
                else {
                    continue;
                };
                collector.set_date_range(start, end);
                writeln!(output, "수집 대상: {}일", collector.pending().len())?;
            }
            Some(MenuChoice::RunParallel) => {
                let report = collector.run_parallel().await?;
                write_report(&mut output, &report)?;
            }
            Some(MenuChoice::ShowConfig) => {
                writeln!(output, "{}", collector.describe())?;
            }
            Some(MenuChoice::Exit) => break,
            Some(MenuChoice::RunSequential) => {
                let report = collector.run_sequential().await?;
                write_report(&mut output, &report)?;
            }
            None => {
                writeln!(output, "잘못된 선택: {}", line.trim())?;
            }
        }
    }

    writeln!(output, "종료합니다")?;
    Ok(())
}

fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

fn prompt_date<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> Result<Option<NaiveDate>> {
    write!(output, "{}", prompt)?;
    output.flush()?;

    let Some(line) = read_line(input)? else {
        return Ok(None);
    };
    match parse_iso_date(line.trim()) {
        Ok(date) => Ok(Some(date)),
        Err(e) => {
            writeln!(output, "{}", e)?;
            Ok(None)
        }
    }
}

fn write_report<W: Write>(output: &mut W, report: &RunReport) -> Result<()> {
    let stats = &report.stats;
    writeln!(
        output,
        "다운로드 완료: 저장 {} / 건너뜀 {} / 실패 {} (총 {}일)",
        stats.persisted,
        stats.skipped(),
        stats.failed,
        stats.total
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollectorConfig;
    use ajustes_data::{FetchError, PageSource};
    use async_trait::async_trait;
    use std::io::Cursor;
    use std::sync::Arc;

    struct NoTableSource;

    #[async_trait]
    impl PageSource for NoTableSource {
        async fn fetch(&self, _date: NaiveDate) -> std::result::Result<String, FetchError> {
            Ok("<html><body>Não há dados</body></html>".to_string())
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn collector(dir: &std::path::Path) -> SettlementCollector {
        let config = CollectorConfig::new(ymd(2024, 1, 1), ymd(2024, 1, 5), dir);
        SettlementCollector::with_source(config, Arc::new(NoTableSource)).unwrap()
    }

    async fn drive(collector: &mut SettlementCollector, script: &str) -> String {
        let mut out = Vec::new();
        run_menu(collector, Cursor::new(script.as_bytes()), &mut out)
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_menu_choice_parse() {
        assert_eq!(MenuChoice::parse("0\n"), Some(MenuChoice::SetDateRange));
        assert_eq!(MenuChoice::parse(" 4 "), Some(MenuChoice::RunSequential));
        assert_eq!(MenuChoice::parse("9"), None);
    }

    #[tokio::test]
    async fn test_set_range_then_exit() {
        let dir = tempfile::tempdir().unwrap();
        let mut collector = collector(dir.path());

        let out = drive(&mut collector, "0\n2024-01-06\n2024-01-09\n3\n").await;
        assert!(out.contains("수집 대상: 2일"));
        assert!(out.contains("종료합니다"));
        assert_eq!(collector.pending(), &[ymd(2024, 1, 8), ymd(2024, 1, 9)]);
    }

    #[tokio::test]
    async fn test_invalid_inputs_keep_looping() {
        let dir = tempfile::tempdir().unwrap();
        let mut collector = collector(dir.path());

        let out = drive(&mut collector, "7\n0\n06/01/2024\n2\n").await;
        assert!(out.contains("잘못된 선택: 7"));
        assert!(out.contains("시작일:        2024-01-01"));
        // 입력 종료 시에도 정상 종료
        assert!(out.ends_with("종료합니다\n"));
    }

    #[tokio::test]
    async fn test_run_from_menu() {
        let dir = tempfile::tempdir().unwrap();
        let mut collector = collector(dir.path());

        let out = drive(&mut collector, "4\n1\n3\n").await;
        assert!(out.contains("다운로드 완료: 저장 0 / 건너뜀 5 / 실패 0 (총 5일)"));
        // 데이터가 없으므로 다시 실행해도 같은 일자가 대상
        assert_eq!(collector.pending().len(), 5);
    }
}
