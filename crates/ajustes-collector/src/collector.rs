//! 정산 테이블 수집기.
//!
//! 설정, 배치 실행기, 수집 대상 일자 목록을 묶어 관리합니다.
//! 수집 대상은 기간이 바뀔 때와 실행이 끝날 때마다 다시 계산됩니다.

use std::fmt::Write as _;
use std::sync::Arc;

use ajustes_data::PageSource;
use chrono::NaiveDate;

use crate::config::CollectorConfig;
use crate::error::Result;
use crate::modules::date_range::pending_for_store;
use crate::modules::{RunReport, SettlementBatch};

/// 정산 테이블 수집기
pub struct SettlementCollector {
    config: CollectorConfig,
    batch: SettlementBatch,
    pending: Vec<NaiveDate>,
}

impl SettlementCollector {
    /// 설정의 URL 템플릿으로 HTTP 조회기를 만들어 수집기 생성
    pub fn new(config: CollectorConfig) -> Result<Self> {
        let fetcher = config.fetcher()?;
        Self::with_source(config, Arc::new(fetcher))
    }

    /// 페이지 조회기를 지정해 수집기 생성
    pub fn with_source(config: CollectorConfig, source: Arc<dyn PageSource>) -> Result<Self> {
        config.validate()?;

        let batch = SettlementBatch::new(
            source,
            config.extractor()?,
            config.artifact_store()?,
            config.verbosity,
        );

        let mut collector = Self {
            config,
            batch,
            pending: Vec::new(),
        };
        collector.refresh_pending();
        Ok(collector)
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// 현재 수집 대상 일자 (오름차순)
    pub fn pending(&self) -> &[NaiveDate] {
        &self.pending
    }

    /// 수집 기간 변경 후 수집 대상 재계산
    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.config.start_date = start;
        self.config.end_date = end;
        self.refresh_pending();
    }

    /// 결과 파일 기준으로 수집 대상 재계산
    pub fn refresh_pending(&mut self) {
        self.pending = pending_for_store(
            self.config.start_date,
            self.config.end_date,
            self.batch.store(),
            self.config.verbosity,
        );
        tracing::debug!(
            start = %self.config.start_date,
            end = %self.config.end_date,
            pending = self.pending.len(),
            "수집 대상 계산 완료"
        );
    }

    /// 설정된 워커 수로 수집 대상 처리
    pub async fn run_parallel(&mut self) -> Result<RunReport> {
        let dates = self.pending.clone();
        let report = self.batch.run(dates, self.config.workers).await?;
        self.finish(&report, "정산 테이블 병렬 수집");
        Ok(report)
    }

    /// 워커 1개로 수집 대상을 일자순으로 처리
    pub async fn run_sequential(&mut self) -> Result<RunReport> {
        let dates = self.pending.clone();
        let report = self.batch.run_sequential(dates).await?;
        self.finish(&report, "정산 테이블 순차 수집");
        Ok(report)
    }

    fn finish(&mut self, report: &RunReport, operation: &str) {
        report.stats.log_summary(operation);
        self.refresh_pending();
    }

    /// 설정 요약 (수집 대상 일자 수 포함)
    pub fn describe(&self) -> String {
        let c = &self.config;
        let mut out = String::new();
        let _ = writeln!(out, "시작일:        {}", c.start_date);
        let _ = writeln!(out, "종료일:        {}", c.end_date);
        let _ = writeln!(out, "출력 디렉토리: {}", c.output_dir.display());
        let _ = writeln!(out, "파일명 패턴:   {}", c.file_pattern);
        let _ = writeln!(out, "로그 수준:     {}", c.verbosity);
        let _ = writeln!(out, "워커 수:       {}", c.workers);
        let _ = writeln!(out, "URL 템플릿:    {}", c.url_template);
        let _ = writeln!(out, "테이블 ID:     {}", c.table_id);
        let _ = writeln!(out, "타임아웃:      {}초", c.request_timeout_secs);
        let _ = write!(out, "수집 대상:     {}일", self.pending.len());
        out
    }
}

impl std::fmt::Debug for SettlementCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementCollector")
            .field("config", &self.config)
            .field("pending", &self.pending.len())
            .finish()
    }
}
