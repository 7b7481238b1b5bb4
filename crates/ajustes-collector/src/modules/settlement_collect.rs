//! 정산 테이블 배치 수집 모듈.
//!
//! 일자 하나의 작업 단위는 조회 → 추출 → 저장입니다. 작업 단위는 서로 독립적이며
//! 고정 크기 워커 풀이 작업 큐에서 일자를 꺼내 처리하고 결과 채널로 보고합니다.
//! 단일 스레드 실행은 워커 1개로 같은 루프를 실행합니다.
//!
//! # 일자별 상태
//!
//! ```text
//! PENDING → FETCHING → (FETCH_FAILED | FETCHED) → (EMPTY | EXTRACTED) → (PERSISTED | SKIPPED | FAILED)
//! ```
//!
//! - 조회 실패와 빈 테이블은 파일 없이 `Skipped`로 끝납니다.
//! - 테이블이 여러 개이거나 컬럼 수가 다르거나 숫자 셀이 잘못되면 `Failed(Schema)`입니다.
//! - 저장 실패는 `Failed(Io)`입니다.
//! - 작업 단위 안의 패닉은 해당 일자의 `Failed(Panicked)`로 기록되며 워커는 계속 동작합니다.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use ajustes_core::{is_weekend, settlement_span};
use ajustes_data::{AjustesTableExtractor, ArtifactStore, ExtractError, PageSource};
use chrono::NaiveDate;
use futures::FutureExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::config::Verbosity;
use crate::{CollectionStats, Result};

/// 파일 없이 건너뛴 이유
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 주말
    Weekend,
    /// 페이지 조회 실패 (전송 오류, HTTP 상태)
    FetchFailed(String),
    /// 정산 테이블 없음
    NoData,
}

/// 일자별 실패 이유
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// 페이지 구조 가정 위반
    Schema(ExtractError),
    /// 결과 파일 저장 실패
    Io(String),
    /// 작업 단위 실행 중 패닉
    Panicked(String),
}

/// 일자별 최종 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateStatus {
    /// 결과 파일 저장 완료
    Persisted { path: PathBuf, rows: usize },
    /// 파일 없이 건너뜀
    Skipped(SkipReason),
    /// 실패
    Failed(FailureReason),
}

/// 일자별 처리 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateOutcome {
    pub date: NaiveDate,
    pub status: DateStatus,
}

impl DateOutcome {
    fn new(date: NaiveDate, status: DateStatus) -> Self {
        Self { date, status }
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self.status, DateStatus::Persisted { .. })
    }
}

/// 배치 실행 결과
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// 일자순 정렬된 결과
    pub outcomes: Vec<DateOutcome>,
    pub stats: CollectionStats,
}

impl RunReport {
    /// 저장된 결과 파일 경로 (일자순)
    pub fn persisted_paths(&self) -> Vec<&PathBuf> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.status {
                DateStatus::Persisted { path, .. } => Some(path),
                _ => None,
            })
            .collect()
    }

    /// 해당 일자의 결과
    pub fn outcome(&self, date: NaiveDate) -> Option<&DateOutcome> {
        self.outcomes.iter().find(|o| o.date == date)
    }
}

struct BatchInner {
    source: Arc<dyn PageSource>,
    extractor: AjustesTableExtractor,
    store: ArtifactStore,
    verbosity: Verbosity,
}

impl BatchInner {
    /// 조회한 페이지의 추출과 저장 (동기 작업, 블로킹 스레드에서 실행)
    fn extract_and_store(&self, date: NaiveDate, html: &str) -> DateStatus {
        let table = match self.extractor.extract(html) {
            Ok(table) => table,
            Err(e) => {
                tracing::error!(date = %date, error = %e, "정산 테이블 구조 오류");
                return DateStatus::Failed(FailureReason::Schema(e));
            }
        };

        if table.is_empty() {
            if self.verbosity.diagnostics() {
                tracing::info!(date = %date, "정산 데이터 없음");
            }
            return DateStatus::Skipped(SkipReason::NoData);
        }

        match self.store.write(date, &table) {
            Ok(Some(path)) => DateStatus::Persisted {
                path,
                rows: table.len(),
            },
            Ok(None) => DateStatus::Skipped(SkipReason::NoData),
            Err(e) => {
                tracing::error!(
                    date = %date,
                    path = %self.store.path_for(date).display(),
                    error = %e,
                    "결과 파일 저장 실패"
                );
                DateStatus::Failed(FailureReason::Io(e.to_string()))
            }
        }
    }
}

/// 정산 테이블 배치 수집기.
///
/// 복제 비용이 낮으며 워커 간에 공유됩니다.
#[derive(Clone)]
pub struct SettlementBatch {
    inner: Arc<BatchInner>,
}

impl SettlementBatch {
    pub fn new(
        source: Arc<dyn PageSource>,
        extractor: AjustesTableExtractor,
        store: ArtifactStore,
        verbosity: Verbosity,
    ) -> Self {
        Self {
            inner: Arc::new(BatchInner {
                source,
                extractor,
                store,
                verbosity,
            }),
        }
    }

    /// 결과 파일 저장소
    pub fn store(&self) -> &ArtifactStore {
        &self.inner.store
    }

    /// 일자 하나 처리 (조회 → 추출 → 저장).
    ///
    /// 네트워크 조회만 비동기로 실행하고, HTML 파싱과 파일 쓰기는
    /// `spawn_blocking`으로 넘깁니다.
    pub async fn collect_date(&self, date: NaiveDate) -> DateOutcome {
        if is_weekend(date) {
            if self.inner.verbosity.diagnostics() {
                tracing::info!(date = %date, "주말 건너뜀");
            }
            return DateOutcome::new(date, DateStatus::Skipped(SkipReason::Weekend));
        }

        let html = match self.inner.source.fetch(date).await {
            Ok(html) => html,
            Err(e) => {
                return DateOutcome::new(
                    date,
                    DateStatus::Skipped(SkipReason::FetchFailed(e.to_string())),
                );
            }
        };

        let inner = Arc::clone(&self.inner);
        let status =
            match tokio::task::spawn_blocking(move || inner.extract_and_store(date, &html)).await {
                Ok(status) => status,
                Err(e) => {
                    let message = if e.is_panic() {
                        panic_message(e.into_panic().as_ref())
                    } else {
                        e.to_string()
                    };
                    tracing::error!(date = %date, panic = %message, "추출/저장 작업 비정상 종료");
                    DateStatus::Failed(FailureReason::Panicked(message))
                }
            };

        DateOutcome::new(date, status)
    }

    /// 작업 단위 실행 (패닉은 해당 일자의 실패로 변환)
    async fn collect_date_guarded(&self, date: NaiveDate) -> DateOutcome {
        match AssertUnwindSafe(self.collect_date(date)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(date = %date, panic = %message, "작업 단위 패닉");
                DateOutcome::new(date, DateStatus::Failed(FailureReason::Panicked(message)))
            }
        }
    }

    fn log_completion(&self, outcome: &DateOutcome) {
        if !self.inner.verbosity.per_date() {
            return;
        }
        let file_name = self.inner.store.file_name(outcome.date);
        match &outcome.status {
            DateStatus::Persisted { rows, .. } => {
                tracing::info!(date = %outcome.date, rows = rows, "{} 처리 완료", file_name);
            }
            DateStatus::Skipped(reason) => {
                tracing::info!(date = %outcome.date, reason = ?reason, "{} 처리 완료 (저장 안 함)", file_name);
            }
            DateStatus::Failed(reason) => {
                tracing::info!(date = %outcome.date, reason = ?reason, "{} 처리 실패", file_name);
            }
        }
    }

    /// 워커 풀로 일자 목록 처리.
    ///
    /// 디스패치 순서는 입력 순서를 따르며 완료 순서는 보장하지 않습니다.
    /// 결과는 일자순으로 정렬해 반환합니다. 출력 디렉토리를 만들 수 없으면 실행 전체가 실패합니다.
    pub async fn run(&self, dates: Vec<NaiveDate>, workers: usize) -> Result<RunReport> {
        let start = Instant::now();
        let mut stats = CollectionStats::new();
        stats.total = dates.len();

        self.inner.store.ensure_dir()?;

        if dates.is_empty() {
            tracing::info!("수집할 일자가 없습니다");
            stats.elapsed = start.elapsed();
            return Ok(RunReport {
                outcomes: Vec::new(),
                stats,
            });
        }

        let workers = workers.clamp(1, dates.len());
        tracing::info!(dates = dates.len(), workers = workers, "정산 테이블 수집 시작");

        let (job_tx, job_rx) = mpsc::channel::<NaiveDate>(dates.len());
        for date in &dates {
            // 용량 = 일자 수이므로 가득 차지 않음
            if job_tx.try_send(*date).is_err() {
                break;
            }
        }
        drop(job_tx);

        let job_rx = Arc::new(Mutex::new(job_rx));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<DateOutcome>();

        let mut pool = JoinSet::new();
        for worker_id in 0..workers {
            let batch = self.clone();
            let job_rx = Arc::clone(&job_rx);
            let result_tx = result_tx.clone();

            pool.spawn(async move {
                loop {
                    let next = job_rx.lock().await.recv().await;
                    let Some(date) = next else { break };

                    let outcome = batch
                        .collect_date_guarded(date)
                        .instrument(settlement_span!("collect_date", date, worker_id))
                        .await;
                    batch.log_completion(&outcome);

                    if result_tx.send(outcome).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                stats.worker_panics += 1;
                tracing::error!(error = %e, "워커 비정상 종료");
            }
        }

        let mut outcomes = Vec::with_capacity(dates.len());
        while let Some(outcome) = result_rx.recv().await {
            stats.record(&outcome);
            outcomes.push(outcome);
        }

        // 결과를 보고하지 못한 일자는 실패로 집계
        let lost = dates.len().saturating_sub(outcomes.len());
        if lost > 0 {
            tracing::error!(lost = lost, "결과가 보고되지 않은 일자");
            stats.failed += lost;
        }

        outcomes.sort_by_key(|o| o.date);
        stats.elapsed = start.elapsed();
        tracing::info!("다운로드 완료");

        Ok(RunReport { outcomes, stats })
    }

    /// 단일 워커로 일자 목록을 입력 순서대로 처리
    pub async fn run_sequential(&self, dates: Vec<NaiveDate>) -> Result<RunReport> {
        self.run(dates, 1).await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ajustes_data::FetchError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ROW: &str = "<tr><td>DOL</td><td>F24</td><td>4.862,12</td><td>4.850,00</td><td>-12,12</td><td>-606,00</td></tr>";

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn page(tables: usize) -> String {
        let table = format!("<table id=\"tblDadosAjustes\"><tbody>{}</tbody></table>", ROW);
        format!("<html><body>{}</body></html>", table.repeat(tables))
    }

    enum Page {
        Html(String),
        Fail,
        Panic,
    }

    struct StubSource {
        pages: HashMap<NaiveDate, Page>,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn new(pages: Vec<(NaiveDate, Page)>) -> Self {
            Self {
                pages: pages.into_iter().collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PageSource for StubSource {
        async fn fetch(&self, date: NaiveDate) -> std::result::Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.pages.get(&date) {
                Some(Page::Html(html)) => Ok(html.clone()),
                Some(Page::Panic) => panic!("stub panic for {}", date),
                Some(Page::Fail) | None => Err(FetchError::Status {
                    url: format!("stub://{}", date),
                    status: 404,
                }),
            }
        }
    }

    fn batch(dir: &std::path::Path, source: Arc<StubSource>) -> SettlementBatch {
        SettlementBatch::new(
            source,
            AjustesTableExtractor::default(),
            ArtifactStore::new(dir, "Ajustes_{data}.csv").unwrap(),
            Verbosity::PerDate,
        )
    }

    #[tokio::test]
    async fn test_collect_date_states() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(StubSource::new(vec![
            (ymd(2023, 12, 26), Page::Html(page(1))),
            (ymd(2023, 12, 25), Page::Html("<html></html>".to_string())),
            (ymd(2023, 12, 27), Page::Html(page(2))),
            (ymd(2023, 12, 28), Page::Fail),
        ]));
        let batch = batch(dir.path(), source.clone());
        batch.store().ensure_dir().unwrap();

        let persisted = batch.collect_date(ymd(2023, 12, 26)).await;
        assert!(matches!(persisted.status, DateStatus::Persisted { rows: 1, .. }));

        let empty = batch.collect_date(ymd(2023, 12, 25)).await;
        assert_eq!(empty.status, DateStatus::Skipped(SkipReason::NoData));

        let schema = batch.collect_date(ymd(2023, 12, 27)).await;
        assert_eq!(
            schema.status,
            DateStatus::Failed(FailureReason::Schema(ExtractError::MultipleTables { count: 2 }))
        );

        let failed = batch.collect_date(ymd(2023, 12, 28)).await;
        assert!(matches!(
            failed.status,
            DateStatus::Skipped(SkipReason::FetchFailed(_))
        ));

        let weekend = batch.collect_date(ymd(2023, 12, 23)).await;
        assert_eq!(weekend.status, DateStatus::Skipped(SkipReason::Weekend));

        // 주말은 조회하지 않음
        assert_eq!(source.calls.load(Ordering::SeqCst), 4);
        assert!(batch.store().exists(ymd(2023, 12, 26)));
        assert!(!batch.store().exists(ymd(2023, 12, 27)));
    }

    #[tokio::test]
    async fn test_io_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(StubSource::new(vec![(ymd(2023, 12, 26), Page::Html(page(1)))]));
        // 출력 디렉토리 생성 없이 저장 시도
        let batch = batch(&dir.path().join("missing"), source);

        let outcome = batch.collect_date(ymd(2023, 12, 26)).await;
        assert!(matches!(outcome.status, DateStatus::Failed(FailureReason::Io(_))));
    }

    #[tokio::test]
    async fn test_schema_error_does_not_stop_batch() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(StubSource::new(vec![
            (ymd(2024, 1, 2), Page::Html(page(1))),
            (ymd(2024, 1, 3), Page::Html(page(2))),
            (ymd(2024, 1, 4), Page::Html(page(1))),
        ]));
        let batch = batch(dir.path(), source);

        let report = batch
            .run(vec![ymd(2024, 1, 2), ymd(2024, 1, 3), ymd(2024, 1, 4)], 4)
            .await
            .unwrap();

        assert_eq!(report.stats.total, 3);
        assert_eq!(report.stats.persisted, 2);
        assert_eq!(report.stats.failed, 1);
        assert!(matches!(
            report.outcome(ymd(2024, 1, 3)).unwrap().status,
            DateStatus::Failed(FailureReason::Schema(_))
        ));
    }

    #[tokio::test]
    async fn test_panic_is_contained_to_its_date() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(StubSource::new(vec![
            (ymd(2024, 1, 2), Page::Panic),
            (ymd(2024, 1, 3), Page::Html(page(1))),
            (ymd(2024, 1, 4), Page::Html(page(1))),
        ]));
        let batch = batch(dir.path(), source);

        // 워커 1개: 패닉 이후에도 나머지 일자가 처리되어야 함
        let report = batch
            .run_sequential(vec![ymd(2024, 1, 2), ymd(2024, 1, 3), ymd(2024, 1, 4)])
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 3);
        assert!(matches!(
            report.outcomes[0].status,
            DateStatus::Failed(FailureReason::Panicked(ref msg)) if msg.contains("stub panic")
        ));
        assert_eq!(report.stats.persisted, 2);
        assert_eq!(report.stats.failed, 1);
        assert_eq!(report.stats.worker_panics, 0);
    }

    #[tokio::test]
    async fn test_empty_dates_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        let batch = batch(&out, Arc::new(StubSource::new(Vec::new())));

        let report = batch.run(Vec::new(), 8).await.unwrap();
        assert!(report.outcomes.is_empty());
        assert_eq!(report.stats.total, 0);
        assert!(out.is_dir());
    }

    #[tokio::test]
    async fn test_unwritable_output_dir_aborts_run() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "not a dir").unwrap();
        let batch = batch(&blocker.join("out"), Arc::new(StubSource::new(Vec::new())));

        assert!(batch.run(vec![ymd(2024, 1, 2)], 2).await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_cell_is_not_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let bad = page(1).replace("4.862,12", "n/d");
        let source = Arc::new(StubSource::new(vec![(ymd(2024, 1, 2), Page::Html(bad))]));
        let batch = batch(dir.path(), source);

        let report = batch.run(vec![ymd(2024, 1, 2)], 2).await.unwrap();
        assert!(matches!(
            report.outcomes[0].status,
            DateStatus::Failed(FailureReason::Schema(ExtractError::MalformedCell { row: 1, .. }))
        ));
        assert_eq!(report.stats.skipped_no_data, 0);
        assert_eq!(report.stats.failed, 1);
    }

    #[test]
    fn test_extract_and_store_runs_without_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let batch = batch(dir.path(), Arc::new(StubSource::new(Vec::new())));
        batch.store().ensure_dir().unwrap();

        // 블로킹 단계는 tokio 런타임 없이 동작해야 함
        let status = batch.inner.extract_and_store(ymd(2024, 1, 2), &page(1));
        assert!(matches!(status, DateStatus::Persisted { rows: 1, .. }));
        assert_eq!(
            batch.inner.extract_and_store(ymd(2024, 1, 3), "<html></html>"),
            DateStatus::Skipped(SkipReason::NoData)
        );
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
