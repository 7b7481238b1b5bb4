//! 수집 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::modules::{DateOutcome, DateStatus, SkipReason};

/// 수집 작업 통계
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 디스패치된 일자 수
    pub total: usize,
    /// 저장 완료
    pub persisted: usize,
    /// 주말로 건너뜀
    pub skipped_weekend: usize,
    /// 데이터 없음 (테이블 없음, 공휴일)
    pub skipped_no_data: usize,
    /// 페이지 조회 실패로 건너뜀
    pub skipped_fetch_failed: usize,
    /// 실패 (스키마 위반, 저장 실패, 워커 패닉)
    pub failed: usize,
    /// 결과를 보고하지 못한 워커 수
    pub worker_panics: usize,
    /// 저장된 총 레코드 수
    pub total_rows: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 일자별 결과 반영
    pub fn record(&mut self, outcome: &DateOutcome) {
        match &outcome.status {
            DateStatus::Persisted { rows, .. } => {
                self.persisted += 1;
                self.total_rows += rows;
            }
            DateStatus::Skipped(SkipReason::Weekend) => self.skipped_weekend += 1,
            DateStatus::Skipped(SkipReason::NoData) => self.skipped_no_data += 1,
            DateStatus::Skipped(SkipReason::FetchFailed(_)) => self.skipped_fetch_failed += 1,
            DateStatus::Failed(_) => self.failed += 1,
        }
    }

    /// 건너뛴 일자 수 합계
    pub fn skipped(&self) -> usize {
        self.skipped_weekend + self.skipped_no_data + self.skipped_fetch_failed
    }

    /// 저장 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.persisted as f64 / self.total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            persisted = self.persisted,
            skipped = self.skipped(),
            skipped_weekend = self.skipped_weekend,
            skipped_no_data = self.skipped_no_data,
            skipped_fetch_failed = self.skipped_fetch_failed,
            failed = self.failed,
            total_rows = self.total_rows,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
        if self.worker_panics > 0 {
            tracing::error!(
                operation = operation,
                worker_panics = self.worker_panics,
                "일부 워커가 비정상 종료됨"
            );
        }
    }
}
