//! 수집 대상 영업일 계산.
//!
//! 기간 내 달력 일자를 오름차순으로 순회하며 주말과 결과 파일이 이미 있는
//! 일자를 제외합니다. 결과 파일 존재 여부만으로 판단하므로 반복 실행해도
//! 이미 저장된 일자는 다시 디스패치되지 않습니다.

use ajustes_core::{calendar_days, is_weekend};
use ajustes_data::ArtifactStore;
use chrono::NaiveDate;

use crate::config::Verbosity;

/// 수집 대상 일자 계산.
///
/// # Arguments
/// * `start`, `end` - 수집 기간 (양끝 포함)
/// * `is_materialized` - 해당 일자의 결과 파일 존재 여부
/// * `verbosity` - `Diagnostics`이면 일자별 판단 근거 로그 출력
pub fn pending_dates<F>(
    start: NaiveDate,
    end: NaiveDate,
    is_materialized: F,
    verbosity: Verbosity,
) -> Vec<NaiveDate>
where
    F: Fn(NaiveDate) -> bool,
{
    if start > end {
        tracing::warn!(start = %start, end = %end, "시작일이 종료일보다 늦음, 수집 대상 없음");
        return Vec::new();
    }

    let mut pending = Vec::new();
    for date in calendar_days(start, end) {
        if is_weekend(date) {
            if verbosity.diagnostics() {
                tracing::info!(date = %date, "주말 제외");
            }
            continue;
        }

        if is_materialized(date) {
            if verbosity.diagnostics() {
                tracing::info!(date = %date, "이미 저장된 일자 제외");
            }
            continue;
        }

        if verbosity.diagnostics() {
            tracing::info!(date = %date, "수집 대상 추가");
        }
        pending.push(date);
    }

    pending
}

/// 결과 파일 저장소 기준 수집 대상 일자 계산
pub fn pending_for_store(
    start: NaiveDate,
    end: NaiveDate,
    store: &ArtifactStore,
    verbosity: Verbosity,
) -> Vec<NaiveDate> {
    pending_dates(start, end, |date| store.exists(date), verbosity)
}
