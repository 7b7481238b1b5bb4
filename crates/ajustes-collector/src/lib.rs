//! B3 일일 정산가(ajustes do pregão) 배치 수집기.
//!
//! 이 crate는 다음을 제공합니다:
//! - 수집 대상 영업일 계산 (주말 및 이미 저장된 일자 제외)
//! - 고정 크기 워커 풀을 통한 일자별 조회 → 추출 → 저장
//! - 단일 스레드 실행 (워커 1개)
//! - 대화형 메뉴

pub mod collector;
pub mod config;
pub mod error;
pub mod menu;
pub mod modules;
pub mod stats;

pub use collector::SettlementCollector;
pub use config::{CollectorConfig, Verbosity};
pub use error::{CollectorError, Result};
pub use modules::{
    pending_dates, DateOutcome, DateStatus, FailureReason, RunReport, SettlementBatch, SkipReason,
};
pub use stats::CollectionStats;
